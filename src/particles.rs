use crate::actors::{billboard, SpriteQuad, GRAVITY};
use log::trace;
use nalgebra_glm as glm;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    f32::consts::{FRAC_PI_2, TAU},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: glm::Vec3,
    pub velocity: glm::Vec3,
    /// Seconds left
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub size: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

impl Particle {
    /// Random burst particle with an upward kick
    fn burst<R: Rng>(rng: &mut R, position: glm::Vec3) -> Self {
        let angle = rng.random::<f32>() * TAU;
        let elevation = (rng.random::<f32>() - 0.5) * FRAC_PI_2;
        let speed = rng.random::<f32>().mul_add(5.0, 3.0);
        let velocity = glm::vec3(
            elevation.cos() * angle.cos() * speed,
            elevation.sin().mul_add(speed, 5.0),
            elevation.cos() * angle.sin() * speed,
        );
        let max_lifetime = 1.0 + rng.random::<f32>();
        Self {
            position,
            velocity,
            lifetime: max_lifetime,
            max_lifetime,
            size: rng.random::<f32>().mul_add(0.3, 0.3),
            rotation: rng.random::<f32>() * TAU,
            rotation_speed: (rng.random::<f32>() - 0.5) * 10.0,
        }
    }

    /// Fraction of life remaining, 1 when spawned
    #[must_use]
    pub fn life(&self) -> f32 {
        (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }

    /// Billboarded model matrix spun about the view axis
    #[must_use]
    pub fn model_matrix(&self, view: &glm::Mat4) -> glm::Mat4 {
        let m = glm::translation(&self.position) * billboard(view);
        let m = glm::rotate_z(&m, self.rotation);
        glm::scale(&m, &glm::vec3(self.size, self.size, self.size))
    }
}

/// Short lived sprites thrown out in bursts and pulled down by gravity
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
    quad: Arc<SpriteQuad>,
}

impl ParticleSystem {
    #[must_use]
    pub fn new(quad: Arc<SpriteQuad>) -> Self {
        Self::with_rng(quad, StdRng::from_os_rng())
    }

    /// Uses the given generator, for repeatable bursts
    #[must_use]
    pub const fn with_rng(quad: Arc<SpriteQuad>, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            rng,
            quad,
        }
    }

    pub fn spawn_burst(&mut self, position: &glm::Vec3, count: usize) {
        trace!("burst of {} at {:?}", count, position);
        self.particles.reserve(count);
        for _ in 0..count {
            let p = Particle::burst(&mut self.rng, *position);
            self.particles.push(p);
        }
    }

    /// Integrates every particle and drops the expired ones
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.velocity.y += GRAVITY * dt;
            p.position += p.velocity * dt;
            p.rotation += p.rotation_speed * dt;
            p.lifetime -= dt;
        }
        self.particles.retain(|p| p.lifetime > 0.0);
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    #[must_use]
    pub fn quad(&self) -> &SpriteQuad {
        &self.quad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0005_f32;

    fn granary() -> ParticleSystem {
        ParticleSystem::with_rng(SpriteQuad::shared(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn burst_ranges() {
        let mut ps = granary();
        let origin = glm::vec3(1.0, 2.0, 3.0);
        ps.spawn_burst(&origin, 200);
        assert_eq!(ps.len(), 200);
        for p in ps.particles() {
            assert_eq!(p.position, origin);
            assert!((1.0..=2.0).contains(&p.max_lifetime));
            assert!((p.lifetime - p.max_lifetime).abs() < EPSILON);
            assert!((0.3..=0.6).contains(&p.size));
            assert!((-5.0..=5.0).contains(&p.rotation_speed));
            // Elevation is within 45 degrees of level plus an upward kick
            assert!(p.velocity.y > 5.0 - 8.0 * std::f32::consts::FRAC_1_SQRT_2);
            let flat = glm::length(&glm::vec2(p.velocity.x, p.velocity.z));
            assert!(flat <= 8.0 + EPSILON);
            assert!(flat >= 3.0 * std::f32::consts::FRAC_1_SQRT_2 - EPSILON);
            assert!((p.life() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn gravity() {
        let mut ps = granary();
        ps.spawn_burst(&glm::Vec3::zeros(), 1);
        let before = ps.particles()[0];
        ps.update(0.1);
        let after = ps.particles()[0];
        assert!((after.velocity.y - (before.velocity.y - 2.0)).abs() < EPSILON);
        assert!((after.position.y - after.velocity.y * 0.1).abs() < EPSILON);
        assert!((after.position.x - before.velocity.x * 0.1).abs() < EPSILON);
        assert!((after.lifetime - (before.lifetime - 0.1)).abs() < EPSILON);
    }

    #[test]
    fn expiry() {
        let mut ps = granary();
        ps.spawn_burst(&glm::Vec3::zeros(), 30);
        ps.update(0.5);
        assert_eq!(ps.len(), 30);
        // Nothing lives past two seconds
        ps.update(1.6);
        assert!(ps.is_empty());
        ps.update(0.1);
        assert!(ps.is_empty());
    }

    #[test]
    fn seeded_bursts_repeat() {
        let mut a = granary();
        let mut b = granary();
        a.spawn_burst(&glm::Vec3::zeros(), 5);
        b.spawn_burst(&glm::Vec3::zeros(), 5);
        assert_eq!(a.particles(), b.particles());
    }
}
