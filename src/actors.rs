//! Enemies and coins. Both are drawn as camera facing sprites sharing one
//! quad, and both only interact through point and radius tests.

use crate::{steering::Mover, terrain::Terrain, vertex::SpriteVertex};
use log::{debug, info};
use nalgebra_glm as glm;
use rand::Rng;
use std::{f32::consts::TAU, sync::Arc};

/// Downward acceleration applied to anything that has left the ground
pub const GRAVITY: f32 = -20.0;

/// Unit quad centred on the origin in the XY plane, two triangles. Built
/// once during scene setup and shared by handle with everything that draws
/// sprites.
#[derive(Debug, PartialEq)]
pub struct SpriteQuad {
    vertices: [SpriteVertex; 6],
}

impl Default for SpriteQuad {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteQuad {
    #[must_use]
    pub const fn new() -> Self {
        // Texture V runs down the image
        let bl = SpriteVertex {
            position: [-0.5, -0.5, 0.0],
            tex_coord: [0.0, 1.0],
        };
        let br = SpriteVertex {
            position: [0.5, -0.5, 0.0],
            tex_coord: [1.0, 1.0],
        };
        let tr = SpriteVertex {
            position: [0.5, 0.5, 0.0],
            tex_coord: [1.0, 0.0],
        };
        let tl = SpriteVertex {
            position: [-0.5, 0.5, 0.0],
            tex_coord: [0.0, 0.0],
        };
        Self {
            vertices: [bl, br, tr, bl, tr, tl],
        }
    }

    /// Convenience for building the shared handle
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    #[must_use]
    pub const fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Rotation part of a model matrix that keeps a quad facing the camera,
/// taken from the camera's right and up vectors in the view matrix
#[must_use]
pub fn billboard(view: &glm::Mat4) -> glm::Mat4 {
    let right = glm::vec3(view[(0, 0)], view[(0, 1)], view[(0, 2)]);
    let up = glm::vec3(view[(1, 0)], view[(1, 1)], view[(1, 2)]);
    let back = glm::cross(&right, &up);
    let mut m = glm::Mat4::identity();
    m.set_column(0, &glm::vec4(right.x, right.y, right.z, 0.0));
    m.set_column(1, &glm::vec4(up.x, up.y, up.z, 0.0));
    m.set_column(2, &glm::vec4(back.x, back.y, back.z, 0.0));
    m
}

/// True when two circles on the ground plane overlap. Height is ignored.
#[must_use]
pub fn overlaps(a: &glm::Vec3, radius_a: f32, b: &glm::Vec3, radius_b: f32) -> bool {
    ground_distance(a, b) < radius_a + radius_b
}

#[must_use]
pub fn ground_distance(a: &glm::Vec3, b: &glm::Vec3) -> f32 {
    glm::length(&glm::vec2(a.x - b.x, a.z - b.z))
}

/// A patrolling sprite that chases the player until it walks off the edge
/// of the world
#[derive(Clone, Debug)]
pub struct Enemy {
    pub mover: Mover,
    pub radius: f32,
    alive: bool,
    falling: bool,
    vertical_velocity: f32,
    anim_phase: f32,
    quad: Arc<SpriteQuad>,
}

impl Enemy {
    #[must_use]
    pub fn new(position: glm::Vec3, heading: f32, quad: Arc<SpriteQuad>) -> Self {
        Self {
            mover: Mover::new(position, heading, 5.0),
            radius: 0.5,
            alive: true,
            falling: false,
            vertical_velocity: 0.0,
            anim_phase: 0.0,
            quad,
        }
    }

    /// Chases `target` while on the ground. Once falling only gravity
    /// applies.
    pub fn update(&mut self, dt: f32, target: &glm::Vec3, turn_speed: f32) {
        if self.falling {
            self.vertical_velocity += GRAVITY * dt;
            self.mover.position.y += self.vertical_velocity * dt;
            return;
        }
        if !self.alive {
            return;
        }
        self.mover.pursue(target, turn_speed, dt);
        self.anim_phase += dt * 5.0;
        if self.anim_phase > TAU {
            self.anim_phase -= TAU;
        }
    }

    /// Turns away from something it ran into
    pub fn bounce_off(&mut self, other: &glm::Vec3) {
        self.mover.face(&(self.mover.position - other));
    }

    /// Snaps to the terrain, or starts falling if off the edge. Returns true
    /// on the tick the enemy starts to fall.
    pub fn follow_terrain(&mut self, terrain: &Terrain, offset: f32) -> bool {
        if self.falling || !self.alive {
            return false;
        }
        let p = self.mover.position;
        if let Some(h) = terrain.height(p.x, p.z) {
            self.mover.position.y = h + offset;
            false
        } else {
            info!("Enemy fell off the edge at {:?}", p);
            self.falling = true;
            true
        }
    }

    /// Kills a falling enemy once it is below `floor`. Returns true on the
    /// tick it dies.
    pub fn check_fallen(&mut self, floor: f32) -> bool {
        if self.falling && self.alive && self.mover.position.y < floor {
            self.alive = false;
            return true;
        }
        false
    }

    #[must_use]
    pub const fn position(&self) -> glm::Vec3 {
        self.mover.position
    }

    /// Still chasing: alive and on the ground
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && !self.falling
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub const fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn set_falling(&mut self, falling: bool) {
        self.falling = falling;
    }

    #[must_use]
    pub const fn anim_phase(&self) -> f32 {
        self.anim_phase
    }

    #[must_use]
    pub fn quad(&self) -> &SpriteQuad {
        &self.quad
    }

    /// Billboarded model matrix with a small bob, tumbling while it falls
    #[must_use]
    pub fn model_matrix(&self, view: &glm::Mat4) -> glm::Mat4 {
        let mut m = glm::translation(&self.mover.position) * billboard(view);
        m = glm::translate(&m, &glm::vec3(0.0, self.anim_phase.sin() * 0.1, 0.0));
        m = glm::scale(&m, &glm::vec3(1.5, 1.5, 1.5));
        if self.falling {
            m = glm::rotate_x(&m, self.vertical_velocity * 0.1);
        }
        m
    }
}

/// Pushes apart every pair of active enemies that overlap and turns each
/// away from the other. Returns the number of collisions.
pub fn separate_enemies(enemies: &mut [Enemy]) -> usize {
    let mut hits = 0;
    for i in 0..enemies.len() {
        let (head, tail) = enemies.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_active() {
            continue;
        }
        for b in tail.iter_mut().filter(|e| e.is_active()) {
            let pa = a.position();
            let pb = b.position();
            let distance = ground_distance(&pa, &pb);
            let min_distance = a.radius + b.radius;
            if distance >= min_distance {
                continue;
            }
            a.bounce_off(&pb);
            b.bounce_off(&pa);
            let away = glm::vec3(pa.x - pb.x, 0.0, pa.z - pb.z);
            if distance > f32::EPSILON {
                let push = away / distance * ((min_distance - distance) * 0.5);
                a.mover.position += push;
                b.mover.position -= push;
            }
            hits += 1;
        }
    }
    if hits > 0 {
        debug!("enemy collisions={}", hits);
    }
    hits
}

/// Scatters enemies over the middle of the world, keeping them away from
/// the centre where the player starts
pub fn spawn_enemies<R: Rng>(
    rng: &mut R,
    count: usize,
    terrain: &Terrain,
    quad: &Arc<SpriteQuad>,
) -> Vec<Enemy> {
    let spread = terrain.world_size * 1.5;
    let enemies: Vec<Enemy> = (0..count)
        .map(|_| {
            let mut x = (rng.random::<f32>() - 0.5) * spread;
            let mut z = (rng.random::<f32>() - 0.5) * spread;
            if x.abs() < 15.0 && z.abs() < 15.0 {
                x += 20.0_f32.copysign(x);
                z += 20.0_f32.copysign(z);
            }
            let y = terrain.height_or(x, z, 0.0) + 1.0;
            let heading = rng.random::<f32>() * TAU;
            Enemy::new(glm::vec3(x, y, z), heading, Arc::clone(quad))
        })
        .collect();
    info!("Spawned {} enemies", enemies.len());
    enemies
}

/// A spinning, bobbing pickup
#[derive(Clone, Debug)]
pub struct Coin {
    pub position: glm::Vec3,
    pub radius: f32,
    collected: bool,
    rotation: f32,
    bob_phase: f32,
    quad: Arc<SpriteQuad>,
}

impl Coin {
    #[must_use]
    pub const fn new(position: glm::Vec3, quad: Arc<SpriteQuad>) -> Self {
        Self {
            position,
            radius: 1.0,
            collected: false,
            rotation: 0.0,
            bob_phase: 0.0,
            quad,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.collected {
            return;
        }
        self.rotation += dt * 3.0;
        if self.rotation > TAU {
            self.rotation -= TAU;
        }
        self.bob_phase += dt * 2.0;
        if self.bob_phase > TAU {
            self.bob_phase -= TAU;
        }
    }

    /// Collects the coin if `point` is within `reach` of it. Returns true
    /// only on the tick it is collected.
    pub fn try_collect(&mut self, point: &glm::Vec3, reach: f32) -> bool {
        if self.collected || glm::distance(point, &self.position) >= reach {
            return false;
        }
        self.collected = true;
        true
    }

    #[must_use]
    pub const fn is_collected(&self) -> bool {
        self.collected
    }

    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    #[must_use]
    pub const fn bob_phase(&self) -> f32 {
        self.bob_phase
    }

    #[must_use]
    pub fn quad(&self) -> &SpriteQuad {
        &self.quad
    }

    #[must_use]
    pub fn model_matrix(&self, view: &glm::Mat4) -> glm::Mat4 {
        let bob = glm::vec3(0.0, self.bob_phase.sin() * 0.3, 0.0);
        let m = glm::translation(&(self.position + bob)) * billboard(view);
        glm::rotate_y(&m, self.rotation)
    }
}

/// One coin near each corner of the world, floating above the ground
#[must_use]
pub fn spawn_coins(terrain: &Terrain, quad: &Arc<SpriteQuad>) -> Vec<Coin> {
    let offset = terrain.world_size * 0.8;
    [(-offset, -offset), (offset, -offset), (-offset, offset), (offset, offset)]
        .iter()
        .map(|&(x, z)| {
            let y = terrain.height_or(x, z, 0.0) + 2.0;
            Coin::new(glm::vec3(x, y, z), Arc::clone(quad))
        })
        .collect()
}
