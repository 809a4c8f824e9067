//! Ground movement shared by the character and the enemies. Heading is an
//! angle about +Y measured from +Z, so a heading of zero walks along +Z and
//! a quarter turn walks along +X.

use nalgebra_glm as glm;
use std::f32::consts::{PI, TAU};

/// Below this horizontal distance the target is treated as reached and the
/// heading is left alone
const ARRIVED: f32 = 0.01;

/// Wraps an angle into `[-PI, PI)`
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Unit vector on the ground plane for a heading
#[must_use]
pub fn heading_vector(heading: f32) -> glm::Vec3 {
    glm::vec3(heading.sin(), 0.0, heading.cos())
}

/// Heading of a direction, ignoring its Y component
#[must_use]
pub fn heading_of(direction: &glm::Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Position, heading and cruise speed of something that walks on the ground
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mover {
    pub position: glm::Vec3,
    pub heading: f32,
    /// Used by `pursue`
    pub speed: f32,
}

impl Default for Mover {
    fn default() -> Self {
        Self {
            position: glm::Vec3::zeros(),
            heading: 0.0,
            speed: 5.0,
        }
    }
}

impl Mover {
    #[must_use]
    pub const fn new(position: glm::Vec3, heading: f32, speed: f32) -> Self {
        Self {
            position,
            heading,
            speed,
        }
    }

    #[must_use]
    pub fn forward(&self) -> glm::Vec3 {
        heading_vector(self.heading)
    }

    /// Moves along the heading. Negative amounts move backward.
    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.forward() * amount;
    }

    /// Positive angles turn left
    pub fn turn(&mut self, angle: f32) {
        self.heading += angle;
    }

    /// Points the heading along a direction on the ground. A direction with
    /// no horizontal length leaves the heading unchanged.
    pub fn face(&mut self, direction: &glm::Vec3) {
        let flat = glm::vec3(direction.x, 0.0, direction.z);
        if glm::length(&flat) > ARRIVED {
            self.heading = heading_of(&flat);
        }
    }

    /// One step of chase steering. Moves forward at `speed` then turns
    /// toward `target` by the shorter way, at most `turn_speed * dt`.
    pub fn pursue(&mut self, target: &glm::Vec3, turn_speed: f32, dt: f32) {
        self.move_forward(self.speed * dt);

        let to_target = glm::vec3(
            target.x - self.position.x,
            0.0,
            target.z - self.position.z,
        );
        if glm::length(&to_target) <= ARRIVED {
            return;
        }
        let current = heading_of(&self.forward());
        let diff = wrap_angle(heading_of(&to_target) - current);
        let max_turn = turn_speed * dt;
        self.heading = current + diff.clamp(-max_turn, max_turn);
    }

    /// Model matrix placing an object at this position and heading
    #[must_use]
    pub fn model_matrix(&self, scale: f32) -> glm::Mat4 {
        let m = glm::translation(&self.position);
        let m = glm::rotate_y(&m, self.heading);
        glm::scale(&m, &glm::vec3(scale, scale, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0005_f32;

    fn vec_eq(a: &glm::Vec3, b: &glm::Vec3) {
        let c = glm::equal_eps(a, b, EPSILON);
        assert!(c.x && c.y && c.z, "{a:?} != {b:?}");
    }

    #[test]
    fn wrap() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < EPSILON);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < EPSILON);
        assert!((wrap_angle(0.25) - 0.25).abs() < EPSILON);
        assert!((wrap_angle(0.25 + 4.0 * TAU) - 0.25).abs() < 0.001);
    }

    #[test]
    fn forward_follows_heading() {
        let mut m = Mover::default();
        m.move_forward(2.0);
        vec_eq(&m.position, &glm::vec3(0.0, 0.0, 2.0));
        m.turn(FRAC_PI_2);
        m.move_forward(1.0);
        vec_eq(&m.position, &glm::vec3(1.0, 0.0, 2.0));
        m.move_forward(-3.0);
        vec_eq(&m.position, &glm::vec3(-2.0, 0.0, 2.0));
    }

    #[test]
    fn pursue_turn_is_bounded() {
        // Target directly behind, so the full turn is wanted
        let mut m = Mover::new(glm::Vec3::zeros(), 0.0, 0.0);
        m.pursue(&glm::vec3(0.1, 0.0, -50.0), 1.5, 0.1);
        assert!((m.heading.abs() - 0.15).abs() < EPSILON);
    }

    #[test]
    fn pursue_turns_the_short_way() {
        // Heading just under +PI, target just past -PI
        let mut m = Mover::new(glm::Vec3::zeros(), 3.0, 0.0);
        let target = heading_vector(-3.0) * 10.0;
        m.pursue(&target, 10.0, 0.01);
        // Wanted turn is about +0.28, clamped to 0.1
        assert!((m.heading - 3.1).abs() < EPSILON);
    }

    #[test]
    fn pursue_moves_then_converges() {
        let target = glm::vec3(20.0, 0.0, 0.0);
        let mut m = Mover::new(glm::Vec3::zeros(), 0.0, 5.0);
        m.pursue(&target, 1.5, 0.1);
        vec_eq(&m.position, &glm::vec3(0.0, 0.0, 0.5));
        for _ in 0..200 {
            m.pursue(&target, 1.5, 0.1);
            if glm::distance(&m.position, &target) < 1.0 {
                return;
            }
        }
        panic!("never reached target, at {:?}", m.position);
    }

    #[test]
    fn pursue_at_target_keeps_heading() {
        let mut m = Mover::new(glm::vec3(1.0, 0.0, 1.0), 0.7, 0.0);
        m.pursue(&glm::vec3(1.0, 5.0, 1.0), 1.5, 0.1);
        assert!((m.heading - 0.7).abs() < EPSILON);
    }

    #[test]
    fn face_ignores_vertical() {
        let mut m = Mover::default();
        m.face(&glm::vec3(-1.0, 9.0, 0.0));
        assert!((m.heading + FRAC_PI_2).abs() < EPSILON);
        m.face(&glm::vec3(0.0, 1.0, 0.0));
        assert!((m.heading + FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn model_matrix_places_and_scales() {
        let m = Mover::new(glm::vec3(1.0, 2.0, 3.0), FRAC_PI_2, 0.0);
        let mm = m.model_matrix(3.0);
        let p = mm * glm::vec4(0.0, 0.0, 1.0, 1.0);
        vec_eq(&glm::vec3(p.x, p.y, p.z), &glm::vec3(4.0, 2.0, 3.0));
    }
}
