use crate::types::CameraTrait;
use log::info;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

const NEAR_CLIP_METERS: f32 = 0.1;
const FAR_CLIP_METERS: f32 = 1000.0;
/// Keeps the pitch away from the poles where the view flips
const PHI_MARGIN: f32 = 0.01;
const MIN_RADIUS: f32 = 0.1;

fn up() -> glm::Vec3 {
    glm::vec3(0.0, 1.0, 0.0)
}

/// The projection matrix depends on both fovy and aspect ratio, so both are
/// stored so that a caller can change one without having to know the other.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub aspect_ratio: f32,
    pub fovy: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            aspect_ratio: 640.0 / 480.0,
            fovy: 45.0_f32.to_radians(),
        }
    }
}

impl Projection {
    /// Right handed with OpenGL style depth, Y up
    #[must_use]
    pub fn matrix(&self) -> glm::Mat4 {
        glm::perspective(
            self.aspect_ratio,
            self.fovy,
            NEAR_CLIP_METERS,
            FAR_CLIP_METERS,
        )
    }
}

/// Orbits a look at point. Theta is the angle about Y, phi the angle down
/// from straight up.
#[derive(Debug, Copy, Clone)]
pub struct ArcballCamera {
    projection: Projection,
    theta: f32,
    phi: f32,
    radius: f32,
    look_at: glm::Vec3,
    position: glm::Vec3,
    view: glm::Mat4,
}

impl Default for ArcballCamera {
    fn default() -> Self {
        Self::new(
            Projection::default(),
            glm::vec3(0.0, -1.0, -1.5),
            15.0,
            0.0,
            FRAC_PI_2 / 2.0,
        )
    }
}

impl ArcballCamera {
    #[must_use]
    pub fn new(
        projection: Projection,
        look_at: glm::Vec3,
        radius: f32,
        theta: f32,
        phi: f32,
    ) -> Self {
        let mut cam = Self {
            projection,
            theta,
            phi,
            radius: radius.max(MIN_RADIUS),
            look_at,
            position: glm::Vec3::zeros(),
            view: glm::Mat4::identity(),
        };
        cam.recompute();
        cam
    }

    fn recompute(&mut self) {
        self.phi = self.phi.clamp(PHI_MARGIN, FRAC_PI_2 - PHI_MARGIN);
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        self.position = self.look_at
            + glm::vec3(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * cos_phi,
                self.radius * sin_phi * self.theta.cos(),
            );
        self.view = glm::look_at(&self.position, &self.look_at, &up());
    }

    pub fn set_look_at(&mut self, look_at: &glm::Vec3) {
        self.look_at = *look_at;
        self.recompute();
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    #[must_use]
    pub const fn look_at(&self) -> glm::Vec3 {
        self.look_at
    }

    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    #[must_use]
    pub const fn phi(&self) -> f32 {
        self.phi
    }
}

impl CameraTrait for ArcballCamera {
    fn position(&self) -> glm::Vec3 {
        self.position
    }

    fn view_matrix(&self) -> glm::Mat4 {
        self.view
    }

    fn proj_matrix(&self) -> glm::Mat4 {
        self.projection.matrix()
    }

    fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi += d_phi;
        self.recompute();
    }

    /// Zooms in, never closer than a small minimum radius
    fn move_forward(&mut self, amount: f32) {
        self.radius = (self.radius - amount).max(MIN_RADIUS);
        self.recompute();
    }

    fn move_backward(&mut self, amount: f32) {
        self.radius = (self.radius + amount).max(MIN_RADIUS);
        self.recompute();
    }
}

/// Flies from its own position in the direction given by theta and phi.
/// Also used as the first person view by placing it at the character's head.
#[derive(Debug, Copy, Clone)]
pub struct FreeCamera {
    projection: Projection,
    theta: f32,
    phi: f32,
    position: glm::Vec3,
    direction: glm::Vec3,
    view: glm::Mat4,
}

impl Default for FreeCamera {
    fn default() -> Self {
        Self::new(Projection::default(), glm::Vec3::zeros(), PI, FRAC_PI_2)
    }
}

impl FreeCamera {
    #[must_use]
    pub fn new(projection: Projection, position: glm::Vec3, theta: f32, phi: f32) -> Self {
        let mut cam = Self {
            projection,
            theta,
            phi,
            position,
            direction: glm::vec3(0.0, 0.0, -1.0),
            view: glm::Mat4::identity(),
        };
        cam.recompute();
        cam
    }

    fn recompute(&mut self) {
        self.phi = self.phi.clamp(PHI_MARGIN, PI - PHI_MARGIN);
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        self.direction = glm::normalize(&glm::vec3(
            self.theta.sin() * sin_phi,
            -cos_phi,
            -self.theta.cos() * sin_phi,
        ));
        self.view = glm::look_at(&self.position, &(self.position + self.direction), &up());
    }

    /// Sets position and angles in one go
    pub fn place(&mut self, position: &glm::Vec3, theta: f32, phi: f32) {
        self.position = *position;
        self.theta = theta;
        self.phi = phi;
        self.recompute();
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    #[must_use]
    pub const fn direction(&self) -> glm::Vec3 {
        self.direction
    }
}

impl CameraTrait for FreeCamera {
    fn position(&self) -> glm::Vec3 {
        self.position
    }

    fn view_matrix(&self) -> glm::Mat4 {
        self.view
    }

    fn proj_matrix(&self) -> glm::Mat4 {
        self.projection.matrix()
    }

    fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi += d_phi;
        self.recompute();
    }

    fn move_forward(&mut self, amount: f32) {
        self.position += self.direction * amount;
        self.recompute();
    }

    fn move_backward(&mut self, amount: f32) {
        self.position -= self.direction * amount;
        self.recompute();
    }
}

/// Which camera drives the main view
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraKind {
    #[default]
    Arcball,
    Free,
    FirstPerson,
}

/// The scene's cameras. Switching the main view only changes the tag.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub arcball: ArcballCamera,
    pub free: FreeCamera,
    pub first_person: FreeCamera,
    active: CameraKind,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(Projection::default())
    }
}

impl CameraRig {
    /// Height of the eyes and the arcball target above the character's feet
    pub const HEAD_HEIGHT: f32 = 5.0;

    /// Arcball looking at the hill top, free camera back from the hill,
    /// first person camera near the origin
    #[must_use]
    pub fn new(projection: Projection) -> Self {
        Self {
            arcball: ArcballCamera::new(
                projection,
                glm::vec3(0.0, 35.0, 0.0),
                30.0,
                0.0,
                FRAC_PI_2 / 2.0,
            ),
            free: FreeCamera::new(projection, glm::vec3(0.0, 50.0, 100.0), 0.0, FRAC_PI_2),
            first_person: FreeCamera::new(projection, glm::vec3(0.0, 6.0, 5.0), 0.0, FRAC_PI_2),
            active: CameraKind::Arcball,
        }
    }

    pub fn switch(&mut self, kind: CameraKind) {
        if self.active != kind {
            info!("Main viewport switched to {:?} camera", kind);
            self.active = kind;
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CameraKind {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> &dyn CameraTrait {
        match self.active {
            CameraKind::Arcball => &self.arcball,
            CameraKind::Free => &self.free,
            CameraKind::FirstPerson => &self.first_person,
        }
    }

    pub fn active_mut(&mut self) -> &mut dyn CameraTrait {
        match self.active {
            CameraKind::Arcball => &mut self.arcball,
            CameraKind::Free => &mut self.free,
            CameraKind::FirstPerson => &mut self.first_person,
        }
    }

    /// Keeps the first person camera at the character's head looking along
    /// its heading, and the arcball centred on it
    pub fn follow(&mut self, position: &glm::Vec3, heading: f32) {
        let forward = glm::vec3(heading.sin(), 0.0, heading.cos());
        let head = position + glm::vec3(0.0, Self::HEAD_HEIGHT, 0.0);
        self.first_person.place(&(head + forward), PI - heading, FRAC_PI_2);
        self.arcball.set_look_at(&head);
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        for cam in [&mut self.free, &mut self.first_person] {
            let mut p = cam.projection;
            p.aspect_ratio = aspect_ratio;
            cam.set_projection(p);
        }
        let mut p = self.arcball.projection;
        p.aspect_ratio = aspect_ratio;
        self.arcball.set_projection(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0005_f32;

    fn vec_eq(a: &glm::Vec3, b: &glm::Vec3) {
        let c = glm::equal_eps(a, b, EPSILON);
        assert!(c.x && c.y && c.z, "{a:?} != {b:?}");
    }

    /// Where a world point ends up in view space
    fn to_view(cam: &dyn CameraTrait, p: &glm::Vec3) -> glm::Vec3 {
        let v = cam.view_matrix() * glm::vec4(p.x, p.y, p.z, 1.0);
        glm::vec3(v.x, v.y, v.z)
    }

    #[test]
    fn arcball_orbits() {
        let cam = ArcballCamera::new(
            Projection::default(),
            glm::vec3(1.0, 2.0, 3.0),
            10.0,
            0.0,
            FRAC_PI_2 / 2.0,
        );
        let d = 10.0 * std::f32::consts::FRAC_1_SQRT_2;
        vec_eq(&cam.position(), &glm::vec3(1.0, 2.0 + d, 3.0 + d));
        // Target straight ahead down -Z
        vec_eq(&to_view(&cam, &cam.look_at()), &glm::vec3(0.0, 0.0, -10.0));
    }

    #[test]
    fn arcball_phi_clamped() {
        let mut cam = ArcballCamera::default();
        cam.rotate(0.0, 10.0);
        assert!((cam.phi() - (FRAC_PI_2 - PHI_MARGIN)).abs() < EPSILON);
        cam.rotate(0.0, -10.0);
        assert!((cam.phi() - PHI_MARGIN).abs() < EPSILON);
        assert!(cam.position().y > cam.look_at().y);
    }

    #[test]
    fn arcball_zoom() {
        let mut cam = ArcballCamera::default();
        cam.move_forward(5.0);
        assert!((cam.radius() - 10.0).abs() < EPSILON);
        cam.move_forward(100.0);
        assert!((cam.radius() - MIN_RADIUS).abs() < EPSILON);
        cam.move_backward(2.0);
        assert!((cam.radius() - 2.1).abs() < EPSILON);
        assert!((glm::distance(&cam.position(), &cam.look_at()) - 2.1).abs() < EPSILON);
    }

    #[test]
    fn free_moves_along_direction() {
        // Theta of PI with level pitch looks down +Z
        let mut cam = FreeCamera::new(Projection::default(), glm::Vec3::zeros(), PI, FRAC_PI_2);
        vec_eq(&cam.direction(), &glm::vec3(0.0, 0.0, 1.0));
        cam.move_forward(3.0);
        vec_eq(&cam.position(), &glm::vec3(0.0, 0.0, 3.0));
        cam.move_backward(1.0);
        vec_eq(&cam.position(), &glm::vec3(0.0, 0.0, 2.0));
        vec_eq(&to_view(&cam, &glm::vec3(0.0, 0.0, 7.0)), &glm::vec3(0.0, 0.0, -5.0));
    }

    #[test]
    fn rig_switches_by_tag() {
        let mut rig = CameraRig::default();
        assert_eq!(rig.kind(), CameraKind::Arcball);
        let arcball_eye = rig.active().position();
        rig.switch(CameraKind::Free);
        vec_eq(&rig.active().position(), &glm::vec3(0.0, 50.0, 100.0));
        rig.active_mut().move_forward(10.0);
        // Looking down -Z
        vec_eq(&rig.free.position(), &glm::vec3(0.0, 50.0, 90.0));
        vec_eq(&rig.arcball.position(), &arcball_eye);
    }

    #[test]
    fn first_person_follows_heading() {
        let mut rig = CameraRig::default();
        rig.follow(&glm::vec3(10.0, 1.0, 0.0), FRAC_PI_2);
        vec_eq(&rig.first_person.position(), &glm::vec3(11.0, 6.0, 0.0));
        vec_eq(&rig.first_person.direction(), &glm::vec3(1.0, 0.0, 0.0));
        vec_eq(&rig.arcball.look_at(), &glm::vec3(10.0, 6.0, 0.0));
    }

    #[test]
    fn mvp_matches_product() {
        let cam = ArcballCamera::default();
        let m = glm::translation(&glm::vec3(1.0, 0.0, 0.0));
        assert_eq!(cam.mvp(&m), cam.proj_matrix() * cam.view_matrix() * m);
    }
}
