use nalgebra_glm as glm;

/// What every camera variant offers. Rendering needs the matrices and the
/// eye position, input handling needs the movement.
pub trait CameraTrait {
    fn position(&self) -> glm::Vec3;
    fn view_matrix(&self) -> glm::Mat4;
    fn proj_matrix(&self) -> glm::Mat4;

    /// Changes the yaw (`d_theta`) and pitch (`d_phi`) angles
    fn rotate(&mut self, d_theta: f32, d_phi: f32);
    fn move_forward(&mut self, amount: f32);
    fn move_backward(&mut self, amount: f32);

    /// Model view projection for a model matrix
    fn mvp(&self, m: &glm::Mat4) -> glm::Mat4 {
        self.proj_matrix() * self.view_matrix() * m
    }
}
