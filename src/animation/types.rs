use nalgebra_glm as glm;

/// A joint of a skinned skeleton. Index into `Skeleton::joints` is the joint
/// index used by the mesh's per-vertex joint attribute.
#[derive(Clone, Debug)]
pub struct Joint {
    pub name: String,
    pub parent: Option<usize>,
    /// Brings a vertex from mesh space into this joint's space at bind time
    pub inverse_bind: glm::Mat4,
    /// Current transform relative to the parent
    pub local_transform: glm::Mat4,
    /// Current transform in model space
    pub global_transform: glm::Mat4,
    // Bind pose components used when a clip doesn't animate them
    pub base_translation: glm::Vec3,
    pub base_rotation: glm::Quat,
    pub base_scale: glm::Vec3,
}

impl Default for Joint {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            inverse_bind: glm::Mat4::identity(),
            local_transform: glm::Mat4::identity(),
            global_transform: glm::Mat4::identity(),
            base_translation: glm::Vec3::zeros(),
            base_rotation: glm::Quat::identity(),
            base_scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

/// Joint hierarchy plus the skinning matrix palette it produces. An empty
/// skeleton is valid and means "no skinning".
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub name: String,
    pub joints: Vec<Joint>,
    /// Source node index for each joint
    pub joint_to_node: Vec<usize>,
    /// Joint indices with every parent ahead of its children
    pub(crate) order: Vec<usize>,
    pub(crate) palette: Vec<glm::Mat4>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ComponentType {
    Translation,
    Rotation,
    Scale,
}

/// Keyframe values of a channel. The variant decides the component type so
/// a rotation channel can't end up holding vectors.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<glm::Vec3>),
    Rotation(Vec<glm::Quat>),
    Scale(Vec<glm::Vec3>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub joint: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

impl Channel {
    #[must_use]
    pub const fn component(&self) -> ComponentType {
        match self.values {
            ChannelValues::Translation(_) => ComponentType::Translation,
            ChannelValues::Rotation(_) => ComponentType::Rotation,
            ChannelValues::Scale(_) => ComponentType::Scale,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnimationState {
    pub active_clip: Option<usize>,
    pub current_time: f32,
    pub playing: bool,
}
