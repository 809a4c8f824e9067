use nalgebra_glm as glm;

/// A scene graph node as far as the animation system cares about it.
///
/// Components are optional because the source file may omit them. An
/// explicit `matrix` replaces the decomposed components entirely; glTF does
/// not allow both on the same node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetNode {
    pub name: Option<String>,
    pub matrix: Option<[f32; 16]>,
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>, // x, y, z, w
    pub scale: Option<[f32; 3]>,
    pub children: Vec<usize>,
}

impl AssetNode {
    /// Translation component, zero if omitted
    #[must_use]
    pub fn base_translation(&self) -> glm::Vec3 {
        self.translation
            .map_or_else(glm::Vec3::zeros, |t| glm::vec3(t[0], t[1], t[2]))
    }

    /// Rotation component, identity if omitted. The stored order is
    /// `x, y, z, w` with `w` the scalar part.
    #[must_use]
    pub fn base_rotation(&self) -> glm::Quat {
        self.rotation.map_or_else(glm::Quat::identity, |r| {
            glm::quat(r[0], r[1], r[2], r[3])
        })
    }

    /// Scale component, unit if omitted
    #[must_use]
    pub fn base_scale(&self) -> glm::Vec3 {
        self.scale
            .map_or_else(|| glm::vec3(1.0, 1.0, 1.0), |s| glm::vec3(s[0], s[1], s[2]))
    }

    /// Transform of this node relative to its parent
    #[must_use]
    pub fn local_transform(&self) -> glm::Mat4 {
        self.matrix.map_or_else(
            || {
                glm::translation(&self.base_translation())
                    * glm::quat_to_mat4(&self.base_rotation())
                    * glm::scaling(&self.base_scale())
            },
            |m| glm::make_mat4(&m),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetSkin {
    pub name: Option<String>,
    /// Node indices. Position in this list is the joint index used by the
    /// mesh's joint attribute.
    pub joints: Vec<usize>,
    /// Packed matrices, 16 floats per joint in file storage order
    pub inverse_bind_matrices: Option<Vec<f32>>,
}

/// Which node property an animation channel drives
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    MorphTargetWeights,
}

/// One animation channel with its sampler data already read out of the
/// buffers. `values` holds 3 floats per key for translation and scale and
/// 4 floats (`x, y, z, w`) per key for rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetChannel {
    pub target_node: usize,
    pub path: TargetPath,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetAnimation {
    pub name: String,
    pub channels: Vec<AssetChannel>,
}

/// Read-only, fully dereferenced view of an imported file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetModel {
    pub nodes: Vec<AssetNode>,
    pub skins: Vec<AssetSkin>,
    pub animations: Vec<AssetAnimation>,
}

impl AssetModel {
    /// Returns the first node whose child list contains `node_index`
    #[must_use]
    pub fn parent_of(&self, node_index: usize) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.children.contains(&node_index))
    }
}

/// Errors specific to importing data. `MnError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoNodeInfo(usize),
    NoSampler(usize),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoNodeInfo(a) => write!(f, "node {a} has missing info"),
            Self::NoSampler(a) => {
                write!(f, "animation {a} has a channel without sampler data")
            }
        }
    }
}
