// Vertex formats handed to a renderer. Both are plain old data so they can
// be copied straight into a GPU buffer with `bytemuck::cast_slice`.
use bytemuck::{Pod, Zeroable};

/// Vertex of a skinned mesh. Four joint indices are packed into one `u32`,
/// first index in the most significant byte.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub joint_ids: u32,
    pub weights: [f32; 4],
}

impl SkinnedVertex {
    #[must_use]
    pub const fn new(
        position: [f32; 3],
        normal: [f32; 3],
        joints: [u8; 4],
        weights: [f32; 4],
    ) -> Self {
        Self {
            position,
            normal,
            joint_ids: pack_joint_ids(joints),
            weights,
        }
    }

    #[must_use]
    pub const fn joints(&self) -> [u8; 4] {
        unpack_joint_ids(self.joint_ids)
    }
}

#[must_use]
pub const fn pack_joint_ids(ids: [u8; 4]) -> u32 {
    u32::from_be_bytes(ids)
}

#[must_use]
pub const fn unpack_joint_ids(packed: u32) -> [u8; 4] {
    packed.to_be_bytes()
}

/// Vertex of the textured quad used for billboards
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}
