use super::types::{Joint, Skeleton};
use crate::{
    asset::{AssetModel, AssetSkin, ImportError},
    mn_error::MnError,
};
use ahash::{HashMap, HashMapExt};
use log::{debug, info, warn};
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// Reads the inverse bind matrix for a joint from the packed skin data.
/// glTF says a skin without inverse bind matrices uses identity.
fn inverse_bind(skin: &AssetSkin, joint_index: usize) -> glm::Mat4 {
    let Some(packed) = &skin.inverse_bind_matrices else {
        return glm::Mat4::identity();
    };
    let start = joint_index * 16;
    packed.get(start..start + 16).map_or_else(
        || {
            warn!("joint {} has no inverse bind matrix", joint_index);
            glm::Mat4::identity()
        },
        glm::make_mat4,
    )
}

/// Orders joints so that each parent comes before its children. Depth first
/// from the roots, children visited in joint index order. Joints that can't
/// be reached from a root are only possible with a cycle in the parent links
/// and are appended at the end.
fn traversal_order(joints: &[Joint]) -> Vec<usize> {
    let count = joints.len();
    let mut children: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); count];
    let mut roots = Vec::new();
    for (index, joint) in joints.iter().enumerate() {
        match joint.parent {
            Some(parent) if parent < count => children[parent].push(index),
            _ => roots.push(index),
        }
    }

    let mut order = Vec::with_capacity(count);
    let mut visited = vec![false; count];
    let mut stack = Vec::new();
    for root in roots {
        stack.push(root);
        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);
            // Reversed so the lowest child index is popped first
            stack.extend(children[index].iter().rev().copied());
        }
    }

    if order.len() != count {
        warn!(
            "{} joints are not reachable from a root, parent links may form a cycle",
            count - order.len()
        );
        order.extend((0..count).filter(|&i| !visited[i]));
    }
    order
}

impl Skeleton {
    /// Creates a skeleton from already built joints and resolves the
    /// initial pose so the palette is valid straight away.
    #[must_use]
    pub fn new(name: String, mut joints: Vec<Joint>, joint_to_node: Vec<usize>) -> Self {
        let count = joints.len();
        for (index, joint) in joints.iter_mut().enumerate() {
            if let Some(parent) = joint.parent.filter(|&p| p >= count) {
                warn!("joint {} has parent {} outside the skeleton, made a root", index, parent);
                joint.parent = None;
            }
        }
        let order = traversal_order(&joints);
        let palette = vec![glm::Mat4::identity(); joints.len()];
        let mut skeleton = Self {
            name,
            joints,
            joint_to_node,
            order,
            palette,
        };
        skeleton.resolve();
        skeleton
    }

    /// Builds the skeleton from the first skin of the asset. A model without
    /// skins gives an empty skeleton, which is not an error.
    ///
    /// # Errors
    /// May return `MnError` if a joint refers to a node that doesn't exist
    pub fn from_asset(asset: &AssetModel) -> Result<Self, MnError> {
        let Some(skin) = asset.skins.first() else {
            info!("No skeleton found in model");
            return Ok(Self::default());
        };
        if asset.skins.len() > 1 {
            warn!("{} skins found, only the first is used", asset.skins.len());
        }

        // Node index to joint index. A node listed twice maps to its first
        // position, same as searching the joint list from the front.
        let mut node_to_joint = HashMap::<usize, usize>::with_capacity(skin.joints.len());
        for (joint_index, node_index) in skin.joints.iter().enumerate() {
            node_to_joint.entry(*node_index).or_insert(joint_index);
        }

        let mut joints = Vec::with_capacity(skin.joints.len());
        for (joint_index, &node_index) in skin.joints.iter().enumerate() {
            let node = asset
                .nodes
                .get(node_index)
                .ok_or(ImportError::NoNodeInfo(node_index))?;

            // The parent node might not be part of the skin, which leaves
            // this joint as a root
            let parent = asset
                .parent_of(node_index)
                .and_then(|p| node_to_joint.get(&p).copied());

            let local_transform = node.local_transform();
            joints.push(Joint {
                name: node.name.clone().unwrap_or_else(|| format!("node.{node_index}")),
                parent,
                inverse_bind: inverse_bind(skin, joint_index),
                local_transform,
                global_transform: glm::Mat4::identity(),
                base_translation: node.base_translation(),
                base_rotation: node.base_rotation(),
                base_scale: node.base_scale(),
            });
        }

        let name = skin.name.clone().unwrap_or_else(|| "skin.0".to_string());
        info!("skeleton={} joints={}", name, joints.len());
        debug!(
            "parents={:?}",
            joints.iter().map(|j| j.parent).collect::<Vec<_>>()
        );
        Ok(Self::new(name, joints, skin.joints.clone()))
    }

    /// Composes local transforms into model space transforms and writes the
    /// skinning palette. Does nothing for an empty skeleton.
    pub fn resolve(&mut self) {
        for &index in &self.order {
            let local = self.joints[index].local_transform;
            let global = match self.joints[index].parent {
                Some(parent) => self.joints[parent].global_transform * local,
                None => local,
            };
            let joint = &mut self.joints[index];
            joint.global_transform = global;
            self.palette[index] = global * joint.inverse_bind;
        }
    }

    /// Replaces the local transforms. Extra entries on either side are
    /// ignored.
    pub fn set_local_transforms(&mut self, locals: &[glm::Mat4]) {
        for (joint, local) in self.joints.iter_mut().zip(locals) {
            joint.local_transform = *local;
        }
    }

    /// Skinning matrices in joint index order
    #[must_use]
    pub fn palette(&self) -> &[glm::Mat4] {
        &self.palette
    }

    /// The palette as raw bytes, column major, ready to copy into a uniform
    /// or storage buffer
    #[must_use]
    pub fn palette_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.palette)
    }

    /// An empty palette means the mesh should be drawn rigid
    #[must_use]
    pub fn skinning_enabled(&self) -> bool {
        !self.palette.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Joint index for a source node index
    #[must_use]
    pub fn joint_for_node(&self, node_index: usize) -> Option<usize> {
        self.joint_to_node.iter().position(|&n| n == node_index)
    }

    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetNode;

    const EPSILON: f32 = 0.0005_f32;

    fn node(name: &str, translation: [f32; 3], children: Vec<usize>) -> AssetNode {
        AssetNode {
            name: Some(name.to_string()),
            translation: Some(translation),
            children,
            ..Default::default()
        }
    }

    /// Node 0 is a scene root that is not a joint, nodes 1..=3 form a chain
    /// but the skin lists them out of hierarchy order
    fn granary() -> AssetModel {
        AssetModel {
            nodes: vec![
                node("armature", [0.0, 0.0, 0.0], vec![1]),
                node("hips", [0.0, 1.0, 0.0], vec![2]),
                node("spine", [0.0, 0.5, 0.0], vec![3]),
                node("head", [0.0, 0.25, 0.0], vec![]),
            ],
            skins: vec![AssetSkin {
                name: Some("rig".to_string()),
                joints: vec![3, 1, 2],
                inverse_bind_matrices: None,
            }],
            animations: Vec::new(),
        }
    }

    #[test]
    fn no_skin_is_empty() {
        let asset = AssetModel::default();
        let mut skeleton = Skeleton::from_asset(&asset).unwrap();
        assert!(skeleton.is_empty());
        skeleton.resolve();
        assert!(skeleton.palette().is_empty());
        assert!(!skeleton.skinning_enabled());
        assert!(skeleton.palette_bytes().is_empty());
    }

    #[test]
    fn parents() {
        let skeleton = Skeleton::from_asset(&granary()).unwrap();
        assert_eq!(skeleton.len(), 3);
        assert_eq!(skeleton.joints[0].name, "head");
        assert_eq!(skeleton.joints[0].parent, Some(2));
        // "armature" isn't in the skin so "hips" is a root
        assert_eq!(skeleton.joints[1].parent, None);
        assert_eq!(skeleton.joints[2].parent, Some(1));
        assert_eq!(skeleton.joint_for_node(2), Some(2));
        assert_eq!(skeleton.joint_by_name("hips"), Some(1));
    }

    #[test]
    fn order_puts_parents_first() {
        let skeleton = Skeleton::from_asset(&granary()).unwrap();
        assert_eq!(skeleton.order(), &[1, 2, 0]);
    }

    #[test]
    fn resolve_out_of_order_chain() {
        let skeleton = Skeleton::from_asset(&granary()).unwrap();
        let head = skeleton.joints[0].global_transform;
        let c = glm::equal_eps(
            &glm::vec3(head[(0, 3)], head[(1, 3)], head[(2, 3)]),
            &glm::vec3(0.0, 1.75, 0.0),
            EPSILON,
        );
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn missing_node_is_an_error() {
        let mut asset = granary();
        asset.skins[0].joints.push(17);
        assert!(matches!(
            Skeleton::from_asset(&asset),
            Err(MnError::ImportError(ImportError::NoNodeInfo(17)))
        ));
    }

    #[test]
    fn explicit_matrix_used_verbatim() {
        let mut asset = granary();
        let m = glm::translation(&glm::vec3(4.0, 5.0, 6.0))
            * glm::scaling(&glm::vec3(2.0, 2.0, 2.0));
        let mut packed = [0.0f32; 16];
        packed.copy_from_slice(m.as_slice());
        asset.nodes[1] = AssetNode {
            name: Some("hips".to_string()),
            matrix: Some(packed),
            children: vec![2],
            ..Default::default()
        };
        let skeleton = Skeleton::from_asset(&asset).unwrap();
        assert_eq!(skeleton.joints[1].local_transform, m);
        // Bind pose components fall back to identity for a matrix node
        assert_eq!(skeleton.joints[1].base_translation, glm::Vec3::zeros());
        assert_eq!(skeleton.joints[1].base_scale, glm::vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn short_inverse_bind_data_uses_identity() {
        let mut asset = granary();
        let ibm = glm::translation(&glm::vec3(0.0, -1.0, 0.0));
        asset.skins[0].inverse_bind_matrices = Some(ibm.as_slice().to_vec());
        let skeleton = Skeleton::from_asset(&asset).unwrap();
        assert_eq!(skeleton.joints[0].inverse_bind, ibm);
        assert_eq!(skeleton.joints[1].inverse_bind, glm::Mat4::identity());
    }

    #[test]
    fn cycle_does_not_panic() {
        let joints = vec![
            Joint {
                parent: Some(1),
                ..Default::default()
            },
            Joint {
                parent: Some(0),
                ..Default::default()
            },
            Joint::default(),
        ];
        let mut skeleton = Skeleton::new("loop".to_string(), joints, vec![0, 1, 2]);
        assert_eq!(skeleton.order(), &[2, 0, 1]);
        skeleton.resolve();
        assert_eq!(skeleton.palette().len(), 3);
    }

    #[test]
    fn parent_outside_skeleton_becomes_root() {
        let joints = vec![
            Joint {
                parent: Some(5),
                local_transform: glm::translation(&glm::vec3(1.0, 2.0, 3.0)),
                ..Default::default()
            },
            Joint {
                parent: Some(0),
                local_transform: glm::translation(&glm::vec3(0.0, 1.0, 0.0)),
                ..Default::default()
            },
        ];
        let mut skeleton = Skeleton::new("stray".to_string(), joints, vec![0, 1]);
        assert_eq!(skeleton.joints[0].parent, None);
        assert_eq!(skeleton.joints[1].parent, Some(0));
        assert_eq!(skeleton.order(), &[0, 1]);
        skeleton.resolve();
        let tip = skeleton.palette()[1] * glm::vec4(0.0, 0.0, 0.0, 1.0);
        let c = glm::equal_eps(&tip.xyz(), &glm::vec3(1.0, 3.0, 3.0), EPSILON);
        assert!(c.x && c.y && c.z);
    }
}
