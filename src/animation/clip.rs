use super::types::{AnimationClip, Channel, ChannelValues, Skeleton};
use crate::asset::{AssetAnimation, AssetChannel, AssetModel, TargetPath};
use ahash::{HashMap, HashMapExt};
use log::{debug, info, warn};
use nalgebra_glm as glm;
use std::collections::hash_map::Entry;

/// Converts the flat keyframe values of a channel. Returns `None` for
/// targets the skeleton doesn't animate.
fn channel_values(source: &AssetChannel) -> Option<ChannelValues> {
    let vec3s = |values: &[f32]| -> Vec<glm::Vec3> {
        values
            .chunks_exact(3)
            .map(|v| glm::vec3(v[0], v[1], v[2]))
            .collect()
    };
    match source.path {
        TargetPath::Translation => {
            Some(ChannelValues::Translation(vec3s(&source.values)))
        }
        TargetPath::Rotation => Some(ChannelValues::Rotation(
            source
                .values
                .chunks_exact(4)
                .map(|q| glm::quat(q[0], q[1], q[2], q[3]))
                .collect(),
        )),
        TargetPath::Scale => Some(ChannelValues::Scale(vec3s(&source.values))),
        TargetPath::MorphTargetWeights => None,
    }
}

impl ChannelValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(q) => q.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.truncate(len),
            Self::Rotation(q) => q.truncate(len),
        }
    }
}

/// Builds one clip from an animation definition.
///
/// Channels whose target node isn't a joint of `skeleton` are skipped, as
/// are targets other than translation, rotation and scale. Where the source
/// has more than one channel for the same joint and component the last one
/// replaces the earlier one in place.
#[must_use]
pub fn load_clip(animation: &AssetAnimation, skeleton: &Skeleton) -> AnimationClip {
    let mut channels: Vec<Channel> = Vec::new();
    let mut slots = HashMap::new();
    let mut outside = 0_usize;
    let mut replaced = 0_usize;

    for source in &animation.channels {
        let Some(joint) = skeleton.joint_for_node(source.target_node) else {
            outside += 1;
            continue;
        };
        let Some(mut values) = channel_values(source) else {
            continue;
        };

        let mut times = source.times.clone();
        if times.len() != values.len() {
            warn!(
                "animation {:?} node {} has {} times but {} values",
                animation.name,
                source.target_node,
                times.len(),
                values.len()
            );
            let len = times.len().min(values.len());
            times.truncate(len);
            values.truncate(len);
        }

        let channel = Channel {
            joint,
            times,
            values,
        };
        match slots.entry((joint, channel.component())) {
            Entry::Occupied(slot) => {
                channels[*slot.get()] = channel;
                replaced += 1;
            }
            Entry::Vacant(slot) => {
                slot.insert(channels.len());
                channels.push(channel);
            }
        }
    }

    let duration = channels
        .iter()
        .filter_map(|c| c.times.last().copied())
        .fold(0.0_f32, f32::max);

    debug!(
        "clip={:?} channels={} replaced={} outside skeleton={} duration={}",
        animation.name,
        channels.len(),
        replaced,
        outside,
        duration
    );

    AnimationClip {
        name: animation.name.clone(),
        duration,
        channels,
    }
}

/// Builds every clip in the asset against the skeleton. Without a skeleton
/// nothing can be animated so no clips are built.
#[must_use]
pub fn load_clips(asset: &AssetModel, skeleton: &Skeleton) -> Vec<AnimationClip> {
    if skeleton.is_empty() {
        if !asset.animations.is_empty() {
            info!(
                "{} animations ignored, model has no skeleton",
                asset.animations.len()
            );
        }
        return Vec::new();
    }
    let clips: Vec<AnimationClip> = asset
        .animations
        .iter()
        .map(|a| load_clip(a, skeleton))
        .collect();
    for clip in &clips {
        info!("Animation \"{}\" duration={}", clip.name, clip.duration);
    }
    clips
}

impl AnimationClip {
    /// Channel for a joint and component, if the clip animates it
    #[must_use]
    pub fn channel(
        &self,
        joint: usize,
        component: super::ComponentType,
    ) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.joint == joint && c.component() == component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ComponentType, Joint};

    fn skeleton() -> Skeleton {
        // Joint index i comes from node 10 + i
        let joints = vec![
            Joint::default(),
            Joint {
                parent: Some(0),
                ..Default::default()
            },
        ];
        Skeleton::new("test".to_string(), joints, vec![10, 11])
    }

    fn translation(node: usize, times: Vec<f32>, values: Vec<f32>) -> AssetChannel {
        AssetChannel {
            target_node: node,
            path: TargetPath::Translation,
            times,
            values,
        }
    }

    #[test]
    fn duplicates_last_wins() {
        let animation = AssetAnimation {
            name: "walk".to_string(),
            channels: vec![
                translation(11, vec![0.0, 1.0], vec![0.0; 6]),
                AssetChannel {
                    target_node: 11,
                    path: TargetPath::Rotation,
                    times: vec![0.0],
                    values: vec![0.0, 0.0, 0.0, 1.0],
                },
                translation(11, vec![0.0, 0.5], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ],
        };
        let clip = load_clip(&animation, &skeleton());

        let translations: Vec<&Channel> = clip
            .channels
            .iter()
            .filter(|c| c.joint == 1 && c.component() == ComponentType::Translation)
            .collect();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].times, vec![0.0, 0.5]);
        assert_eq!(
            translations[0].values,
            ChannelValues::Translation(vec![
                glm::vec3(1.0, 2.0, 3.0),
                glm::vec3(4.0, 5.0, 6.0)
            ])
        );
        // Replaced in place, so it stays ahead of the rotation
        assert_eq!(clip.channels.len(), 2);
        assert_eq!(clip.channels[0].component(), ComponentType::Translation);
        // The replaced channel's longer range no longer counts
        assert!((clip.duration - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn skips_outside_and_unknown() {
        let animation = AssetAnimation {
            name: "idle".to_string(),
            channels: vec![
                translation(3, vec![0.0, 9.0], vec![0.0; 6]),
                AssetChannel {
                    target_node: 10,
                    path: TargetPath::MorphTargetWeights,
                    times: vec![0.0, 7.0],
                    values: vec![0.0, 1.0],
                },
                AssetChannel {
                    target_node: 10,
                    path: TargetPath::Scale,
                    times: vec![0.0, 2.0],
                    values: vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
                },
            ],
        };
        let clip = load_clip(&animation, &skeleton());
        assert_eq!(clip.channels.len(), 1);
        assert_eq!(clip.channels[0].joint, 0);
        assert_eq!(clip.channels[0].component(), ComponentType::Scale);
        assert!((clip.duration - 2.0).abs() < f32::EPSILON);
        assert!(clip.channel(0, ComponentType::Scale).is_some());
        assert!(clip.channel(0, ComponentType::Rotation).is_none());
    }

    #[test]
    fn rotation_is_xyzw() {
        let animation = AssetAnimation {
            name: "turn".to_string(),
            channels: vec![AssetChannel {
                target_node: 10,
                path: TargetPath::Rotation,
                times: vec![0.0],
                values: vec![0.1, 0.2, 0.3, 0.9],
            }],
        };
        let clip = load_clip(&animation, &skeleton());
        let ChannelValues::Rotation(q) = &clip.channels[0].values else {
            panic!("expected rotation values");
        };
        assert_eq!(q[0].w, 0.9);
        assert_eq!(q[0].i, 0.1);
        assert_eq!(q[0].k, 0.3);
    }

    #[test]
    fn mismatched_counts_truncate() {
        let animation = AssetAnimation {
            name: "short".to_string(),
            channels: vec![translation(10, vec![0.0, 1.0, 2.0], vec![0.0; 6])],
        };
        let clip = load_clip(&animation, &skeleton());
        assert_eq!(clip.channels[0].times.len(), 2);
        assert_eq!(clip.channels[0].values.len(), 2);
        assert!((clip.duration - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn no_skeleton_no_clips() {
        let asset = AssetModel {
            animations: vec![AssetAnimation {
                name: "idle".to_string(),
                channels: vec![translation(10, vec![0.0], vec![0.0; 3])],
            }],
            ..Default::default()
        };
        assert!(load_clips(&asset, &Skeleton::default()).is_empty());
    }
}
