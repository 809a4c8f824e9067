pub mod clip;
pub mod player;
pub mod skeleton;
mod types;
pub mod util;

// Re-exports
pub use {
    clip::load_clips,
    player::AnimationPlayer,
    types::{
        AnimationClip, AnimationState, Channel, ChannelValues, ComponentType,
        Joint, Skeleton,
    },
    util::{animate, sample_pose, Pose},
};
