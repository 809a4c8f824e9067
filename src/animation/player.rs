use super::{
    types::{AnimationClip, AnimationState, Skeleton},
    util,
};
use crate::mn_error::MnError;
use log::{debug, warn};

/// Plays one looping clip at a time on a skeleton
#[derive(Clone, Debug, Default)]
pub struct AnimationPlayer {
    clips: Vec<AnimationClip>,
    state: AnimationState,
}

impl AnimationPlayer {
    #[must_use]
    pub const fn new(clips: Vec<AnimationClip>) -> Self {
        Self {
            clips,
            state: AnimationState {
                active_clip: None,
                current_time: 0.0,
                playing: false,
            },
        }
    }

    /// Starts the named clip from the beginning. Restarts it if it is
    /// already playing.
    ///
    /// # Errors
    /// Returns `MnError::ClipNotFound` if there is no clip with that name.
    /// The current state is left unchanged in that case.
    pub fn play(&mut self, name: &str) -> Result<usize, MnError> {
        let Some(index) = self.clips.iter().position(|c| c.name == name) else {
            warn!("Animation not found: {}", name);
            return Err(MnError::ClipNotFound(name.to_string()));
        };
        debug!("Playing animation \"{}\"", name);
        self.state = AnimationState {
            active_clip: Some(index),
            current_time: 0.0,
            playing: true,
        };
        Ok(index)
    }

    /// Pauses playback. The clip stays selected.
    pub fn stop(&mut self) {
        self.state.playing = false;
    }

    /// Moves playback time forward, looping at the end of the clip
    pub fn advance(&mut self, dt: f32) {
        if !self.state.playing {
            return;
        }
        let Some(clip) = self.active() else {
            return;
        };
        let duration = clip.duration;
        let mut time = self.state.current_time + dt;
        if time > duration {
            time = if duration > 0.0 { time % duration } else { 0.0 };
        }
        self.state.current_time = time;
    }

    /// Advances time, poses the skeleton from the active clip if playing,
    /// and always refreshes the skeleton's palette
    pub fn update(&mut self, skeleton: &mut Skeleton, dt: f32) {
        self.advance(dt);
        if self.state.playing {
            if let Some(clip) = self.active() {
                let pose = util::sample_pose(skeleton, clip, self.state.current_time);
                skeleton.set_local_transforms(&pose.local_transforms());
            }
        }
        skeleton.resolve();
    }

    fn active(&self) -> Option<&AnimationClip> {
        self.state.active_clip.and_then(|i| self.clips.get(i))
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.state.playing
    }

    #[must_use]
    pub fn current_clip_name(&self) -> Option<&str> {
        self.active().map(|c| c.name.as_str())
    }

    #[must_use]
    pub const fn current_time(&self) -> f32 {
        self.state.current_time
    }

    #[must_use]
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    #[must_use]
    pub const fn state(&self) -> &AnimationState {
        &self.state
    }
}
