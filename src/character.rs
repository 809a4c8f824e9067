//! An animated, skinned character that walks on the ground. Owns its
//! skeleton, its clips and the playback state; nothing here is shared.

use crate::{
    actors::GRAVITY,
    animation::{load_clips, AnimationPlayer, Skeleton},
    asset::{gltf_file, AssetModel},
    config::CharacterOptions,
    mn_error::MnError,
    steering::Mover,
};
use log::{info, warn};
use nalgebra_glm as glm;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct Character {
    skeleton: Skeleton,
    player: AnimationPlayer,
    mover: Mover,
    scale: f32,
    vertical_velocity: f32,
    on_ground: bool,
}

/// Within this height above the ground the character counts as standing
/// on it
const GROUND_TOLERANCE: f32 = 0.2;

impl Character {
    /// Builds a character from an already imported model. A model without
    /// a skin gives a rigid character with no clips.
    ///
    /// # Errors
    /// May return `MnError` if the skin refers to missing nodes
    pub fn from_asset(asset: &AssetModel) -> Result<Self, MnError> {
        let skeleton = Skeleton::from_asset(asset)?;
        let clips = load_clips(asset, &skeleton);
        info!(
            "Character ready joints={} clips={:?}",
            skeleton.len(),
            clips.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );
        Ok(Self {
            skeleton,
            player: AnimationPlayer::new(clips),
            mover: Mover::default(),
            scale: 1.0,
            vertical_velocity: 0.0,
            on_ground: false,
        })
    }

    /// Loads a character from a `.glb` or `.gltf` file
    ///
    /// # Errors
    /// May return `MnError`
    pub fn load(path: &Path) -> Result<Self, MnError> {
        let asset = gltf_file::load(path)?;
        Self::from_asset(&asset)
    }

    /// Loads the file named in the options and applies their scale and
    /// chase speed
    ///
    /// # Errors
    /// May return `MnError`
    pub fn from_options(options: &CharacterOptions) -> Result<Self, MnError> {
        let mut character = Self::load(Path::new(&options.file))?;
        character.apply_options(options);
        Ok(character)
    }

    pub fn apply_options(&mut self, options: &CharacterOptions) {
        self.scale = options.scale;
        self.mover.speed = options.chase_speed;
    }

    /// Starts a clip by name. An unknown name is logged and otherwise
    /// ignored so the current animation keeps going.
    pub fn play(&mut self, name: &str) {
        if let Err(e) = self.player.play(name) {
            warn!("Character keeps its current animation: {e}");
        }
    }

    /// Switches between the walk and idle clips. Does nothing when the
    /// wanted clip is already the active one, so calling this every frame
    /// doesn't restart the clip.
    pub fn set_walking(&mut self, walking: bool, options: &CharacterOptions) {
        let wanted = if walking {
            &options.walk_clip
        } else {
            &options.idle_clip
        };
        if self.player.is_playing()
            && self.player.current_clip_name() == Some(wanted.as_str())
        {
            return;
        }
        self.play(wanted);
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    /// Advances the animation and refreshes the palette
    pub fn update(&mut self, dt: f32) {
        self.player.update(&mut self.skeleton, dt);
    }

    /// Steers toward `target` at the chase speed, then advances the
    /// animation
    pub fn update_toward(&mut self, dt: f32, target: &glm::Vec3, turn_speed: f32) {
        self.mover.pursue(target, turn_speed, dt);
        self.player.update(&mut self.skeleton, dt);
    }

    pub fn move_forward(&mut self, amount: f32) {
        self.mover.move_forward(amount);
    }

    pub fn move_backward(&mut self, amount: f32) {
        self.mover.move_forward(-amount);
    }

    pub fn turn_left(&mut self, angle: f32) {
        self.mover.turn(angle);
    }

    pub fn turn_right(&mut self, angle: f32) {
        self.mover.turn(-angle);
    }

    /// Leaves the ground with an upward velocity. Only possible while
    /// standing; returns whether the jump happened.
    pub fn jump(&mut self, velocity: f32) -> bool {
        if !self.on_ground {
            return false;
        }
        self.vertical_velocity = velocity;
        self.on_ground = false;
        true
    }

    /// Vertical motion for one step. `ground` is the surface height below
    /// the character, `None` off the edge of the world where it just falls.
    /// Feet are kept `offset` above the surface.
    pub fn apply_gravity(&mut self, dt: f32, ground: Option<f32>, offset: f32) {
        let Some(ground) = ground else {
            self.on_ground = false;
            self.vertical_velocity += GRAVITY * dt;
            self.mover.position.y += self.vertical_velocity * dt;
            return;
        };
        let target = ground + offset;
        let y = self.mover.position.y;
        if y > target + GROUND_TOLERANCE || self.vertical_velocity > 0.0 {
            self.vertical_velocity += GRAVITY * dt;
            let y = y + self.vertical_velocity * dt;
            if y <= target {
                self.land(target);
            } else {
                self.mover.position.y = y;
                self.on_ground = false;
            }
        } else {
            self.land(target);
        }
    }

    fn land(&mut self, height: f32) {
        self.mover.position.y = height;
        self.vertical_velocity = 0.0;
        self.on_ground = true;
    }

    #[must_use]
    pub const fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    #[must_use]
    pub const fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    #[must_use]
    pub const fn position(&self) -> glm::Vec3 {
        self.mover.position
    }

    pub fn set_position(&mut self, position: &glm::Vec3) {
        self.mover.position = *position;
    }

    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.mover.heading
    }

    #[must_use]
    pub fn forward(&self) -> glm::Vec3 {
        self.mover.forward()
    }

    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Translation, then rotation about +Y by the heading, then the uniform
    /// scale
    #[must_use]
    pub fn model_matrix(&self) -> glm::Mat4 {
        self.mover.model_matrix(self.scale)
    }

    #[must_use]
    pub fn palette(&self) -> &[glm::Mat4] {
        self.skeleton.palette()
    }

    #[must_use]
    pub fn palette_bytes(&self) -> &[u8] {
        self.skeleton.palette_bytes()
    }

    #[must_use]
    pub fn skinning_enabled(&self) -> bool {
        self.skeleton.skinning_enabled()
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    #[must_use]
    pub fn current_clip_name(&self) -> Option<&str> {
        self.player.current_clip_name()
    }

    #[must_use]
    pub const fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub const fn player(&self) -> &AnimationPlayer {
        &self.player
    }
}
