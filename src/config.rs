//! Scene settings. Every field has a default so a YAML file only needs the
//! values it wants to change.

use crate::{camera::Projection, mn_error::MnError, terrain::Terrain};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct CharacterOptions {
    /// Path of the `.glb` or `.gltf` model
    pub file: String,
    /// Uniform scale in the model matrix
    pub scale: f32,
    /// Meters per second when walking
    pub move_speed: f32,
    /// Radians per second when turning
    pub turn_speed: f32,
    /// Speed used when the character is steered toward a target
    pub chase_speed: f32,
    pub idle_clip: String,
    pub walk_clip: String,
    /// Feet are kept this far above the ground
    pub ground_offset: f32,
    /// Upward speed when a jump starts
    pub jump_velocity: f32,
    /// Collision radius against enemies
    pub radius: f32,
    /// The character dies after falling below this height
    pub fall_floor: f32,
}

impl Default for CharacterOptions {
    fn default() -> Self {
        Self {
            file: "assets/models/heroes/Elster/elster.glb".to_string(),
            scale: 3.0,
            move_speed: 10.0,
            turn_speed: 2.0,
            chase_speed: 5.0,
            idle_clip: "elsterIdle".to_string(),
            walk_clip: "elsterWalking".to_string(),
            ground_offset: 0.5,
            jump_velocity: 15.0,
            radius: 0.5,
            fall_floor: -50.0,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct EnemyOptions {
    pub count: usize,
    /// Radians per second
    pub turn_speed: f32,
    /// Height of the sprite centre above the ground
    pub ground_offset: f32,
    /// Falling enemies die below this height
    pub fall_floor: f32,
    /// An enemy only catches the character when their heights differ by
    /// less than this, so jumping over one is safe
    pub catch_height: f32,
}

impl Default for EnemyOptions {
    fn default() -> Self {
        Self {
            count: 10,
            turn_speed: 1.5,
            ground_offset: 1.0,
            fall_floor: -50.0,
            catch_height: 2.0,
        }
    }
}

/// Particles per burst for each event
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default)]
pub struct ParticleOptions {
    pub player_death: usize,
    pub enemy_fall: usize,
    pub enemy_death: usize,
    pub coin: usize,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            player_death: 30,
            enemy_fall: 15,
            enemy_death: 10,
            coin: 15,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct SceneOptions {
    pub character: CharacterOptions,
    pub terrain: Terrain,
    pub enemies: EnemyOptions,
    pub particles: ParticleOptions,
    pub projection: Projection,
    /// Distance from a coin's centre at which the player picks it up
    pub coin_reach: f32,
    /// Fixed simulation step in seconds
    pub time_step: f32,
}

impl SceneOptions {
    /// Parses options from YAML text
    ///
    /// # Errors
    /// May return `MnError`
    pub fn from_yaml_str(text: &str) -> Result<Self, MnError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads options from a YAML file
    ///
    /// # Errors
    /// May return `MnError`
    pub fn from_yaml_file(path: &Path) -> Result<Self, MnError> {
        let text = fs::read_to_string(path)?;
        let options = Self::from_yaml_str(&text)?;
        info!("Scene options loaded from {:?}", path);
        Ok(options)
    }

    /// YAML text for these options
    ///
    /// # Errors
    /// May return `MnError`
    pub fn to_yaml_string(&self) -> Result<String, MnError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            character: CharacterOptions::default(),
            terrain: Terrain::default(),
            enemies: EnemyOptions::default(),
            particles: ParticleOptions::default(),
            projection: Projection::default(),
            coin_reach: 2.5,
            time_step: 1.0 / 60.0,
        }
    }
}
