//! Skeletal animation core for a skinned character demo, plus the small
//! pieces of game glue that surround it.
//!
//! The animation pipeline runs asset model → skeleton and clips → player →
//! pose → palette. A frame loop owned by the application supplies delta time
//! and consumes the palette together with a model matrix.

pub mod actors;
pub mod animation;
pub mod asset;
pub mod camera;
pub mod character;
pub mod config;
pub mod game;
pub mod mn_error;
pub mod particles;
pub mod skinning;
pub mod steering;
pub mod terrain;
pub mod types;
pub mod vertex;
