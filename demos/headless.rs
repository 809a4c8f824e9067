//! Runs the scene without a window: loads the character, walks it in a
//! circle on the hill with a few jumps while enemies chase it, and logs
//! what a renderer would be given each second.
//!
//! `cargo run --example headless -- [scene.yaml] [model.glb]`
use log::{error, info, warn};
use marionette::{
    camera::CameraKind,
    character::Character,
    config::SceneOptions,
    game::{Controls, Game, GameEvent},
    types::CameraTrait,
};
use nalgebra_glm as glm;
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

const SECONDS: u32 = 20;
const SEED: u64 = 752;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut options = match args.get(1) {
        Some(path) => match SceneOptions::from_yaml_file(Path::new(path)) {
            Ok(o) => o,
            Err(e) => {
                error!("Could not read {}: {}", path, e);
                return;
            }
        },
        None => SceneOptions::default(),
    };
    if let Some(model) = args.get(2) {
        options.character.file.clone_from(model);
    }

    let character = match Character::from_options(&options.character) {
        Ok(c) => c,
        Err(e) => {
            error!("Could not load {}: {}", options.character.file, e);
            return;
        }
    };

    let dt = options.time_step;
    let mut game = Game::new(character, options, &mut StdRng::seed_from_u64(SEED));
    game.cameras_mut().switch(CameraKind::FirstPerson);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks_per_second = (1.0 / dt).round().max(1.0) as u32;

    for tick in 0..SECONDS * ticks_per_second {
        // Idle for the first second, then walk a wide circle and hop every
        // three seconds
        let walking = tick >= ticks_per_second;
        let controls = Controls {
            forward: walking,
            turn_left: walking && tick % 4 == 0,
            jump: walking && tick % (3 * ticks_per_second) == 0,
            ..Default::default()
        };
        for event in game.tick(dt, &controls) {
            match event {
                GameEvent::PlayerFell | GameEvent::PlayerCaught => {
                    warn!("Game over: {:?}, coins {}", event, game.coins_collected());
                }
                GameEvent::AllCoinsCollected => info!("You win"),
                _ => info!("{:?}", event),
            }
        }

        if tick % ticks_per_second == 0 {
            let character = game.character();
            let mvp = game.cameras().active().mvp(&character.model_matrix());
            let root = character.palette().first().map(|m| m.column(3).xyz());
            info!(
                "t={}s clip={:?} joints={} bytes={} root={:?} pos={:?} ground={}",
                tick / ticks_per_second,
                character.current_clip_name(),
                character.palette().len(),
                character.palette_bytes().len(),
                root,
                character.position(),
                character.is_on_ground(),
            );
            info!(
                "enemies alive={} coins={}/{} particles={} dead={} clip_origin={:?}",
                game.enemies().iter().filter(|e| e.is_alive()).count(),
                game.coins_collected(),
                game.coins().len(),
                game.particles().len(),
                game.is_dead(),
                (mvp * glm::vec4(0.0, 0.0, 0.0, 1.0)).xyz(),
            );
        }
    }
}
