//! One fixed step of the whole scene: player input and vertical motion,
//! enemies, coins, particles and cameras. The frame loop supplies the
//! controls and delta time and reacts to the returned events.

use crate::{
    actors::{self, Coin, Enemy, SpriteQuad},
    camera::CameraRig,
    character::Character,
    config::SceneOptions,
    particles::ParticleSystem,
};
use log::info;
use nalgebra_glm as glm;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

/// Buttons held during a step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub jump: bool,
}

impl Controls {
    #[must_use]
    pub const fn moving(&self) -> bool {
        self.forward || self.backward || self.turn_left || self.turn_right
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CoinCollected { collected: usize, total: usize },
    AllCoinsCollected,
    PlayerFell,
    PlayerCaught,
    EnemyFell,
    EnemyDied,
}

pub struct Game {
    options: SceneOptions,
    character: Character,
    enemies: Vec<Enemy>,
    coins: Vec<Coin>,
    particles: ParticleSystem,
    cameras: CameraRig,
    quad: Arc<SpriteQuad>,
    dead: bool,
    coins_collected: usize,
}

impl Game {
    /// Places the character on the hill top and spawns enemies and coins
    pub fn new<R: Rng>(mut character: Character, options: SceneOptions, rng: &mut R) -> Self {
        let terrain = options.terrain;
        let quad = SpriteQuad::shared();
        character.apply_options(&options.character);
        let ground = terrain.height_or(0.0, 0.0, 0.0);
        character.set_position(&glm::vec3(0.0, ground + options.character.ground_offset, 0.0));
        character.play(&options.character.idle_clip);

        let enemies = actors::spawn_enemies(rng, options.enemies.count, &terrain, &quad);
        let coins = actors::spawn_coins(&terrain, &quad);
        let particles = ParticleSystem::with_rng(Arc::clone(&quad), StdRng::from_rng(rng));
        let cameras = CameraRig::new(options.projection);
        Self {
            options,
            character,
            enemies,
            coins,
            particles,
            cameras,
            quad,
            dead: false,
            coins_collected: 0,
        }
    }

    /// Advances the scene by `dt` seconds
    pub fn tick(&mut self, dt: f32, controls: &Controls) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.dead {
            self.steer(dt, controls);
        }
        self.move_player(dt, &mut events);
        self.move_enemies(dt, &mut events);
        if !self.dead {
            self.check_caught(&mut events);
            self.collect_coins(&mut events);
        }
        for coin in &mut self.coins {
            coin.update(dt);
        }
        self.particles.update(dt);
        self.cameras
            .follow(&self.character.position(), self.character.heading());
        events
    }

    fn steer(&mut self, dt: f32, controls: &Controls) {
        let opts = &self.options.character;
        if controls.forward {
            self.character.move_forward(opts.move_speed * dt);
        }
        if controls.backward {
            self.character.move_backward(opts.move_speed * dt);
        }
        if controls.turn_left {
            self.character.turn_left(opts.turn_speed * dt);
        }
        if controls.turn_right {
            self.character.turn_right(opts.turn_speed * dt);
        }
        if controls.jump {
            self.character.jump(opts.jump_velocity);
        }
        self.character.set_walking(controls.moving(), opts);
    }

    fn move_player(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let opts = &self.options.character;
        let p = self.character.position();
        let ground = self.options.terrain.height(p.x, p.z);
        self.character.apply_gravity(dt, ground, opts.ground_offset);
        self.character.update(dt);

        let p = self.character.position();
        if !self.dead && p.y < opts.fall_floor {
            info!("Player fell off the edge, coins collected {}", self.coins_collected);
            self.kill_player();
            events.push(GameEvent::PlayerFell);
        }
    }

    fn move_enemies(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let opts = &self.options.enemies;
        let target = self.character.position();
        for enemy in &mut self.enemies {
            enemy.update(dt, &target, opts.turn_speed);
            if enemy.follow_terrain(&self.options.terrain, opts.ground_offset) {
                self.particles
                    .spawn_burst(&enemy.position(), self.options.particles.enemy_fall);
                events.push(GameEvent::EnemyFell);
            }
            if enemy.check_fallen(opts.fall_floor) {
                self.particles
                    .spawn_burst(&enemy.position(), self.options.particles.enemy_death);
                events.push(GameEvent::EnemyDied);
            }
        }
        actors::separate_enemies(&mut self.enemies);
    }

    fn check_caught(&mut self, events: &mut Vec<GameEvent>) {
        let player = self.character.position();
        let radius = self.options.character.radius;
        let catch_height = self.options.enemies.catch_height;
        let caught = self.enemies.iter().filter(|e| e.is_active()).any(|e| {
            let p = e.position();
            actors::overlaps(&player, radius, &p, e.radius)
                && (player.y - p.y).abs() < catch_height
        });
        if caught {
            info!("Player caught at {:?}, coins collected {}", player, self.coins_collected);
            self.kill_player();
            events.push(GameEvent::PlayerCaught);
        }
    }

    fn collect_coins(&mut self, events: &mut Vec<GameEvent>) {
        let player = self.character.position();
        let total = self.coins.len();
        for coin in &mut self.coins {
            if !coin.try_collect(&player, self.options.coin_reach) {
                continue;
            }
            self.coins_collected += 1;
            self.particles
                .spawn_burst(&coin.position, self.options.particles.coin);
            info!("Coin collected ({} / {})", self.coins_collected, total);
            events.push(GameEvent::CoinCollected {
                collected: self.coins_collected,
                total,
            });
            if self.coins_collected == total {
                info!("All coins collected");
                events.push(GameEvent::AllCoinsCollected);
            }
        }
    }

    fn kill_player(&mut self) {
        self.dead = true;
        self.character.stop();
        self.particles.spawn_burst(
            &self.character.position(),
            self.options.particles.player_death,
        );
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    #[must_use]
    pub fn has_won(&self) -> bool {
        !self.coins.is_empty() && self.coins_collected == self.coins.len()
    }

    #[must_use]
    pub const fn coins_collected(&self) -> usize {
        self.coins_collected
    }

    #[must_use]
    pub const fn options(&self) -> &SceneOptions {
        &self.options
    }

    #[must_use]
    pub const fn character(&self) -> &Character {
        &self.character
    }

    pub const fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub const fn enemies_mut(&mut self) -> &mut Vec<Enemy> {
        &mut self.enemies
    }

    #[must_use]
    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    #[must_use]
    pub const fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    #[must_use]
    pub const fn cameras(&self) -> &CameraRig {
        &self.cameras
    }

    pub const fn cameras_mut(&mut self) -> &mut CameraRig {
        &mut self.cameras
    }

    /// The sprite quad shared by enemies, coins and particles
    #[must_use]
    pub const fn quad(&self) -> &Arc<SpriteQuad> {
        &self.quad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetModel;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    /// Scene with no enemies and a rigid character at the hill top
    fn quiet_game() -> Game {
        let mut options = SceneOptions::default();
        options.enemies.count = 0;
        let character = Character::from_asset(&AssetModel::default()).unwrap();
        Game::new(character, options, &mut StdRng::seed_from_u64(1))
    }

    fn run(game: &mut Game, ticks: usize, controls: &Controls) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| game.tick(DT, controls)).collect()
    }

    #[test]
    fn starts_on_the_hill_top() {
        let mut game = quiet_game();
        run(&mut game, 5, &Controls::default());
        let p = game.character().position();
        let top = game.options().terrain.height(0.0, 0.0).unwrap();
        assert!((p.y - top - 0.5).abs() < 0.0005);
        assert!(game.character().is_on_ground());
        assert!((game.character().scale() - 3.0).abs() < f32::EPSILON);
        assert!(!game.is_dead());
    }

    #[test]
    fn jump_comes_back_down() {
        let mut game = quiet_game();
        run(&mut game, 1, &Controls::default());
        let start = game.character().position().y;
        let jump = Controls {
            jump: true,
            ..Default::default()
        };
        game.tick(DT, &jump);
        run(&mut game, 20, &Controls::default());
        assert!(game.character().position().y > start + 2.0);
        run(&mut game, 100, &Controls::default());
        assert!(game.character().is_on_ground());
        assert!((game.character().position().y - start).abs() < 0.0005);
    }

    #[test]
    fn walking_off_the_edge_is_fatal() {
        let mut game = quiet_game();
        let edge = game.options().terrain.world_size - 1.0;
        let c = game.character_mut();
        c.set_position(&glm::vec3(edge, 1.0, 0.0));
        c.turn_left(FRAC_PI_2);
        let forward = Controls {
            forward: true,
            ..Default::default()
        };

        let mut fell = 0;
        let mut burst = 0;
        for _ in 0..400 {
            if game.tick(DT, &forward).contains(&GameEvent::PlayerFell) {
                fell += 1;
                burst = game.particles().len();
            }
        }
        assert_eq!(fell, 1);
        assert_eq!(burst, game.options().particles.player_death);
        assert!(game.is_dead());
        assert!(game.character().position().y < game.options().character.fall_floor);

        // Input is ignored once dead
        let x = game.character().position().x;
        run(&mut game, 10, &forward);
        assert!((game.character().position().x - x).abs() < f32::EPSILON);
    }

    #[test]
    fn caught_only_at_the_same_height() {
        let mut game = quiet_game();
        run(&mut game, 1, &Controls::default());
        let p = game.character().position();
        let quad = Arc::clone(game.quad());

        // Far above the enemy, as if jumping over it
        game.character_mut().set_position(&(p + glm::vec3(0.0, 10.0, 0.0)));
        game.enemies_mut().push(Enemy::new(p, 0.0, Arc::clone(&quad)));
        let events = game.tick(DT, &Controls::default());
        assert!(events.is_empty(), "{events:?}");
        assert!(!game.is_dead());

        game.character_mut().set_position(&p);
        let events = game.tick(DT, &Controls::default());
        assert_eq!(events, vec![GameEvent::PlayerCaught]);
        assert!(game.is_dead());
        assert_eq!(
            game.particles().len(),
            game.options().particles.player_death
        );
    }

    #[test]
    fn collecting_every_coin_wins() {
        let mut game = quiet_game();
        let positions: Vec<glm::Vec3> = game.coins().iter().map(|c| c.position).collect();
        assert_eq!(positions.len(), 4);

        let mut events = Vec::new();
        for p in &positions {
            game.character_mut().set_position(p);
            events.extend(game.tick(DT, &Controls::default()));
        }
        assert_eq!(game.coins_collected(), 4);
        assert!(game.has_won());
        assert_eq!(
            events.last(),
            Some(&GameEvent::AllCoinsCollected)
        );
        assert!(events.contains(&GameEvent::CoinCollected {
            collected: 2,
            total: 4
        }));
    }

    #[test]
    fn dead_player_collects_nothing() {
        let mut game = quiet_game();
        run(&mut game, 1, &Controls::default());
        let p = game.character().position();
        let quad = Arc::clone(game.quad());
        game.enemies_mut().push(Enemy::new(p, 0.0, quad));
        game.tick(DT, &Controls::default());
        assert!(game.is_dead());

        let coin = game.coins()[0].position;
        game.character_mut().set_position(&coin);
        game.tick(DT, &Controls::default());
        assert_eq!(game.coins_collected(), 0);
    }
}
