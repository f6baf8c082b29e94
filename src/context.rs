//! Shared game context: score, lives, pause flag and the current level.
//!
//! Exactly one `GameContext` exists per app. `ContextPlugin` constructs it while the app is being
//! composed and stores it as an ECS resource; systems then borrow it through `Res`/`ResMut`
//! parameters, which also lets the scheduler prove that no two systems mutate it at once. Nothing
//! reaches it through a global.

use bevy::prelude::*;

use crate::config::Tunables;
use crate::pattern_log::{LogCategory, PatternLog};

pub const SCORE_DIGITS: usize = 7;
pub const DEFAULT_LIVES: u32 = 3;

pub struct ContextPlugin;

impl Plugin for ContextPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<GameContext>() {
            let lives = app
                .world()
                .get_resource::<Tunables>()
                .map(|tunables| tunables.starting_lives)
                .unwrap_or(DEFAULT_LIVES);
            app.insert_resource(GameContext::new(lives, LevelRef::first()));
        }

        app.add_systems(Startup, announce_context);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRef {
    pub identifier: String,
    pub number: u32,
}

impl LevelRef {
    pub fn first() -> Self {
        Self {
            identifier: "Level_0".to_owned(),
            number: 1,
        }
    }
}

#[derive(Resource, Debug)]
pub struct GameContext {
    pub score: u64,
    pub lives: u32,
    pub paused: bool,
    pub game_over: bool,
    pub level_complete: bool,
    pub current_level: LevelRef,
    pub enemies_defeated: u32,
    pub items_collected: u32,
    starting_lives: u32,
}

impl Default for GameContext {
    fn default() -> Self {
        Self::new(DEFAULT_LIVES, LevelRef::first())
    }
}

impl GameContext {
    pub fn new(starting_lives: u32, level: LevelRef) -> Self {
        Self {
            score: 0,
            lives: starting_lives,
            paused: false,
            game_over: false,
            level_complete: false,
            current_level: level,
            enemies_defeated: 0,
            items_collected: 0,
            starting_lives,
        }
    }

    pub fn add_score(&mut self, points: u64) -> u64 {
        self.score = self.score.saturating_add(points);
        self.score
    }

    pub fn record_enemy_defeated(&mut self) -> u32 {
        self.enemies_defeated += 1;
        self.enemies_defeated
    }

    pub fn record_item_collected(&mut self) -> u32 {
        self.items_collected += 1;
        self.items_collected
    }

    /// Returns the new pause flag.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Spends a life and returns how many remain. Reaching zero flags game over.
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
        }
        self.lives
    }

    /// Back to a fresh run on the same level: score, counters, lives and flags reset.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.starting_lives;
        self.paused = false;
        self.game_over = false;
        self.level_complete = false;
        self.enemies_defeated = 0;
        self.items_collected = 0;
    }

    /// Zero-padded score for the HUD, e.g. `0001500`.
    pub fn formatted_score(&self) -> String {
        format!("{:0width$}", self.score, width = SCORE_DIGITS)
    }
}

fn announce_context(context: Res<GameContext>, mut log: ResMut<PatternLog>) {
    log.record(
        LogCategory::Singleton,
        format!(
            "GameContext ready (lives: {}, level: {})",
            context.lives, context.current_level.identifier
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn resource_is_the_same_instance_on_every_read() {
        let mut world = World::new();
        world.insert_resource(GameContext::default());

        let first: *const GameContext = world.resource::<GameContext>();
        let second: *const GameContext = world.resource::<GameContext>();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn writes_are_visible_to_later_reads() {
        let mut world = World::new();
        world.insert_resource(GameContext::default());

        world.resource_mut::<GameContext>().add_score(100);
        assert_eq!(world.resource::<GameContext>().score, 100);
    }

    #[test]
    fn plugin_does_not_replace_an_existing_context() {
        let mut app = App::new();
        let mut context = GameContext::default();
        context.add_score(42);
        app.insert_resource(context);
        app.init_resource::<PatternLog>();
        app.add_plugins(ContextPlugin);

        assert_eq!(app.world().resource::<GameContext>().score, 42);
    }

    #[test]
    fn plugin_uses_tunable_lives() {
        let mut app = App::new();
        app.insert_resource(Tunables {
            starting_lives: 5,
            ..Tunables::default()
        });
        app.add_plugins(ContextPlugin);

        assert_eq!(app.world().resource::<GameContext>().lives, 5);
    }

    #[test]
    fn announce_logs_under_singleton() {
        let mut world = World::new();
        world.insert_resource(GameContext::default());
        world.init_resource::<PatternLog>();
        world.run_system_once(announce_context);

        assert_eq!(
            world.resource::<PatternLog>().count(LogCategory::Singleton),
            1
        );
    }

    #[test]
    fn losing_last_life_sets_game_over() {
        let mut context = GameContext::new(2, LevelRef::first());
        assert_eq!(context.lose_life(), 1);
        assert!(!context.game_over);
        assert_eq!(context.lose_life(), 0);
        assert!(context.game_over);
        assert_eq!(context.lose_life(), 0);
    }

    #[test]
    fn reset_restores_starting_values() {
        let mut context = GameContext::new(4, LevelRef::first());
        context.add_score(1500);
        context.record_enemy_defeated();
        context.record_item_collected();
        context.lose_life();
        context.toggle_pause();
        context.level_complete = true;

        context.reset();
        assert_eq!(context.score, 0);
        assert_eq!(context.lives, 4);
        assert!(!context.paused);
        assert!(!context.level_complete);
        assert_eq!(context.enemies_defeated, 0);
        assert_eq!(context.items_collected, 0);
    }

    #[test]
    fn score_is_zero_padded() {
        let mut context = GameContext::default();
        context.add_score(1500);
        assert_eq!(context.formatted_score(), "0001500");
    }
}
