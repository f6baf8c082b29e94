//! Top-level game flow. `GameState` drives which systems run; the pause flag on `GameContext` is
//! kept in step with it so anything holding the context sees the same answer.

use bevy::prelude::*;

use crate::context::GameContext;
use crate::input::FrameInput;
use crate::pattern_log::{LogCategory, PatternLog};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Paused,
    GameOver,
    StageClear,
}

/// Named system sets to structure the Update schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Movement,
    Effects,
}

/// Esc flips between Playing and Paused.
pub fn toggle_pause(
    input: Res<FrameInput>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut context: ResMut<GameContext>,
    mut log: ResMut<PatternLog>,
) {
    if !input.pause {
        return;
    }

    let target = match state.get() {
        GameState::Playing => GameState::Paused,
        GameState::Paused => GameState::Playing,
        _ => return,
    };

    let paused = context.toggle_pause();
    next_state.set(target);
    log.record(
        LogCategory::Info,
        if paused { "Game paused" } else { "Game resumed" },
    );
}

/// Enter on the game-over or stage-clear screen starts a fresh run.
pub fn restart_run(
    input: Res<FrameInput>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut context: ResMut<GameContext>,
    mut log: ResMut<PatternLog>,
) {
    if !input.restart || !matches!(state.get(), GameState::GameOver | GameState::StageClear) {
        return;
    }

    context.reset();
    next_state.set(GameState::Loading);
    log.record(LogCategory::Info, "Run restarted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn world_in(state: GameState, input: FrameInput) -> World {
        let mut world = World::new();
        world.insert_resource(State::new(state));
        world.init_resource::<NextState<GameState>>();
        world.init_resource::<GameContext>();
        world.init_resource::<PatternLog>();
        world.insert_resource(input);
        world
    }

    fn pending(world: &World) -> Option<GameState> {
        match world.resource::<NextState<GameState>>() {
            NextState::Pending(state) => Some(*state),
            NextState::Unchanged => None,
        }
    }

    #[test]
    fn escape_pauses_and_flags_the_context() {
        let mut world = world_in(
            GameState::Playing,
            FrameInput {
                pause: true,
                ..default()
            },
        );

        world.run_system_once(toggle_pause);

        assert_eq!(pending(&world), Some(GameState::Paused));
        assert!(world.resource::<GameContext>().paused);
    }

    #[test]
    fn pause_is_ignored_while_loading() {
        let mut world = world_in(
            GameState::Loading,
            FrameInput {
                pause: true,
                ..default()
            },
        );

        world.run_system_once(toggle_pause);

        assert_eq!(pending(&world), None);
        assert!(!world.resource::<GameContext>().paused);
    }

    #[test]
    fn restart_resets_the_context_after_game_over() {
        let mut world = world_in(
            GameState::GameOver,
            FrameInput {
                restart: true,
                ..default()
            },
        );
        {
            let mut context = world.resource_mut::<GameContext>();
            context.add_score(1200);
            while context.lose_life() > 0 {}
        }

        world.run_system_once(restart_run);

        assert_eq!(pending(&world), Some(GameState::Loading));
        let context = world.resource::<GameContext>();
        assert_eq!(context.score, 0);
        assert!(!context.game_over);
        assert_eq!(context.lives, 3);
    }

    #[test]
    fn restart_does_nothing_mid_level() {
        let mut world = world_in(
            GameState::Playing,
            FrameInput {
                restart: true,
                ..default()
            },
        );
        world.run_system_once(restart_run);
        assert_eq!(pending(&world), None);
    }
}
