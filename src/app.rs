//! High-level plugin composition.
//!
//! `BlasterPlatformerPlugin` glues together every gameplay plugin and fixes the order of the
//! per-frame sets: input and state transitions, then movement, then combat and pickups. Event
//! dispatch and audio follow the effects set.

use bevy::prelude::*;

use crate::audio::GameAudioPlugin;
use crate::camera::{CameraPlugin, FollowCamera};
use crate::collision::CollisionPlugin;
use crate::combat::CombatPlugin;
use crate::config::Tunables;
use crate::context::ContextPlugin;
use crate::enemies::EnemyPlugin;
use crate::events::GameEventsPlugin;
use crate::factory::FactoryPlugin;
use crate::input::FrameInputPlugin;
use crate::level::LevelPlugin;
use crate::movement::MovementPlugin;
use crate::pattern_log::PatternLog;
use crate::player::PlayerPlugin;
use crate::state::{restart_run, toggle_pause, GameSet, GameState};
use crate::ui::UiPlugin;

/// Expects `Tunables` and `PatternLog` to be inserted beforehand when they should differ from the
/// defaults; the context and factory read them while being built.
pub struct BlasterPlatformerPlugin;

impl Plugin for BlasterPlatformerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Tunables>()
            .init_resource::<PatternLog>()
            .init_state::<GameState>()
            .add_plugins((
                FrameInputPlugin, // Keyboard → FrameInput.
                ContextPlugin,    // The one GameContext.
                GameEventsPlugin, // Event bus + listeners.
                FactoryPlugin,    // Tag → entity.
                LevelPlugin,      // LDtk loading + built-in fallback.
                CollisionPlugin,  // LDtk cells → LevelTree.
                PlayerPlugin,     // Avatar, state machine, power-up stack.
                MovementPlugin,   // Kinematics.
                EnemyPlugin,      // Enemy brains.
                CombatPlugin,     // Hits, pickups, hazards, respawn.
                CameraPlugin,     // Side-scroll follow.
                GameAudioPlugin,  // Sound cues.
                UiPlugin,         // HUD and overlays.
            ))
            .configure_sets(
                Update,
                (GameSet::Input, GameSet::Movement, GameSet::Effects)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (toggle_pause, restart_run).before(GameSet::Input));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2dBundle::default(),
        FollowCamera,
    ));
}
