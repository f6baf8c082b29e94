//! HUD and full-screen overlays for pause, game over and stage clear.

use bevy::prelude::*;

use crate::context::GameContext;
use crate::player::{Health, Player};
use crate::powerups::{CapabilityStack, PowerUpKind, PowerUpTimers};
use crate::state::GameState;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud)
            .add_systems(Update, refresh_hud)
            .add_systems(OnEnter(GameState::Paused), spawn_pause_menu)
            .add_systems(OnEnter(GameState::GameOver), spawn_game_over)
            .add_systems(OnEnter(GameState::StageClear), spawn_stage_clear)
            .add_systems(OnExit(GameState::Paused), despawn_overlays)
            .add_systems(OnExit(GameState::GameOver), despawn_overlays)
            .add_systems(OnExit(GameState::StageClear), despawn_overlays);
    }
}

#[derive(Component)]
struct HudText;

#[derive(Component)]
struct Overlay;

/// One line of status text: score, lives, health and any running power-ups.
pub fn hud_line(
    context: &GameContext,
    health: Option<(&Health, &CapabilityStack, &PowerUpTimers)>,
) -> String {
    let mut line = format!(
        "SCORE {}   LIVES {}   LEVEL {}",
        context.formatted_score(),
        context.lives,
        context.current_level.number
    );

    if let Some((health, stack, timers)) = health {
        line.push_str(&format!(
            "   HP {}/{}",
            health.current,
            stack.effective().max_health
        ));

        for kind in PowerUpKind::ALL {
            if let Some(remaining) = timers.remaining(kind) {
                line.push_str(&format!(
                    "   {kind} x{} {:.0}s",
                    stack.count(kind),
                    remaining.ceil()
                ));
            }
        }
    }
    line
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        HudText,
        Name::new("Hud"),
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 20.0,
                color: Color::srgba(0.95, 0.95, 0.95, 1.0),
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(12.0),
            ..default()
        }),
    ));
}

fn refresh_hud(
    context: Res<GameContext>,
    player: Query<(&Health, &CapabilityStack, &PowerUpTimers), With<Player>>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud.get_single_mut() else {
        return;
    };
    let line = hud_line(&context, player.get_single().ok());
    if let Some(section) = text.sections.first_mut() {
        if section.value != line {
            section.value = line;
        }
    }
}

fn spawn_overlay(commands: &mut Commands, message: String) {
    commands
        .spawn((
            Overlay,
            Name::new("Overlay"),
            NodeBundle {
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(TextBundle::from_section(
                message,
                TextStyle {
                    font_size: 36.0,
                    color: Color::srgba(0.9, 0.9, 0.9, 1.0),
                    ..default()
                },
            ));
        });
}

fn spawn_pause_menu(mut commands: Commands) {
    spawn_overlay(&mut commands, "Paused\nPress ESC to resume".to_owned());
}

fn spawn_game_over(mut commands: Commands, context: Res<GameContext>) {
    spawn_overlay(
        &mut commands,
        format!(
            "Game Over\nScore {}\nPress ENTER to try again",
            context.formatted_score()
        ),
    );
}

fn spawn_stage_clear(mut commands: Commands, context: Res<GameContext>) {
    spawn_overlay(
        &mut commands,
        format!(
            "Stage Clear!\nScore {}  Enemies {}  Items {}\nPress ENTER to play again",
            context.formatted_score(),
            context.enemies_defeated,
            context.items_collected
        ),
    );
}

fn despawn_overlays(mut commands: Commands, query: Query<Entity, With<Overlay>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
