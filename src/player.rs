//! Player entity lifecycle and per-frame behaviour.
//!
//! The avatar is spawned when play starts and survives pausing; it is only removed when a level
//! (re)loads. Each frame its `PlayerState` is advanced from the sampled input, the capability
//! stack's effective numbers are pushed into the movement components, and expired power-up layers
//! are peeled off again.

use bevy::prelude::*;

use crate::combat::{player_volley, spawn_projectile};
use crate::config::Tunables;
use crate::events::GameEvent;
use crate::input::FrameInput;
use crate::level::LevelAssets;
use crate::level_tree::LevelTree;
use crate::movement::{Collider, MovementState, PlayerController, Velocity};
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player_state::{transition, PlayerSignals, PlayerState};
use crate::powerups::{Capabilities, CapabilityStack, PowerUpTimers};
use crate::state::{GameSet, GameState};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_player)
            .add_systems(OnEnter(GameState::Loading), despawn_player)
            .add_systems(
                Update,
                (
                    (advance_player_state, apply_capabilities)
                        .chain()
                        .in_set(GameSet::Input),
                    (expire_power_ups, tick_invincibility).in_set(GameSet::Effects),
                ),
            );
    }
}

/// Marker used by camera follow, combat and HUD queries to find the avatar.
#[derive(Component)]
pub struct Player;

/// -1.0 facing left, 1.0 facing right.
#[derive(Component, Debug, Clone, Copy, Deref, DerefMut)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: i32,
}

impl Health {
    pub fn full(caps: &Capabilities) -> Self {
        Self {
            current: caps.max_health,
        }
    }

    pub fn take(&mut self, damage: i32) -> i32 {
        self.current = (self.current - damage).max(0);
        self.current
    }

    /// Heals up to `max_health` and returns the amount actually restored.
    pub fn heal(&mut self, amount: i32, max_health: i32) -> i32 {
        let before = self.current;
        self.current = (self.current + amount.max(0)).min(max_health).max(before);
        self.current - before
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Invincibility {
    pub remaining: f32,
}

impl Invincibility {
    pub fn active(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Weapon cooldown. The shot pose lasts exactly as long as the cooldown, so holding the fire
/// button re-fires the moment the pose ends.
#[derive(Component, Debug, Clone, Copy)]
pub struct ShotClock {
    pub cooldown: f32,
    remaining: f32,
}

impl ShotClock {
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            remaining: 0.0,
        }
    }

    pub fn ready(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn fire(&mut self) {
        self.remaining = self.cooldown;
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

const DEFAULT_SPAWN_OFFSET: Vec2 = Vec2::new(30.0, 60.0);
const SPRITE_SIZE: Vec2 = Vec2::new(22.0, 30.0);
const PLAYER_COLOR: Color = Color::srgb(0.25, 0.55, 1.0);
pub const COLLIDER_SIZE: Vec2 = Vec2::new(20.0, 30.0);
const MUZZLE_OFFSET: f32 = 14.0;

/// Where the player enters the level: the level's marked spawn cell when it has one, otherwise a
/// fixed offset from the level origin.
pub fn spawn_point(level_assets: &LevelAssets) -> Vec2 {
    level_assets.player_spawn.unwrap_or_else(|| {
        level_assets
            .level_origin
            .map(|origin| origin + DEFAULT_SPAWN_OFFSET)
            .unwrap_or(DEFAULT_SPAWN_OFFSET)
    })
}

fn spawn_player(
    mut commands: Commands,
    existing: Query<(), With<Player>>,
    level_assets: Res<LevelAssets>,
    level: Res<LevelTree>,
    tunables: Res<Tunables>,
    mut log: ResMut<PatternLog>,
) {
    // Resuming from pause re-enters Playing with the avatar still alive.
    if !existing.is_empty() {
        return;
    }

    let stack = CapabilityStack::with_defaults();
    let spawn = spawn_point(&level_assets);
    let movement = MovementState {
        on_ground: level.grounded(spawn, COLLIDER_SIZE * 0.5),
        ..default()
    };

    commands.spawn((
        (
            Name::new("Player"),
            Player,
            SpriteBundle {
                sprite: Sprite {
                    color: PLAYER_COLOR,
                    custom_size: Some(SPRITE_SIZE),
                    ..default()
                },
                transform: Transform::from_translation(spawn.extend(1.0)),
                ..default()
            },
            Velocity::default(),
            movement,
            PlayerController::default(),
            Collider::from_size(COLLIDER_SIZE),
        ),
        (
            PlayerState::default(),
            Health::full(&stack.effective()),
            stack,
            PowerUpTimers::default(),
            Invincibility::default(),
            ShotClock::new(tunables.shot_cooldown_secs),
            Facing::default(),
        ),
    ));

    log.record(
        LogCategory::State,
        format!("Player spawned in {}", PlayerState::default().label()),
    );
}

fn despawn_player(mut commands: Commands, query: Query<Entity, With<Player>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

#[allow(clippy::type_complexity)]
fn advance_player_state(
    mut commands: Commands,
    time: Res<Time>,
    input: Res<FrameInput>,
    tunables: Res<Tunables>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<
        (
            &Transform,
            &CapabilityStack,
            &mut PlayerState,
            &mut MovementState,
            &mut ShotClock,
            &mut Facing,
        ),
        With<Player>,
    >,
) {
    for (transform, stack, mut state, mut movement, mut clock, mut facing) in &mut query {
        clock.tick(time.delta_seconds());
        if input.horizontal() {
            **facing = input.axis();
        }

        let signals = PlayerSignals {
            grounded: movement.on_ground,
            shot_finished: clock.ready(),
            can_shoot: clock.ready(),
        };
        let step = transition(*state, &input, signals);

        if step.launches_jump(&input, signals) {
            movement.wants_jump = true;
        }

        if step.fires_shot(&input, signals) {
            clock.fire();
            let muzzle = transform.translation.truncate() + Vec2::new(MUZZLE_OFFSET * **facing, 0.0);
            for (projectile, position) in player_volley(
                muzzle,
                **facing,
                &stack.effective(),
                tunables.bullet_speed,
                tunables.bullet_lifetime_secs,
            ) {
                spawn_projectile(&mut commands, projectile, position);
            }
        }

        if step.changed() {
            log.record(
                LogCategory::State,
                format!("Player: {} -> {}", step.from.label(), step.to.label()),
            );
            events.send(GameEvent::PlayerStateChanged {
                from: step.from,
                to: step.to,
            });
            *state = step.to;
        }
    }
}

/// Horizontal speed comes from the decorated capabilities, damped while airborne.
fn apply_capabilities(
    input: Res<FrameInput>,
    mut query: Query<(&CapabilityStack, &PlayerController, &MovementState, &mut Velocity), With<Player>>,
) {
    for (stack, controller, movement, mut velocity) in &mut query {
        let control = if movement.on_ground {
            1.0
        } else {
            controller.air_control
        };
        velocity.x = input.axis() * stack.effective().speed * control;
    }
}

fn expire_power_ups(
    time: Res<Time>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<(&mut CapabilityStack, &mut PowerUpTimers, &mut Health), With<Player>>,
) {
    for (mut stack, mut timers, mut health) in &mut query {
        for kind in timers.tick(time.delta_seconds()) {
            match stack.remove(kind) {
                Some(layer) => {
                    log.record(
                        LogCategory::Decorator,
                        format!(
                            "{layer} expired, stack now holds {} layer(s)",
                            stack.layers().len()
                        ),
                    );
                    events.send(GameEvent::PowerUpChanged { kind, added: false });
                }
                None => log.record(
                    LogCategory::Error,
                    format!("No {kind} layer left to remove"),
                ),
            }
        }

        let max_health = stack.effective().max_health;
        if health.current > max_health {
            health.current = max_health;
        }
    }
}

fn tick_invincibility(time: Res<Time>, mut query: Query<&mut Invincibility>) {
    for mut invincibility in &mut query {
        if invincibility.active() {
            invincibility.remaining = (invincibility.remaining - time.delta_seconds()).max(0.0);
        }
    }
}
