use bevy::prelude::*;

use crate::level_tree::LevelTree;
use crate::state::GameSet;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementSettings>()
            .add_systems(Update, apply_kinematics.in_set(GameSet::Movement));
    }
}

#[derive(Resource)]
pub struct MovementSettings {
    pub gravity: f32,
    pub terminal_velocity: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            gravity: 1150.0,
            terminal_velocity: -1800.0,
        }
    }
}

#[derive(Component, Debug, Default, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

#[derive(Component)]
pub struct PlayerController {
    /// Fraction of run speed available while airborne.
    pub air_control: f32,
    pub jump_strength: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            air_control: 0.8,
            jump_strength: 480.0,
        }
    }
}

#[derive(Component)]
pub struct MovementState {
    pub on_ground: bool,
    pub wants_jump: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            on_ground: true,
            wants_jump: false,
        }
    }
}

#[derive(Component, Debug, Copy, Clone)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }
}

fn apply_kinematics(
    time: Res<Time>,
    settings: Res<MovementSettings>,
    level: Res<LevelTree>,
    mut query: Query<(
        &mut Transform,
        &mut Velocity,
        &mut MovementState,
        &PlayerController,
        &Collider,
    )>,
) {
    let dt = time.delta_seconds();

    for (mut transform, mut velocity, mut state, controller, collider) in &mut query {
        step_body(
            &mut transform.translation,
            &mut velocity,
            &mut state,
            controller,
            collider.half_extents,
            dt,
            &settings,
            &level,
        );
    }
}

/// Integrates one body for one frame and refreshes its grounded flag for the next.
#[allow(clippy::too_many_arguments)]
pub fn step_body(
    position: &mut Vec3,
    velocity: &mut Vec2,
    state: &mut MovementState,
    controller: &PlayerController,
    half: Vec2,
    dt: f32,
    settings: &MovementSettings,
    level: &LevelTree,
) {
    if state.wants_jump && state.on_ground {
        velocity.y = controller.jump_strength;
        state.on_ground = false;
    }

    state.wants_jump = false;

    if !state.on_ground {
        velocity.y = (velocity.y - settings.gravity * dt).max(settings.terminal_velocity);
    } else if velocity.y < 0.0 {
        velocity.y = 0.0;
    }

    resolve_horizontal(position, &mut velocity.x, half, dt, level);
    let vertical = resolve_vertical(position, &mut velocity.y, half, dt, level);

    // Resting bodies have zero vertical speed, so the sweep above never looks down; probe instead.
    state.on_ground = vertical.down
        || (velocity.y.abs() < f32::EPSILON && level.grounded(position.truncate(), half));
}

struct VerticalCollision {
    down: bool,
}

/// Gap kept between a resting body and the tile it rests against.
pub const SKIN: f32 = 0.001;

fn tile_span(low: f32, high: f32, origin: f32, size: f32) -> std::ops::RangeInclusive<i32> {
    let first = ((low - origin) / size).floor() as i32;
    let last = ((high - origin) / size).floor() as i32;
    first..=last
}

fn resolve_horizontal(position: &mut Vec3, velocity: &mut f32, half: Vec2, dt: f32, level: &LevelTree) {
    if velocity.abs() < f32::EPSILON {
        return;
    }

    let new_x = position.x + *velocity * dt;
    let tile = level.tile_size;
    let rows = tile_span(
        position.y - half.y + SKIN,
        position.y + half.y - SKIN,
        level.origin.y,
        tile.y,
    );

    let leading = if *velocity > 0.0 { new_x + half.x } else { new_x - half.x };
    let column = ((leading - level.origin.x) / tile.x).floor() as i32;

    if rows.into_iter().any(|row| level.is_solid(IVec2::new(column, row))) {
        position.x = if *velocity > 0.0 {
            level.origin.x + column as f32 * tile.x - half.x - SKIN
        } else {
            level.origin.x + (column + 1) as f32 * tile.x + half.x + SKIN
        };
        *velocity = 0.0;
        return;
    }

    position.x = new_x;
}

fn resolve_vertical(
    position: &mut Vec3,
    velocity: &mut f32,
    half: Vec2,
    dt: f32,
    level: &LevelTree,
) -> VerticalCollision {
    let mut collision = VerticalCollision { down: false };
    if velocity.abs() < f32::EPSILON {
        return collision;
    }

    let new_y = position.y + *velocity * dt;
    let tile = level.tile_size;
    let columns = tile_span(
        position.x - half.x + SKIN,
        position.x + half.x - SKIN,
        level.origin.x,
        tile.x,
    );

    let falling = *velocity < 0.0;
    let leading = if falling { new_y - half.y } else { new_y + half.y };
    let row = ((leading - level.origin.y) / tile.y).floor() as i32;

    if columns.into_iter().any(|column| level.is_solid(IVec2::new(column, row))) {
        position.y = if falling {
            level.origin.y + (row + 1) as f32 * tile.y + half.y + SKIN
        } else {
            level.origin.y + row as f32 * tile.y - half.y - SKIN
        };
        *velocity = 0.0;
        collision.down = falling;
        return collision;
    }

    position.y = new_y;
    collision
}
