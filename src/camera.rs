//! Side-scrolling camera. Tracks the player horizontally and holds the level's vertical center
//! whenever the whole level height fits on screen.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::level::LevelAssets;
use crate::player::Player;
use crate::state::GameSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            follow_player_camera
                .after(GameSet::Movement)
                .run_if(has_player_and_camera),
        );
    }
}

#[derive(Component)]
pub struct FollowCamera;

const FOLLOW_SPEED: f32 = 6.0;

fn has_player_and_camera(
    player_query: Query<Entity, With<Player>>,
    camera_query: Query<Entity, With<FollowCamera>>,
) -> bool {
    !player_query.is_empty() && !camera_query.is_empty()
}

/// Where the camera should sit so the view stays inside the level bounds.
pub fn follow_target(player: Vec2, half_view: Vec2, origin: Vec2, size: Vec2) -> Vec2 {
    let axis = |target: f32, half: f32, start: f32, extent: f32| {
        if extent > half * 2.0 {
            target.clamp(start + half, start + extent - half)
        } else {
            start + extent * 0.5
        }
    };

    Vec2::new(
        axis(player.x, half_view.x, origin.x, size.x),
        axis(player.y, half_view.y, origin.y, size.y),
    )
}

fn follow_player_camera(
    mut camera_query: Query<(&mut Transform, &OrthographicProjection), With<FollowCamera>>,
    player_query: Query<&Transform, (With<Player>, Without<FollowCamera>)>,
    level_assets: Res<LevelAssets>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
) {
    let Ok(player_transform) = player_query.get_single() else {
        return;
    };
    let Ok((mut camera_transform, projection)) = camera_query.get_single_mut() else {
        return;
    };

    let player = player_transform.translation.truncate();
    let desired = match (
        level_assets.level_origin,
        level_assets.level_size,
        window_query.get_single(),
    ) {
        (Some(origin), Some(size), Ok(window)) => {
            let half_view = window.resolution.size() * 0.5 * projection.scale;
            follow_target(player, half_view, origin, size)
        }
        _ => player,
    };

    let lerp_t = 1.0 - f32::exp(-FOLLOW_SPEED * time.delta_seconds());
    let target = desired.extend(camera_transform.translation.z);
    camera_transform.translation = camera_transform.translation.lerp(target, lerp_t);
}
