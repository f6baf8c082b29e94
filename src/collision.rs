//! Turns spawned LDtk levels into game data: IntGrid cells become the `LevelTree` used for
//! collision and tile queries, entity-layer instances become factory spawn requests.

use bevy::math::IVec2;
use bevy::prelude::*;
use bevy::transform::TransformSystem;
use bevy_ecs_ldtk::prelude::*;

use crate::context::GameContext;
use crate::factory::SpawnRequest;
use crate::level::{LevelAssets, LevelConfig};
use crate::level_tree::{LevelTree, TileKind};
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player::Player;

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelTree>().add_systems(
            PostUpdate,
            (
                rebuild_level_tree.after(crate::level::sync_level_spatial),
                request_ldtk_entities.after(TransformSystem::TransformPropagate),
            )
                .in_set(CollisionSystems),
        );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollisionSystems;

pub const INT_SOLID: i32 = 1;
pub const INT_GOAL: i32 = 2;
pub const INT_HAZARD: i32 = 3;

/// LDtk entity identifier marking the player start.
pub const PLAYER_MARKER: &str = "Player";

/// IntGrid value to tile kind. Zero and negative values are empty space.
pub fn tile_kind_for(value: i32) -> Option<TileKind> {
    match value {
        v if v <= 0 => None,
        INT_SOLID => Some(TileKind::Solid),
        INT_GOAL => Some(TileKind::Goal),
        INT_HAZARD => Some(TileKind::Hazard),
        _ => Some(TileKind::Background),
    }
}

/// One `COMPOSITE` record per zone, then the level summary.
pub fn log_assembly(tree: &LevelTree, log: &mut PatternLog) {
    for (zone, name) in tree.zones() {
        log.record(
            LogCategory::Composite,
            format!("Zone '{name}' holds {} tile(s)", tree.tiles(zone).count()),
        );
    }
    log.record(LogCategory::Composite, tree.summary());
}

fn rebuild_level_tree(
    mut events: EventReader<LevelEvent>,
    int_cells: Query<(&GridCoords, &IntGridCell)>,
    config: Res<LevelConfig>,
    level_assets: Res<LevelAssets>,
    context: Res<GameContext>,
    mut tree: ResMut<LevelTree>,
    mut log: ResMut<PatternLog>,
) {
    let mut needs_rebuild = false;
    let mut should_clear = false;

    for event in events.read() {
        match event {
            LevelEvent::Spawned(_) => needs_rebuild = true,
            LevelEvent::Despawned(_) => should_clear = true,
            _ => {}
        }
    }

    if !needs_rebuild {
        if should_clear {
            *tree = LevelTree::default();
        }
        return;
    }

    let cells = int_cells.iter().filter_map(|(coords, cell)| {
        tile_kind_for(cell.value).map(|kind| (IVec2::new(coords.x, coords.y), kind))
    });

    *tree = LevelTree::assemble(
        context.current_level.number,
        Vec2::splat(config.tile_size),
        level_assets.level_origin.unwrap_or(Vec2::ZERO),
        cells,
    );
    log_assembly(&tree, &mut log);

    if tree.solid_tiles().next().is_none() {
        warn!(
            "Level tree has no solid tiles. Ensure the LDtk IntGrid layer marks solid tiles with value {INT_SOLID}."
        );
    }
}

fn request_ldtk_entities(
    instances: Query<(&EntityInstance, &GlobalTransform), Added<EntityInstance>>,
    mut requests: EventWriter<SpawnRequest>,
    mut level_assets: ResMut<LevelAssets>,
    mut player: Query<&mut Transform, With<Player>>,
) {
    for (instance, transform) in &instances {
        let position = transform.translation().truncate();

        if instance.identifier == PLAYER_MARKER {
            level_assets.player_spawn = Some(position);
            for mut player_transform in &mut player {
                player_transform.translation.x = position.x;
                player_transform.translation.y = position.y;
            }
            continue;
        }

        requests.send(SpawnRequest {
            tag: instance.identifier.clone(),
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy_ecs_ldtk::LevelIid;

    #[test]
    fn int_grid_values_map_to_tile_kinds() {
        assert_eq!(tile_kind_for(0), None);
        assert_eq!(tile_kind_for(1), Some(TileKind::Solid));
        assert_eq!(tile_kind_for(2), Some(TileKind::Goal));
        assert_eq!(tile_kind_for(3), Some(TileKind::Hazard));
        assert_eq!(tile_kind_for(7), Some(TileKind::Background));
    }

    #[test]
    fn spawned_level_rebuilds_the_tree() {
        let mut world = World::new();
        world.init_resource::<Events<LevelEvent>>();
        world.insert_resource(LevelConfig::default());
        world.insert_resource(LevelAssets {
            level_origin: Some(Vec2::new(-64.0, 0.0)),
            ..default()
        });
        world.init_resource::<GameContext>();
        world.init_resource::<LevelTree>();
        world.init_resource::<PatternLog>();

        world.spawn((GridCoords::new(0, 0), IntGridCell { value: 1 }));
        world.spawn((GridCoords::new(1, 0), IntGridCell { value: 1 }));
        world.spawn((GridCoords::new(2, 0), IntGridCell { value: 3 }));
        world.spawn((GridCoords::new(3, 1), IntGridCell { value: 2 }));
        world.spawn((GridCoords::new(4, 4), IntGridCell { value: 0 }));
        world.send_event(LevelEvent::Spawned(LevelIid::new("level-0")));

        world.run_system_once(rebuild_level_tree);

        let tree = world.resource::<LevelTree>();
        assert_eq!(tree.tile_count(), 4);
        assert!(tree.is_solid(IVec2::new(1, 0)));
        assert!(tree.is_hazard(IVec2::new(2, 0)));
        assert!(tree.is_goal(IVec2::new(3, 1)));
        assert_eq!(tree.origin, Vec2::new(-64.0, 0.0));

        let log = world.resource::<PatternLog>();
        assert_eq!(log.count(LogCategory::Composite), 5);
        assert_eq!(
            log.last().map(|record| record.message.as_str()),
            Some("Level 1 assembled: 4 zones, 2 solid tiles, 1 hazards")
        );
    }

    #[test]
    fn entity_instances_become_spawn_requests() {
        let mut world = World::new();
        world.init_resource::<Events<SpawnRequest>>();
        world.init_resource::<LevelAssets>();

        world.spawn((
            EntityInstance {
                identifier: "Metall".to_owned(),
                ..default()
            },
            GlobalTransform::from_xyz(40.0, 24.0, 0.0),
        ));
        world.spawn((
            EntityInstance {
                identifier: PLAYER_MARKER.to_owned(),
                ..default()
            },
            GlobalTransform::from_xyz(8.0, 32.0, 0.0),
        ));

        world.run_system_once(request_ldtk_entities);

        assert_eq!(
            world.resource::<LevelAssets>().player_spawn,
            Some(Vec2::new(8.0, 32.0))
        );
        let tags: Vec<_> = world
            .resource::<Events<SpawnRequest>>()
            .iter_current_update_events()
            .map(|request| (request.tag.clone(), request.position))
            .collect();
        assert_eq!(tags, vec![("Metall".to_owned(), Vec2::new(40.0, 24.0))]);
    }
}
