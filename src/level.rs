//! Level orchestration. The built-in ASCII stage is played unless an LDtk project is configured;
//! a configured project that fails to load falls back to the built-in stage as well.
//!
//! `LevelConfig` says what to load; `LevelAssets` mirrors what actually got loaded so the camera,
//! player spawn and combat systems can read sizes and positions without touching LDtk types.

use bevy::app::AppExit;
use bevy::asset::LoadState;
use bevy::math::IVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_ecs_ldtk::prelude::*;
use bevy_ecs_ldtk::utils::ldtk_pixel_coords_to_translation;

use crate::collision::log_assembly;
use crate::config::Tunables;
use crate::context::GameContext;
use crate::factory::SpawnRequest;
use crate::level_tree::{parse_stage, LevelError, LevelTree, StageLayout, TileKind};
use crate::movement::SKIN;
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player::COLLIDER_SIZE;
use crate::state::GameState;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<Tunables>()
            .map(LevelConfig::from)
            .unwrap_or_default();

        app.insert_resource(config)
            .init_resource::<LevelAssets>()
            .insert_resource(LevelSelection::index(0))
            .insert_resource(LdtkSettings {
                level_spawn_behavior: LevelSpawnBehavior::UseWorldTranslation {
                    load_level_neighbors: false,
                },
                set_clear_color: SetClearColor::FromLevelBackground,
                ..default()
            })
            .add_plugins(LdtkPlugin)
            .add_systems(
                OnEnter(GameState::Loading),
                (
                    clear_level_entities,
                    spawn_ldtk_world.run_if(uses_ldtk),
                    enter_builtin_stage.run_if(not(uses_ldtk)),
                )
                    .chain(),
            )
            .add_systems(
                Update,
                monitor_level_loading.run_if(in_state(GameState::Loading)),
            )
            .add_systems(PostUpdate, sync_level_spatial);
    }
}

#[derive(Resource, Clone)]
pub struct LevelConfig {
    /// `None` plays the built-in stage.
    pub project_path: Option<String>,
    pub start_level: Option<String>,
    pub tile_size: f32,
    pub camera_zoom: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            project_path: None,
            start_level: Some("Level_0".to_owned()),
            tile_size: 16.0,
            camera_zoom: 1.0,
        }
    }
}

impl From<&Tunables> for LevelConfig {
    fn from(tunables: &Tunables) -> Self {
        Self {
            project_path: tunables.ldtk_project.clone(),
            ..Self::default()
        }
    }
}

fn uses_ldtk(config: Res<LevelConfig>) -> bool {
    config.project_path.is_some()
}

/// Mirror of the currently loaded level's metadata. Optional fields become `Some` once the level
/// source is known.
#[derive(Resource, Default)]
pub struct LevelAssets {
    pub project: Option<Handle<LdtkProject>>,
    pub project_path: Option<String>,
    pub level_identifier: Option<String>,
    pub level_iid: Option<String>,
    pub level_origin: Option<Vec2>,
    pub level_size: Option<Vec2>,
    pub level_center: Option<Vec2>,
    /// Where the player enters, taken from the level's player marker.
    pub player_spawn: Option<Vec2>,
}

/// Marker on the LDtk world entity.
#[derive(Component)]
pub struct LevelRoot;

/// Anything spawned for the current level that must go when the level reloads: factory output,
/// projectiles, built-in stage tiles.
#[derive(Component)]
pub struct LevelEntity;

pub const FALLBACK_IDENTIFIER: &str = "Builtin";

/// Used when the LDtk project is missing or fails to load.
pub const FALLBACK_STAGE: [&str; 12] = [
    "................................................",
    "................................................",
    "......................B.........................",
    "................................................",
    "..........o.............s.............E.........",
    ".........####..........####..........###........",
    "................................................",
    ".....e...............x.........m.........d.h..GG",
    "..P.........M..............B...........K......GG",
    "##########....#########^^^######################",
    "##########~~~~##################################",
    "################################################",
];

pub fn load_fallback_stage(number: u32, tile_size: f32) -> Result<StageLayout, LevelError> {
    parse_stage(number, tile_size, &FALLBACK_STAGE)
}

fn clear_level_entities(
    mut commands: Commands,
    entities: Query<Entity, Or<(With<LevelEntity>, With<LevelRoot>)>>,
    mut level_assets: ResMut<LevelAssets>,
) {
    for entity in &entities {
        commands.entity(entity).despawn_recursive();
    }
    *level_assets = LevelAssets::default();
}

fn spawn_ldtk_world(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<LevelConfig>,
    mut level_assets: ResMut<LevelAssets>,
    mut selection: ResMut<LevelSelection>,
) {
    let Some(path) = config.project_path.clone() else {
        return;
    };

    let project_handle: Handle<LdtkProject> = asset_server.load(path.clone());
    level_assets.project = Some(project_handle.clone());
    level_assets.project_path = Some(path);

    *selection = config
        .start_level
        .as_ref()
        .map(|label| LevelSelection::Identifier(label.clone()))
        .unwrap_or_else(|| LevelSelection::index(0));

    commands.spawn((
        LevelRoot,
        Name::new("LevelRoot"),
        LdtkWorldBundle {
            ldtk_handle: project_handle,
            ..default()
        },
    ));
}

#[allow(clippy::too_many_arguments)]
fn enter_builtin_stage(
    mut commands: Commands,
    config: Res<LevelConfig>,
    context: Res<GameContext>,
    mut level_assets: ResMut<LevelAssets>,
    mut tree: ResMut<LevelTree>,
    mut requests: EventWriter<SpawnRequest>,
    mut log: ResMut<PatternLog>,
    mut next_state: ResMut<NextState<GameState>>,
    mut exit: EventWriter<AppExit>,
) {
    let installed = install_builtin_stage(
        &mut commands,
        &config,
        &context,
        &mut level_assets,
        &mut tree,
        &mut requests,
        &mut log,
    );
    start_or_exit(installed, &mut log, &mut next_state, &mut exit);
}

fn install_builtin_stage(
    commands: &mut Commands,
    config: &LevelConfig,
    context: &GameContext,
    level_assets: &mut LevelAssets,
    tree: &mut LevelTree,
    requests: &mut EventWriter<SpawnRequest>,
    log: &mut PatternLog,
) -> Result<(), LevelError> {
    let layout = load_fallback_stage(context.current_level.number, config.tile_size)?;
    install_stage(commands, layout, level_assets, tree, requests, log);
    Ok(())
}

/// A built-in stage that fails to parse ends the app.
fn start_or_exit(
    installed: Result<(), LevelError>,
    log: &mut PatternLog,
    next_state: &mut NextState<GameState>,
    exit: &mut EventWriter<AppExit>,
) {
    match installed {
        Ok(()) => next_state.set(GameState::Playing),
        Err(err) => {
            log.record(LogCategory::Error, format!("Built-in stage is invalid: {err}"));
            exit.send(AppExit::error());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn monitor_level_loading(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut level_assets: ResMut<LevelAssets>,
    projects: Res<Assets<LdtkProject>>,
    config: Res<LevelConfig>,
    context: Res<GameContext>,
    mut tree: ResMut<LevelTree>,
    mut requests: EventWriter<SpawnRequest>,
    mut log: ResMut<PatternLog>,
    mut next_state: ResMut<NextState<GameState>>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(project_handle) = level_assets.project.as_ref() else {
        return;
    };

    match asset_server.get_load_state(project_handle.id()) {
        Some(LoadState::Loaded) => {
            if let Some(project) = projects.get(project_handle) {
                let level_data = config
                    .start_level
                    .as_ref()
                    .and_then(|identifier| {
                        project
                            .json_data()
                            .levels
                            .iter()
                            .find(|level| &level.identifier == identifier)
                    })
                    .or_else(|| project.json_data().levels.first());

                if let Some(level) = level_data {
                    let origin = ldtk_pixel_coords_to_translation(
                        IVec2::new(level.world_x, level.world_y + level.px_hei),
                        0,
                    );
                    let size = Vec2::new(level.px_wid as f32, level.px_hei as f32);

                    level_assets.level_identifier = Some(level.identifier.clone());
                    level_assets.level_iid = Some(level.iid.clone());
                    level_assets.level_origin = Some(origin);
                    level_assets.level_size = Some(size);
                    level_assets.level_center = Some(origin + size * 0.5);
                }
            }

            next_state.set(GameState::Playing);
        }
        Some(LoadState::Failed(_)) => {
            let path = level_assets.project_path.clone().unwrap_or_default();
            warn!("Unable to load LDtk project at '{path}'; using the built-in stage.");

            let installed = install_builtin_stage(
                &mut commands,
                &config,
                &context,
                &mut level_assets,
                &mut tree,
                &mut requests,
                &mut log,
            );
            start_or_exit(installed, &mut log, &mut next_state, &mut exit);
        }
        _ => {}
    }
}

/// Makes `layout` the active level: its tree becomes the `LevelTree` resource, its tiles get
/// placeholder sprites and its spawn glyphs become factory requests.
pub fn install_stage(
    commands: &mut Commands,
    layout: StageLayout,
    level_assets: &mut LevelAssets,
    tree: &mut LevelTree,
    requests: &mut EventWriter<SpawnRequest>,
    log: &mut PatternLog,
) {
    let StageLayout {
        tree: stage,
        size: cells,
        spawns,
        player_spawn,
    } = layout;

    let tile = stage.tile_size;
    let size = cells.as_vec2() * tile;

    level_assets.level_identifier = Some(FALLBACK_IDENTIFIER.to_owned());
    level_assets.level_iid = None;
    level_assets.level_origin = Some(stage.origin);
    level_assets.level_size = Some(size);
    level_assets.level_center = Some(stage.origin + size * 0.5);
    level_assets.player_spawn = player_spawn.map(|cell| {
        let floor = stage.grid_to_world(cell).y - tile.y * 0.5;
        Vec2::new(stage.grid_to_world(cell).x, floor + COLLIDER_SIZE.y * 0.5 + SKIN)
    });

    for tile_data in stage.zones().flat_map(|(zone, _)| stage.tiles(zone)) {
        commands.spawn((
            Name::new("StageTile"),
            LevelEntity,
            SpriteBundle {
                sprite: Sprite {
                    color: tile_color(tile_data.kind),
                    custom_size: Some(tile),
                    ..default()
                },
                transform: Transform::from_translation(
                    stage.grid_to_world(tile_data.coords).extend(0.0),
                ),
                ..default()
            },
        ));
    }

    for (tag, cell) in spawns {
        requests.send(SpawnRequest {
            tag: tag.to_owned(),
            position: stage.grid_to_world(cell),
        });
    }

    log_assembly(&stage, log);
    *tree = stage;
}

fn tile_color(kind: TileKind) -> Color {
    match kind {
        TileKind::Solid => Color::srgb(0.35, 0.38, 0.5),
        TileKind::Background => Color::srgb(0.12, 0.13, 0.2),
        TileKind::Hazard => Color::srgb(0.85, 0.25, 0.25),
        TileKind::Goal => Color::srgb(0.3, 0.9, 0.6),
    }
}

/// Zooms so the level's full height fits the window; the camera then scrolls horizontally.
pub fn sync_level_spatial(
    level_assets: Res<LevelAssets>,
    config: Res<LevelConfig>,
    mut projections: Query<&mut OrthographicProjection, With<Camera2d>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if !level_assets.is_changed() {
        return;
    }

    let Some(size) = level_assets.level_size else {
        return;
    };
    let (Ok(mut projection), Ok(window)) = (projections.get_single_mut(), windows.get_single())
    else {
        return;
    };

    let window_height = window.resolution.height();
    if window_height > 0.0 {
        projection.scale = (size.y / window_height * config.camera_zoom).max(0.0001);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::level_tree::{ZONE_GOAL, ZONE_HAZARDS};

    #[test]
    fn built_in_stage_is_the_default_source() {
        let mut world = World::new();
        world.insert_resource(LevelConfig::default());
        assert!(!world.run_system_once(uses_ldtk));

        let tunables = Tunables {
            ldtk_project: Some("levels/custom.ldtk".to_owned()),
            ..Tunables::default()
        };
        world.insert_resource(LevelConfig::from(&tunables));
        assert!(world.run_system_once(uses_ldtk));
    }

    #[test]
    fn entering_the_built_in_stage_starts_play() {
        let mut world = World::new();
        world.insert_resource(LevelConfig::default());
        world.init_resource::<GameContext>();
        world.init_resource::<LevelAssets>();
        world.init_resource::<LevelTree>();
        world.init_resource::<Events<SpawnRequest>>();
        world.init_resource::<Events<AppExit>>();
        world.init_resource::<PatternLog>();
        world.init_resource::<NextState<GameState>>();

        world.run_system_once(enter_builtin_stage);

        assert!(matches!(
            *world.resource::<NextState<GameState>>(),
            NextState::Pending(GameState::Playing)
        ));
        let assets = world.resource::<LevelAssets>();
        assert_eq!(assets.level_identifier.as_deref(), Some(FALLBACK_IDENTIFIER));
        assert!(assets.project.is_none());
        assert!(assets.player_spawn.is_some());
        assert!(world.resource::<LevelTree>().tile_count() > 0);
        assert!(!world.resource::<Events<SpawnRequest>>().is_empty());
        assert!(world.resource::<Events<AppExit>>().is_empty());
    }

    #[test]
    fn builtin_stage_parses() {
        let layout = load_fallback_stage(1, 16.0).expect("built-in stage must parse");
        assert!(layout.player_spawn.is_some());
        assert!(layout.spawns.iter().any(|(tag, _)| *tag == "gutsman"));

        let tree = &layout.tree;
        assert_eq!(tree.zones().count(), 4);
        let goal = tree.zone_by_name(ZONE_GOAL).unwrap();
        assert_eq!(tree.tiles(goal).count(), 4);
        let hazards = tree.zone_by_name(ZONE_HAZARDS).unwrap();
        assert_eq!(tree.tiles(hazards).count(), 3);
    }

    #[test]
    fn installing_a_stage_updates_tree_assets_and_requests() {
        let mut world = World::new();
        world.init_resource::<Events<SpawnRequest>>();
        world.init_resource::<PatternLog>();
        world.init_resource::<LevelAssets>();
        world.init_resource::<LevelTree>();

        world.run_system_once(
            |mut commands: Commands,
             mut assets: ResMut<LevelAssets>,
             mut tree: ResMut<LevelTree>,
             mut requests: EventWriter<SpawnRequest>,
             mut log: ResMut<PatternLog>| {
                let layout = parse_stage(2, 16.0, &["..M.", "P..G", "####"]).unwrap();
                install_stage(&mut commands, layout, &mut assets, &mut tree, &mut requests, &mut log);
            },
        );

        let tree = world.resource::<LevelTree>();
        assert_eq!(tree.number(), 2);
        assert!(tree.is_goal(IVec2::new(3, 1)));

        let assets = world.resource::<LevelAssets>();
        assert_eq!(assets.level_size, Some(Vec2::new(64.0, 48.0)));
        let spawn = assets.player_spawn.unwrap();
        assert_eq!(spawn.x, 8.0);
        assert_eq!(spawn.y, 16.0 + COLLIDER_SIZE.y * 0.5 + SKIN);
        assert!(world
            .resource::<LevelTree>()
            .grounded(spawn, COLLIDER_SIZE * 0.5));

        let requests: Vec<_> = world
            .resource::<Events<SpawnRequest>>()
            .iter_current_update_events()
            .map(|request| request.tag.clone())
            .collect();
        assert_eq!(requests, vec!["metall".to_owned()]);

        assert_eq!(world.query::<&LevelEntity>().iter(&world).count(), 5);
        assert!(world.resource::<PatternLog>().count(LogCategory::Composite) >= 5);
    }
}
