//! Projectiles, contact damage, pickups and level hazards. Everything that can end with the player
//! hurt, healed, powered up, respawned or through the goal runs here, in the effects set, after
//! movement has settled for the frame.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Tunables;
use crate::context::GameContext;
use crate::enemies::{Enemy, EnemyBrain};
use crate::events::GameEvent;
use crate::factory::{spawn_blueprint, EntityFactory, ItemKind};
use crate::level::{LevelAssets, LevelEntity};
use crate::level_tree::{LevelTree, TileKind};
use crate::movement::{Collider, Velocity};
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player::{spawn_point, Health, Invincibility, Player, ShotClock};
use crate::player_state::PlayerState;
use crate::powerups::{Capabilities, CapabilityStack, PowerUp, PowerUpTimers};
use crate::state::{GameSet, GameState};

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DropRng(StdRng::from_entropy()))
            .add_systems(
                Update,
                (
                    move_projectiles.in_set(GameSet::Movement),
                    (
                        player_shots_hit_enemies,
                        enemies_hit_player,
                        collect_pickups,
                        check_level_tiles,
                        resolve_player_death,
                    )
                        .chain()
                        .in_set(GameSet::Effects),
                ),
            );
    }
}

/// Random source for item drops. Tests insert a seeded generator.
#[derive(Resource)]
pub struct DropRng(pub StdRng);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub side: Side,
    pub velocity: Vec2,
    pub damage: i32,
    pub lifetime: f32,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Pickup {
    pub kind: ItemKind,
    pub value: u64,
}

pub const CONTACT_DAMAGE: i32 = 3;
/// How far below the lowest tile row the player may fall before losing a life.
pub const FALL_MARGIN: f32 = 64.0;
const VOLLEY_SPREAD: f32 = 60.0;
const VOLLEY_STAGGER: f32 = 4.0;

pub fn overlaps(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2) -> bool {
    let gap = (a - b).abs();
    gap.x < a_half.x + b_half.x && gap.y < a_half.y + b_half.y
}

/// Damage after armour. A hit always costs at least one point.
pub fn mitigated_damage(damage: i32, defense: i32) -> i32 {
    (damage - defense).max(1)
}

/// One bullet per `shot_count`, fanned vertically around the muzzle.
pub fn player_volley(
    origin: Vec2,
    facing: f32,
    caps: &Capabilities,
    speed: f32,
    lifetime: f32,
) -> Vec<(Projectile, Vec2)> {
    let count = caps.shot_count.max(1);
    let middle = (count - 1) as f32 * 0.5;

    (0..count)
        .map(|index| {
            let lane = index as f32 - middle;
            let projectile = Projectile {
                side: Side::Player,
                velocity: Vec2::new(speed * facing, lane * VOLLEY_SPREAD),
                damage: caps.shot_damage(),
                lifetime,
            };
            (projectile, origin + Vec2::new(0.0, lane * VOLLEY_STAGGER))
        })
        .collect()
}

pub fn spawn_projectile(commands: &mut Commands, projectile: Projectile, position: Vec2) -> Entity {
    let (size, color) = match projectile.side {
        Side::Player => (Vec2::new(6.0, 4.0), Color::srgb(1.0, 0.95, 0.4)),
        Side::Enemy => (Vec2::splat(6.0), Color::srgb(1.0, 0.45, 0.3)),
    };

    commands
        .spawn((
            Name::new("Projectile"),
            LevelEntity,
            Collider::from_size(size),
            SpriteBundle {
                sprite: Sprite {
                    color,
                    custom_size: Some(size),
                    ..default()
                },
                transform: Transform::from_translation(position.extend(3.0)),
                ..default()
            },
            projectile,
        ))
        .id()
}

fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    level: Res<LevelTree>,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut projectile, mut transform) in &mut projectiles {
        projectile.lifetime -= dt;
        transform.translation += (projectile.velocity * dt).extend(0.0);

        let cell = level.world_to_grid(transform.translation.truncate());
        if projectile.lifetime <= 0.0 || level.is_solid(cell) {
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn player_shots_hit_enemies(
    mut commands: Commands,
    mut rng: ResMut<DropRng>,
    factory: Res<EntityFactory>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    projectiles: Query<(Entity, &Projectile, &Transform, &Collider)>,
    mut enemies: Query<(Entity, &mut Enemy, &EnemyBrain, &Transform, &Collider), Without<Projectile>>,
) {
    for (shot, projectile, shot_transform, shot_collider) in &projectiles {
        if projectile.side != Side::Player {
            continue;
        }
        let shot_position = shot_transform.translation.truncate();

        for (entity, mut enemy, brain, transform, collider) in &mut enemies {
            let position = transform.translation.truncate();
            if enemy.health <= 0
                || !overlaps(
                    shot_position,
                    shot_collider.half_extents,
                    position,
                    collider.half_extents,
                )
            {
                continue;
            }

            commands.entity(shot).despawn_recursive();
            if brain.is_guarding() {
                break;
            }

            if enemy.take_hit(projectile.damage) {
                commands.entity(entity).despawn_recursive();
                events.send(GameEvent::EnemyDefeated {
                    enemy: enemy.kind,
                    points: enemy.points,
                });

                if let Some(blueprint) = factory.drop_random_item(&mut rng.0, position) {
                    spawn_blueprint(&mut commands, &blueprint);
                    log.record(
                        LogCategory::Factory,
                        format!("{} dropped {}", enemy.kind.name(), blueprint.kind.name()),
                    );
                }
            }
            break;
        }
    }
}

fn enemies_hit_player(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut events: EventWriter<GameEvent>,
    mut player: Query<
        (&Transform, &Collider, &CapabilityStack, &mut Health, &mut Invincibility),
        With<Player>,
    >,
    enemies: Query<(&Transform, &Collider), (With<Enemy>, Without<Player>)>,
    projectiles: Query<(Entity, &Projectile, &Transform, &Collider), Without<Player>>,
) {
    let Ok((transform, collider, stack, mut health, mut invincibility)) = player.get_single_mut()
    else {
        return;
    };
    if invincibility.active() || health.current <= 0 {
        return;
    }

    let position = transform.translation.truncate();
    let mut incoming = enemies
        .iter()
        .any(|(enemy, enemy_collider)| {
            overlaps(
                position,
                collider.half_extents,
                enemy.translation.truncate(),
                enemy_collider.half_extents,
            )
        })
        .then_some(CONTACT_DAMAGE);

    for (entity, projectile, shot, shot_collider) in &projectiles {
        if projectile.side == Side::Enemy
            && overlaps(
                position,
                collider.half_extents,
                shot.translation.truncate(),
                shot_collider.half_extents,
            )
        {
            commands.entity(entity).despawn_recursive();
            incoming = incoming.max(Some(projectile.damage));
        }
    }

    let Some(raw) = incoming else {
        return;
    };

    let dealt = mitigated_damage(raw, stack.effective().defense);
    health.take(dealt);
    invincibility.remaining = tunables.invincibility_secs;
    events.send(GameEvent::PlayerHit { damage: dealt });
}

fn collect_pickups(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    mut player: Query<
        (
            &Transform,
            &Collider,
            &mut CapabilityStack,
            &mut PowerUpTimers,
            &mut Health,
        ),
        With<Player>,
    >,
    pickups: Query<(Entity, &Pickup, &Transform, &Collider), Without<Player>>,
) {
    let Ok((transform, collider, mut stack, mut timers, mut health)) = player.get_single_mut() else {
        return;
    };
    let position = transform.translation.truncate();

    for (entity, pickup, pickup_transform, pickup_collider) in &pickups {
        if !overlaps(
            position,
            collider.half_extents,
            pickup_transform.translation.truncate(),
            pickup_collider.half_extents,
        ) {
            continue;
        }

        commands.entity(entity).despawn_recursive();

        match pickup.kind {
            ItemKind::LifeEnergy | ItemKind::BigLifeEnergy => {
                let max_health = stack.effective().max_health;
                health.heal(pickup.value as i32, max_health);
            }
            ItemKind::PowerUp(kind) => {
                let layer = PowerUp::standard(kind);
                stack.add(layer);
                timers.start(kind, tunables.power_up_secs);
                log.record(
                    LogCategory::Decorator,
                    format!(
                        "Added {layer}, stack now holds {} layer(s)",
                        stack.layers().len()
                    ),
                );
                events.send(GameEvent::PowerUpChanged { kind, added: true });
            }
            ItemKind::ScoreBall => {}
        }

        events.send(GameEvent::ItemCollected {
            item: pickup.kind,
            value: pickup.value,
        });
    }
}

fn check_level_tiles(
    level: Res<LevelTree>,
    mut context: ResMut<GameContext>,
    mut next_state: ResMut<NextState<GameState>>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    mut player: Query<(&Transform, &Collider, &CapabilityStack, &mut Health), With<Player>>,
) {
    let Ok((transform, collider, stack, mut health)) = player.get_single_mut() else {
        return;
    };
    if health.current <= 0 {
        return;
    }

    let position = transform.translation.truncate();
    let half = collider.half_extents;

    if level.touches(position, half, TileKind::Hazard) {
        health.current = 0;
        log.record(LogCategory::Info, "Player touched a hazard");
        return;
    }

    if level
        .floor_limit()
        .is_some_and(|floor| position.y < floor - FALL_MARGIN)
    {
        health.current = 0;
        log.record(LogCategory::Info, "Player fell out of the level");
        return;
    }

    if level.touches(position, half, TileKind::Goal) && !context.level_complete {
        context.level_complete = true;
        let full_health = health.current >= stack.effective().max_health;
        events.send(GameEvent::LevelComplete {
            level: context.current_level.number,
            full_health,
        });
        log.record(
            LogCategory::Info,
            format!("Level {} complete", context.current_level.number),
        );
        next_state.set(GameState::StageClear);
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn resolve_player_death(
    tunables: Res<Tunables>,
    level_assets: Res<LevelAssets>,
    mut context: ResMut<GameContext>,
    mut next_state: ResMut<NextState<GameState>>,
    mut log: ResMut<PatternLog>,
    mut events: EventWriter<GameEvent>,
    mut player: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut PlayerState,
            &mut CapabilityStack,
            &mut PowerUpTimers,
            &mut Health,
            &mut Invincibility,
            &mut ShotClock,
        ),
        With<Player>,
    >,
) {
    let Ok((
        mut transform,
        mut velocity,
        mut state,
        mut stack,
        mut timers,
        mut health,
        mut invincibility,
        mut clock,
    )) = player.get_single_mut()
    else {
        return;
    };
    if health.current > 0 {
        return;
    }

    let remaining = context.lose_life();
    log.record(
        LogCategory::Info,
        format!("Player lost a life, {remaining} remaining"),
    );

    if context.game_over {
        log.record(
            LogCategory::Info,
            format!("Game over, final score {}", context.formatted_score()),
        );
        next_state.set(GameState::GameOver);
        return;
    }

    let spawn = spawn_point(&level_assets);
    transform.translation.x = spawn.x;
    transform.translation.y = spawn.y;
    **velocity = Vec2::ZERO;

    if *state != PlayerState::Idle {
        log.record(
            LogCategory::State,
            format!("Player: {} -> {}", state.label(), PlayerState::Idle.label()),
        );
        events.send(GameEvent::PlayerStateChanged {
            from: *state,
            to: PlayerState::Idle,
        });
        *state = PlayerState::Idle;
    }

    while let Some(kind) = stack.layers().last().map(PowerUp::kind) {
        let Some(layer) = stack.remove(kind) else {
            break;
        };
        log.record(
            LogCategory::Decorator,
            format!(
                "Removed {layer} on respawn, stack now holds {} layer(s)",
                stack.layers().len()
            ),
        );
        events.send(GameEvent::PowerUpChanged { kind, added: false });
    }
    timers.clear();

    health.current = stack.effective().max_health;
    invincibility.remaining = tunables.invincibility_secs;
    clock.reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::factory::EnemyKind;
    use crate::powerups::PowerUpKind;

    fn player_world() -> (World, Entity) {
        let mut world = World::new();
        world.init_resource::<Events<GameEvent>>();
        world.init_resource::<PatternLog>();
        world.init_resource::<GameContext>();
        world.init_resource::<LevelAssets>();
        world.init_resource::<NextState<GameState>>();
        world.insert_resource(Tunables::default());
        world.insert_resource(EntityFactory::default());
        world.insert_resource(DropRng(StdRng::seed_from_u64(7)));

        let player = world
            .spawn((
                Player,
                Transform::default(),
                Collider::from_size(Vec2::splat(16.0)),
                Velocity::default(),
                PlayerState::default(),
                CapabilityStack::default(),
                PowerUpTimers::default(),
                Health::full(&Capabilities::default()),
                Invincibility::default(),
                ShotClock::new(0.25),
            ))
            .id();
        (world, player)
    }

    fn sent_events(world: &World) -> Vec<GameEvent> {
        world
            .resource::<Events<GameEvent>>()
            .iter_current_update_events()
            .cloned()
            .collect()
    }

    #[test]
    fn boxes_overlap_only_when_both_axes_do() {
        let half = Vec2::splat(4.0);
        assert!(overlaps(Vec2::ZERO, half, Vec2::new(7.0, 7.0), half));
        assert!(!overlaps(Vec2::ZERO, half, Vec2::new(8.0, 0.0), half));
        assert!(!overlaps(Vec2::ZERO, half, Vec2::new(0.0, 9.0), half));
    }

    #[test]
    fn defense_never_cancels_a_hit() {
        assert_eq!(mitigated_damage(3, 0), 3);
        assert_eq!(mitigated_damage(3, 2), 1);
        assert_eq!(mitigated_damage(3, 10), 1);
    }

    #[test]
    fn volley_size_follows_shot_count() {
        let caps = Capabilities {
            shot_count: 3,
            strength: 2.0,
            ..Capabilities::default()
        };
        let volley = player_volley(Vec2::ZERO, -1.0, &caps, 400.0, 1.0);
        assert_eq!(volley.len(), 3);
        assert!(volley.iter().all(|(shot, _)| shot.velocity.x == -400.0));
        assert!(volley.iter().all(|(shot, _)| shot.damage == 2));
        let lanes: Vec<f32> = volley.iter().map(|(shot, _)| shot.velocity.y).collect();
        assert_eq!(lanes, vec![-60.0, 0.0, 60.0]);
    }

    #[test]
    fn power_up_pickup_adds_a_layer_and_timer() {
        let (mut world, player) = player_world();
        world.spawn((
            Pickup {
                kind: ItemKind::PowerUp(PowerUpKind::SpeedBoost),
                value: 0,
            },
            Transform::from_xyz(4.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(10.0)),
        ));

        world.run_system_once(collect_pickups);

        let stack = world.get::<CapabilityStack>(player).unwrap();
        assert_eq!(stack.count(PowerUpKind::SpeedBoost), 1);
        assert_eq!(stack.effective().speed, 300.0);
        assert!(world
            .get::<PowerUpTimers>(player)
            .unwrap()
            .remaining(PowerUpKind::SpeedBoost)
            .is_some());
        assert_eq!(world.query::<&Pickup>().iter(&world).count(), 0);
        assert_eq!(world.resource::<PatternLog>().count(LogCategory::Decorator), 1);
        assert!(sent_events(&world).contains(&GameEvent::PowerUpChanged {
            kind: PowerUpKind::SpeedBoost,
            added: true,
        }));
    }

    #[test]
    fn healing_is_capped_by_effective_max_health() {
        let (mut world, player) = player_world();
        world.get_mut::<Health>(player).unwrap().current = 20;
        world.spawn((
            Pickup {
                kind: ItemKind::BigLifeEnergy,
                value: 10,
            },
            Transform::default(),
            Collider::from_size(Vec2::splat(12.0)),
        ));

        world.run_system_once(collect_pickups);

        assert_eq!(world.get::<Health>(player).unwrap().current, 28);
    }

    #[test]
    fn defense_reduces_contact_damage() {
        let (mut world, player) = player_world();
        world
            .get_mut::<CapabilityStack>(player)
            .unwrap()
            .add(PowerUp::standard(PowerUpKind::DefenseBoost));
        world.spawn((
            Enemy {
                kind: EnemyKind::Blader,
                health: 1,
                points: 500,
            },
            Transform::from_xyz(6.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(14.0)),
        ));

        world.run_system_once(enemies_hit_player);

        assert_eq!(world.get::<Health>(player).unwrap().current, 27);
        assert!(world.get::<Invincibility>(player).unwrap().active());
        assert_eq!(sent_events(&world), vec![GameEvent::PlayerHit { damage: 1 }]);
    }

    #[test]
    fn player_shot_defeats_an_enemy() {
        let (mut world, _) = player_world();
        world.spawn((
            Enemy {
                kind: EnemyKind::Blader,
                health: 1,
                points: 500,
            },
            EnemyBrain::for_kind(EnemyKind::Blader, Vec2::new(100.0, 0.0)),
            Transform::from_xyz(100.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(14.0)),
        ));
        world.spawn((
            Projectile {
                side: Side::Player,
                velocity: Vec2::X,
                damage: 1,
                lifetime: 1.0,
            },
            Transform::from_xyz(96.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(6.0)),
        ));

        world.run_system_once(player_shots_hit_enemies);

        assert_eq!(world.query::<&Enemy>().iter(&world).count(), 0);
        assert_eq!(world.query::<&Projectile>().iter(&world).count(), 0);
        assert_eq!(
            sent_events(&world),
            vec![GameEvent::EnemyDefeated {
                enemy: EnemyKind::Blader,
                points: 500,
            }]
        );
    }

    #[test]
    fn guarding_turret_deflects_shots() {
        let (mut world, _) = player_world();
        world.spawn((
            Enemy {
                kind: EnemyKind::Metall,
                health: 1,
                points: 500,
            },
            EnemyBrain::for_kind(EnemyKind::Metall, Vec2::ZERO),
            Transform::from_xyz(100.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(14.0)),
        ));
        world.spawn((
            Projectile {
                side: Side::Player,
                velocity: Vec2::X,
                damage: 1,
                lifetime: 1.0,
            },
            Transform::from_xyz(96.0, 0.0, 0.0),
            Collider::from_size(Vec2::splat(6.0)),
        ));

        world.run_system_once(player_shots_hit_enemies);

        assert_eq!(world.query::<&Enemy>().iter(&world).count(), 1);
        assert_eq!(world.query::<&Projectile>().iter(&world).count(), 0);
        assert!(sent_events(&world).is_empty());
    }

    #[test]
    fn death_respawns_in_idle_with_an_empty_stack() {
        let (mut world, player) = player_world();
        {
            let mut entity = world.entity_mut(player);
            entity.get_mut::<Health>().unwrap().current = 0;
            *entity.get_mut::<PlayerState>().unwrap() = PlayerState::JumpShooting;
            let mut stack = entity.get_mut::<CapabilityStack>().unwrap();
            stack.add(PowerUp::standard(PowerUpKind::SpeedBoost));
            stack.add(PowerUp::standard(PowerUpKind::MultiShot));
        }

        world.run_system_once(resolve_player_death);

        assert_eq!(world.resource::<GameContext>().lives, 2);
        assert_eq!(*world.get::<PlayerState>(player).unwrap(), PlayerState::Idle);
        assert!(world.get::<CapabilityStack>(player).unwrap().is_empty());
        assert_eq!(world.get::<Health>(player).unwrap().current, 28);
        let log = world.resource::<PatternLog>();
        assert_eq!(log.count(LogCategory::State), 1);
        assert_eq!(log.count(LogCategory::Decorator), 2);

        let removals: Vec<GameEvent> = sent_events(&world)
            .into_iter()
            .filter(|event| matches!(event, GameEvent::PowerUpChanged { .. }))
            .collect();
        assert_eq!(
            removals,
            vec![
                GameEvent::PowerUpChanged {
                    kind: PowerUpKind::MultiShot,
                    added: false,
                },
                GameEvent::PowerUpChanged {
                    kind: PowerUpKind::SpeedBoost,
                    added: false,
                },
            ]
        );
    }

    /// Floor along row 0 with a spike at (1, 1) and the goal at (3, 1).
    fn tile_world(position: Vec2) -> (World, Entity) {
        let (mut world, player) = player_world();
        world.insert_resource(LevelTree::assemble(
            1,
            Vec2::splat(16.0),
            Vec2::ZERO,
            [
                (IVec2::new(0, 0), TileKind::Solid),
                (IVec2::new(1, 0), TileKind::Solid),
                (IVec2::new(2, 0), TileKind::Solid),
                (IVec2::new(3, 0), TileKind::Solid),
                (IVec2::new(1, 1), TileKind::Hazard),
                (IVec2::new(3, 1), TileKind::Goal),
            ],
        ));
        world.get_mut::<Transform>(player).unwrap().translation = position.extend(0.0);
        (world, player)
    }

    fn level_completions(world: &World) -> Vec<GameEvent> {
        sent_events(world)
            .into_iter()
            .filter(|event| matches!(event, GameEvent::LevelComplete { .. }))
            .collect()
    }

    #[test]
    fn spikes_drain_all_health() {
        let (mut world, player) = tile_world(Vec2::new(24.0, 24.0));

        world.run_system_once(check_level_tiles);

        assert_eq!(world.get::<Health>(player).unwrap().current, 0);
        assert!(!world.resource::<GameContext>().level_complete);
        assert_eq!(
            world.resource::<PatternLog>().last().map(|record| record.message.as_str()),
            Some("Player touched a hazard")
        );
    }

    #[test]
    fn falling_past_the_floor_drains_all_health() {
        let (mut world, player) = tile_world(Vec2::new(200.0, -FALL_MARGIN - 1.0));

        world.run_system_once(check_level_tiles);

        assert_eq!(world.get::<Health>(player).unwrap().current, 0);
        assert_eq!(
            world.resource::<PatternLog>().last().map(|record| record.message.as_str()),
            Some("Player fell out of the level")
        );
    }

    #[test]
    fn standing_in_open_air_changes_nothing() {
        let (mut world, player) = tile_world(Vec2::new(200.0, 24.0));

        world.run_system_once(check_level_tiles);

        assert_eq!(world.get::<Health>(player).unwrap().current, 28);
        assert!(sent_events(&world).is_empty());
        assert!(matches!(
            *world.resource::<NextState<GameState>>(),
            NextState::Unchanged
        ));
    }

    #[test]
    fn goal_at_full_health_completes_the_level_once() {
        let (mut world, _) = tile_world(Vec2::new(56.0, 24.0));

        world.run_system_once(check_level_tiles);
        world.run_system_once(check_level_tiles);

        assert!(world.resource::<GameContext>().level_complete);
        assert_eq!(
            level_completions(&world),
            vec![GameEvent::LevelComplete {
                level: 1,
                full_health: true,
            }]
        );
        assert!(matches!(
            *world.resource::<NextState<GameState>>(),
            NextState::Pending(GameState::StageClear)
        ));
    }

    #[test]
    fn goal_with_missing_health_is_not_perfect() {
        let (mut world, player) = tile_world(Vec2::new(56.0, 24.0));
        world.get_mut::<Health>(player).unwrap().current = 20;

        world.run_system_once(check_level_tiles);

        assert_eq!(
            level_completions(&world),
            vec![GameEvent::LevelComplete {
                level: 1,
                full_health: false,
            }]
        );
    }

    #[test]
    fn last_life_ends_the_run() {
        let (mut world, player) = player_world();
        world.resource_mut::<GameContext>().lives = 1;
        world.get_mut::<Health>(player).unwrap().current = 0;

        world.run_system_once(resolve_player_death);

        assert!(world.resource::<GameContext>().game_over);
        assert!(matches!(
            *world.resource::<NextState<GameState>>(),
            NextState::Pending(GameState::GameOver)
        ));
    }
}
