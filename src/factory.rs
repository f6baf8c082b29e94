//! Entity creation from type tags.
//!
//! Level sources (LDtk entity layers, the built-in ASCII stage, enemy drops) only know a tag and a
//! position. `EntityFactory::create` turns that into an `EntityBlueprint` of plain data; the spawn
//! system then materialises the blueprint as an ECS entity with the components its kind needs.

use std::str::FromStr;

use bevy::prelude::*;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::combat::Pickup;
use crate::config::Tunables;
use crate::enemies::{Enemy, EnemyBrain};
use crate::level::LevelEntity;
use crate::movement::Collider;
use crate::pattern_log::{LogCategory, PatternLog};
use crate::powerups::PowerUpKind;

pub struct FactoryPlugin;

impl Plugin for FactoryPlugin {
    fn build(&self, app: &mut App) {
        let factory = app
            .world()
            .get_resource::<Tunables>()
            .map(EntityFactory::from)
            .unwrap_or_default();

        app.insert_resource(factory)
            .add_event::<SpawnRequest>()
            .add_systems(Update, spawn_requested_entities);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnemyKind {
    Metall,
    Blader,
    Gutsman,
}

impl EnemyKind {
    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Metall => "Metall",
            EnemyKind::Blader => "Blader",
            EnemyKind::Gutsman => "Gutsman",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    LifeEnergy,
    BigLifeEnergy,
    ScoreBall,
    PowerUp(PowerUpKind),
}

impl ItemKind {
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::LifeEnergy => "LifeEnergy",
            ItemKind::BigLifeEnergy => "BigLifeEnergy",
            ItemKind::ScoreBall => "ScoreBall",
            ItemKind::PowerUp(kind) => kind.name(),
        }
    }

    pub fn heals(self) -> bool {
        matches!(self, ItemKind::LifeEnergy | ItemKind::BigLifeEnergy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Enemy(EnemyKind),
    Item(ItemKind),
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Enemy(kind) => kind.name(),
            EntityKind::Item(kind) => kind.name(),
        }
    }
}

impl FromStr for EntityKind {
    type Err = FactoryError;

    /// Accepts `snake_case` tags and LDtk-style `PascalCase` identifiers alike.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized: String = tag
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Ok(match normalized.as_str() {
            "metall" => EntityKind::Enemy(EnemyKind::Metall),
            "blader" => EntityKind::Enemy(EnemyKind::Blader),
            "gutsman" => EntityKind::Enemy(EnemyKind::Gutsman),
            "lifeenergy" => EntityKind::Item(ItemKind::LifeEnergy),
            "biglifeenergy" => EntityKind::Item(ItemKind::BigLifeEnergy),
            "scoreball" => EntityKind::Item(ItemKind::ScoreBall),
            "speedboost" => EntityKind::Item(ItemKind::PowerUp(PowerUpKind::SpeedBoost)),
            "strengthboost" => EntityKind::Item(ItemKind::PowerUp(PowerUpKind::StrengthBoost)),
            "defenseboost" => EntityKind::Item(ItemKind::PowerUp(PowerUpKind::DefenseBoost)),
            "healthboost" => EntityKind::Item(ItemKind::PowerUp(PowerUpKind::HealthBoost)),
            "multishot" => EntityKind::Item(ItemKind::PowerUp(PowerUpKind::MultiShot)),
            _ => return Err(FactoryError::UnknownEntityType(tag.to_owned())),
        })
    }
}

/// Everything needed to spawn one enemy or item.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBlueprint {
    pub kind: EntityKind,
    pub position: Vec2,
    pub size: Vec2,
    pub health: i32,
    /// Points for enemies and score balls, hit points for energy pickups, unused for power-ups.
    pub value: u64,
}

#[derive(Event, Debug, Clone)]
pub struct SpawnRequest {
    pub tag: String,
    pub position: Vec2,
}

#[derive(Resource, Debug, Clone)]
pub struct EntityFactory {
    pub enemy_kill_score: u64,
    pub boss_kill_score: u64,
    pub score_ball_points: u64,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::from(&Tunables::default())
    }
}

impl From<&Tunables> for EntityFactory {
    fn from(tunables: &Tunables) -> Self {
        Self {
            enemy_kill_score: tunables.enemy_kill_score,
            boss_kill_score: tunables.boss_kill_score,
            score_ball_points: tunables.score_ball_points,
        }
    }
}

pub const LIFE_ENERGY_HEAL: u64 = 2;
pub const BIG_LIFE_ENERGY_HEAL: u64 = 10;

impl EntityFactory {
    pub fn create(&self, tag: &str, position: Vec2) -> Result<EntityBlueprint, FactoryError> {
        let kind = tag.parse()?;
        Ok(self.blueprint(kind, position))
    }

    pub fn blueprint(&self, kind: EntityKind, position: Vec2) -> EntityBlueprint {
        let (size, health, value) = match kind {
            EntityKind::Enemy(EnemyKind::Metall) => (Vec2::splat(14.0), 1, self.enemy_kill_score),
            EntityKind::Enemy(EnemyKind::Blader) => (Vec2::new(14.0, 12.0), 1, self.enemy_kill_score),
            EntityKind::Enemy(EnemyKind::Gutsman) => (Vec2::new(28.0, 32.0), 14, self.boss_kill_score),
            EntityKind::Item(ItemKind::LifeEnergy) => (Vec2::splat(8.0), 0, LIFE_ENERGY_HEAL),
            EntityKind::Item(ItemKind::BigLifeEnergy) => (Vec2::splat(12.0), 0, BIG_LIFE_ENERGY_HEAL),
            EntityKind::Item(ItemKind::ScoreBall) => (Vec2::splat(8.0), 0, self.score_ball_points),
            EntityKind::Item(ItemKind::PowerUp(_)) => (Vec2::splat(10.0), 0, 0),
        };

        EntityBlueprint {
            kind,
            position,
            size,
            health,
            value,
        }
    }

    /// Rolls 1..=100 and converts the result with `drop_for_roll`.
    pub fn drop_random_item(&self, rng: &mut impl Rng, position: Vec2) -> Option<EntityBlueprint> {
        let roll = rng.gen_range(1..=100u8);
        drop_for_roll(roll).map(|item| self.blueprint(EntityKind::Item(item), position))
    }
}

pub const ITEM_DROP_CHANCE: u8 = 75;

/// Drop table for defeated enemies: 20% big energy, 30% small energy, 25% score ball.
pub fn drop_for_roll(roll: u8) -> Option<ItemKind> {
    match roll {
        0..=20 => Some(ItemKind::BigLifeEnergy),
        21..=50 => Some(ItemKind::LifeEnergy),
        51..=ITEM_DROP_CHANCE => Some(ItemKind::ScoreBall),
        _ => None,
    }
}

fn color_for(kind: EntityKind) -> Color {
    match kind {
        EntityKind::Enemy(EnemyKind::Metall) => Color::srgb(0.95, 0.8, 0.2),
        EntityKind::Enemy(EnemyKind::Blader) => Color::srgb(0.3, 0.85, 0.4),
        EntityKind::Enemy(EnemyKind::Gutsman) => Color::srgb(0.75, 0.45, 0.2),
        EntityKind::Item(ItemKind::LifeEnergy | ItemKind::BigLifeEnergy) => Color::srgb(0.9, 0.2, 0.3),
        EntityKind::Item(ItemKind::ScoreBall) => Color::srgb(0.4, 0.7, 1.0),
        EntityKind::Item(ItemKind::PowerUp(_)) => Color::srgb(0.85, 0.4, 0.95),
    }
}

/// Materialises `blueprint` as an entity tagged for removal when the level unloads.
pub fn spawn_blueprint(commands: &mut Commands, blueprint: &EntityBlueprint) -> Entity {
    let sprite = SpriteBundle {
        sprite: Sprite {
            color: color_for(blueprint.kind),
            custom_size: Some(blueprint.size),
            ..default()
        },
        transform: Transform::from_translation(blueprint.position.extend(2.0)),
        ..default()
    };

    let mut entity = commands.spawn((
        Name::new(blueprint.kind.name()),
        LevelEntity,
        Collider::from_size(blueprint.size),
        sprite,
    ));

    match blueprint.kind {
        EntityKind::Enemy(kind) => {
            entity.insert((
                Enemy {
                    kind,
                    health: blueprint.health,
                    points: blueprint.value,
                },
                EnemyBrain::for_kind(kind, blueprint.position),
            ));
        }
        EntityKind::Item(kind) => {
            entity.insert(Pickup {
                kind,
                value: blueprint.value,
            });
        }
    }

    entity.id()
}

fn spawn_requested_entities(
    mut commands: Commands,
    mut requests: EventReader<SpawnRequest>,
    factory: Res<EntityFactory>,
    mut log: ResMut<PatternLog>,
) {
    for request in requests.read() {
        match factory.create(&request.tag, request.position) {
            Ok(blueprint) => {
                spawn_blueprint(&mut commands, &blueprint);
                log.record(
                    LogCategory::Factory,
                    format!(
                        "Created {} at ({:.0}, {:.0})",
                        blueprint.kind.name(),
                        blueprint.position.x,
                        blueprint.position.y
                    ),
                );
            }
            Err(err) => log.record(LogCategory::Error, err.to_string()),
        }
    }
}
