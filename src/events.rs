//! Gameplay notifications.
//!
//! Systems publish a `GameEvent` through Bevy's typed event channel. Once per frame, after the
//! gameplay sets have run, `dispatch_game_events` looks up the listeners subscribed to each
//! event's kind on the `EventBus` and hands the event to each of them in subscription order.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::context::GameContext;
use crate::factory::{EnemyKind, ItemKind};
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player_state::PlayerState;
use crate::powerups::PowerUpKind;
use crate::state::GameSet;

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<EventBus>() {
            app.insert_resource(EventBus::with_default_subscriptions());
        }

        app.add_event::<GameEvent>()
            .init_resource::<Achievements>()
            .init_resource::<SoundQueue>()
            .add_systems(Update, dispatch_game_events.after(GameSet::Effects));
    }
}

#[derive(Event, Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    EnemyDefeated { enemy: EnemyKind, points: u64 },
    ItemCollected { item: ItemKind, value: u64 },
    PlayerHit { damage: i32 },
    LevelComplete { level: u32, full_health: bool },
    PlayerStateChanged { from: PlayerState, to: PlayerState },
    PowerUpChanged { kind: PowerUpKind, added: bool },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::EnemyDefeated { .. } => EventKind::EnemyDefeated,
            GameEvent::ItemCollected { .. } => EventKind::ItemCollected,
            GameEvent::PlayerHit { .. } => EventKind::PlayerHit,
            GameEvent::LevelComplete { .. } => EventKind::LevelComplete,
            GameEvent::PlayerStateChanged { .. } => EventKind::PlayerStateChanged,
            GameEvent::PowerUpChanged { .. } => EventKind::PowerUpChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    EnemyDefeated,
    ItemCollected,
    PlayerHit,
    LevelComplete,
    PlayerStateChanged,
    PowerUpChanged,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::EnemyDefeated => "EnemyDefeated",
            EventKind::ItemCollected => "ItemCollected",
            EventKind::PlayerHit => "PlayerHit",
            EventKind::LevelComplete => "LevelComplete",
            EventKind::PlayerStateChanged => "PlayerStateChanged",
            EventKind::PowerUpChanged => "PowerUpChanged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Score,
    Health,
    Sound,
    Achievement,
}

/// Subscription table keyed by event kind.
#[derive(Resource, Debug, Clone, Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<Listener>>,
}

impl EventBus {
    pub fn with_default_subscriptions() -> Self {
        let mut bus = Self::default();
        let table = [
            (
                EventKind::EnemyDefeated,
                &[Listener::Score, Listener::Sound, Listener::Achievement][..],
            ),
            (
                EventKind::ItemCollected,
                &[Listener::Score, Listener::Health, Listener::Sound][..],
            ),
            (EventKind::PlayerHit, &[Listener::Health, Listener::Sound][..]),
            (
                EventKind::LevelComplete,
                &[Listener::Achievement, Listener::Sound][..],
            ),
            (EventKind::PlayerStateChanged, &[Listener::Sound][..]),
            (EventKind::PowerUpChanged, &[Listener::Sound][..]),
        ];

        for (kind, listeners) in table {
            for listener in listeners {
                bus.subscribe(kind, *listener);
            }
        }
        bus
    }

    /// Returns `false` if `listener` was already subscribed to `kind`.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) -> bool {
        let listeners = self.subscribers.entry(kind).or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn unsubscribe(&mut self, kind: EventKind, listener: Listener) -> bool {
        let Some(listeners) = self.subscribers.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|existing| *existing != listener);
        listeners.len() != before
    }

    pub fn listeners(&self, kind: EventKind) -> &[Listener] {
        self.subscribers
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Achievement {
    FirstKill,
    TenKills,
    PerfectHealth,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstKill => "First Kill",
            Achievement::TenKills => "Ten Kills",
            Achievement::PerfectHealth => "Perfect Health",
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Achievements {
    unlocked: Vec<Achievement>,
}

impl Achievements {
    /// Returns `true` only the first time `achievement` is unlocked.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        if self.is_unlocked(achievement) {
            return false;
        }
        self.unlocked.push(achievement);
        true
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    pub fn unlocked(&self) -> &[Achievement] {
        &self.unlocked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Jump,
    Shoot,
    EnemyDefeated,
    Pickup,
    PowerUp,
    PowerDown,
    Hurt,
    LevelComplete,
}

/// Cues waiting for the audio plugin.
#[derive(Resource, Debug, Clone, Default)]
pub struct SoundQueue {
    pending: Vec<SoundCue>,
}

impl SoundQueue {
    pub fn push(&mut self, cue: SoundCue) {
        self.pending.push(cue);
    }

    pub fn pending(&self) -> &[SoundCue] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.pending)
    }
}

pub const TEN_KILLS: u32 = 10;

/// Mutable state a listener may touch while handling one event.
pub struct ListenerTargets<'a> {
    pub context: &'a mut GameContext,
    pub achievements: &'a mut Achievements,
    pub sounds: &'a mut SoundQueue,
    pub log: &'a mut PatternLog,
}

impl Listener {
    pub fn name(self) -> &'static str {
        match self {
            Listener::Score => "ScoreListener",
            Listener::Health => "HealthListener",
            Listener::Sound => "SoundListener",
            Listener::Achievement => "AchievementListener",
        }
    }

    pub fn notify(self, event: &GameEvent, targets: &mut ListenerTargets<'_>) {
        match self {
            Listener::Score => on_score(event, targets),
            Listener::Health => on_health(event, targets),
            Listener::Sound => {
                if let Some(cue) = sound_for(event) {
                    targets.sounds.push(cue);
                }
            }
            Listener::Achievement => on_achievement(event, targets),
        }
    }
}

fn on_score(event: &GameEvent, targets: &mut ListenerTargets<'_>) {
    match *event {
        GameEvent::EnemyDefeated { points, .. } => {
            targets.context.add_score(points);
            targets.context.record_enemy_defeated();
        }
        GameEvent::ItemCollected { item, value } => {
            if item == ItemKind::ScoreBall {
                targets.context.add_score(value);
            }
            targets.context.record_item_collected();
        }
        _ => {}
    }
}

fn on_health(event: &GameEvent, targets: &mut ListenerTargets<'_>) {
    match *event {
        GameEvent::PlayerHit { damage } => targets
            .log
            .record(LogCategory::Info, format!("Player took {damage} damage")),
        GameEvent::ItemCollected { item, value } if item.heals() => targets
            .log
            .record(LogCategory::Info, format!("Player healed by {value}")),
        _ => {}
    }
}

fn on_achievement(event: &GameEvent, targets: &mut ListenerTargets<'_>) {
    let earned: &[Achievement] = match *event {
        GameEvent::EnemyDefeated { .. } => {
            if targets.context.enemies_defeated >= TEN_KILLS {
                &[Achievement::FirstKill, Achievement::TenKills]
            } else {
                &[Achievement::FirstKill]
            }
        }
        GameEvent::LevelComplete {
            full_health: true, ..
        } => &[Achievement::PerfectHealth],
        _ => &[],
    };

    for achievement in earned {
        if targets.achievements.unlock(*achievement) {
            targets.log.record(
                LogCategory::Info,
                format!("Achievement unlocked: {}", achievement.title()),
            );
        }
    }
}

fn sound_for(event: &GameEvent) -> Option<SoundCue> {
    match *event {
        GameEvent::EnemyDefeated { .. } => Some(SoundCue::EnemyDefeated),
        GameEvent::ItemCollected { .. } => Some(SoundCue::Pickup),
        GameEvent::PlayerHit { .. } => Some(SoundCue::Hurt),
        GameEvent::LevelComplete { .. } => Some(SoundCue::LevelComplete),
        GameEvent::PlayerStateChanged { from, to } => {
            if to.is_airborne() && !from.is_airborne() {
                Some(SoundCue::Jump)
            } else if to.is_shooting() && !from.is_shooting() {
                Some(SoundCue::Shoot)
            } else {
                None
            }
        }
        GameEvent::PowerUpChanged { added: true, .. } => Some(SoundCue::PowerUp),
        GameEvent::PowerUpChanged { added: false, .. } => Some(SoundCue::PowerDown),
    }
}

pub fn dispatch_game_events(
    mut events: EventReader<GameEvent>,
    bus: Res<EventBus>,
    mut context: ResMut<GameContext>,
    mut achievements: ResMut<Achievements>,
    mut sounds: ResMut<SoundQueue>,
    mut log: ResMut<PatternLog>,
) {
    for event in events.read() {
        let listeners = bus.listeners(event.kind());
        let mut targets = ListenerTargets {
            context: &mut context,
            achievements: &mut achievements,
            sounds: &mut sounds,
            log: &mut log,
        };
        for listener in listeners {
            listener.notify(event, &mut targets);
        }

        log.record(
            LogCategory::Observer,
            format!(
                "Event {} notified to {} listener(s)",
                event.kind().name(),
                listeners.len()
            ),
        );
    }
}
