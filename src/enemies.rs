//! Enemy behaviour. Each kind gets a small brain that is stepped once per frame with the player's
//! position; the brains are plain structs so their timing can be tested without an app.

use bevy::prelude::*;

use crate::combat::{spawn_projectile, Projectile, Side};
use crate::factory::EnemyKind;
use crate::pattern_log::{LogCategory, PatternLog};
use crate::player::Player;
use crate::state::GameSet;

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, drive_enemies.in_set(GameSet::Movement));
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub health: i32,
    pub points: u64,
}

impl Enemy {
    /// Applies `damage` and reports whether this hit finished the enemy off.
    pub fn take_hit(&mut self, damage: i32) -> bool {
        let was_alive = self.health > 0;
        self.health -= damage.max(0);
        was_alive && self.health <= 0
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub enum EnemyBrain {
    Turret(Turret),
    Flier(Flier),
    Brute(Brute),
}

impl EnemyBrain {
    pub fn for_kind(kind: EnemyKind, spawn: Vec2) -> Self {
        match kind {
            EnemyKind::Metall => EnemyBrain::Turret(Turret::default()),
            EnemyKind::Blader => EnemyBrain::Flier(Flier::around(spawn)),
            EnemyKind::Gutsman => EnemyBrain::Brute(Brute::grounded_at(spawn.y)),
        }
    }

    /// Guarding enemies shrug off player shots.
    pub fn is_guarding(&self) -> bool {
        matches!(self, EnemyBrain::Turret(turret) if turret.guarding)
    }
}

/// Stationary shooter. Hides under its helmet while the player is out of range.
#[derive(Debug, Clone, PartialEq)]
pub struct Turret {
    pub guarding: bool,
    pub facing: f32,
    reload: f32,
}

impl Default for Turret {
    fn default() -> Self {
        Self {
            guarding: true,
            facing: -1.0,
            reload: 0.0,
        }
    }
}

impl Turret {
    pub const RANGE: f32 = 200.0;
    pub const FIRE_INTERVAL: f32 = 1.5;
    pub const SPREAD: [Vec2; 3] = [
        Vec2::new(120.0, 60.0),
        Vec2::new(120.0, 0.0),
        Vec2::new(120.0, -60.0),
    ];

    /// Returns `true` on frames where a volley should be fired.
    pub fn tick(&mut self, dt: f32, own: Vec2, player: Vec2) -> bool {
        let dx = player.x - own.x;
        self.facing = if dx > 0.0 { 1.0 } else { -1.0 };

        if own.distance(player) > Self::RANGE {
            self.guarding = true;
            return false;
        }

        self.guarding = false;
        self.reload -= dt;
        if self.reload <= 0.0 {
            self.reload = Self::FIRE_INTERVAL;
            return true;
        }
        false
    }

    pub fn volley(&self) -> impl Iterator<Item = Vec2> + '_ {
        Self::SPREAD
            .iter()
            .map(move |velocity| Vec2::new(velocity.x * self.facing, velocity.y))
    }
}

/// Patrols a box around its spawn point, bouncing off the edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Flier {
    pub origin: Vec2,
    pub velocity: Vec2,
    pub range: Vec2,
}

impl Flier {
    pub fn around(origin: Vec2) -> Self {
        Self {
            origin,
            velocity: Vec2::new(40.0, 20.0),
            range: Vec2::new(96.0, 32.0),
        }
    }

    pub fn step(&mut self, position: Vec2, dt: f32) -> Vec2 {
        let mut next = position + self.velocity * dt;
        let offset = next - self.origin;

        if offset.x.abs() >= self.range.x {
            self.velocity.x = -self.velocity.x;
            next.x = position.x;
        }
        if offset.y.abs() >= self.range.y {
            self.velocity.y = -self.velocity.y;
            next.y = position.y;
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrutePhase {
    Idle,
    Hop,
    Throw,
}

impl BrutePhase {
    pub fn label(self) -> &'static str {
        match self {
            BrutePhase::Idle => "IDLE",
            BrutePhase::Hop => "HOP",
            BrutePhase::Throw => "THROW",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BruteStep {
    pub position: Vec2,
    pub changed: Option<(BrutePhase, BrutePhase)>,
    /// Initial velocity of a rock thrown this frame.
    pub throw: Option<Vec2>,
}

/// Boss pattern: wait, then either hop toward a distant player or throw at a near one.
#[derive(Debug, Clone, PartialEq)]
pub struct Brute {
    pub phase: BrutePhase,
    timer: f32,
    velocity: Vec2,
    ground_y: f32,
}

impl Brute {
    pub const IDLE_SECS: f32 = 2.0;
    pub const THROW_SECS: f32 = 1.0;
    pub const ATTACK_RANGE: f32 = 160.0;
    pub const HOP_VELOCITY: Vec2 = Vec2::new(60.0, 260.0);
    pub const ROCK_VELOCITY: Vec2 = Vec2::new(150.0, 0.0);
    pub const GRAVITY: f32 = 600.0;

    pub fn grounded_at(ground_y: f32) -> Self {
        Self {
            phase: BrutePhase::Idle,
            timer: 0.0,
            velocity: Vec2::ZERO,
            ground_y,
        }
    }

    pub fn step(&mut self, position: Vec2, player: Vec2, dt: f32) -> BruteStep {
        let from = self.phase;
        let mut position = position;
        let mut throw = None;
        let toward = if player.x >= position.x { 1.0 } else { -1.0 };

        match self.phase {
            BrutePhase::Idle => {
                self.timer += dt;
                if self.timer >= Self::IDLE_SECS {
                    self.timer = 0.0;
                    if (player.x - position.x).abs() > Self::ATTACK_RANGE {
                        self.phase = BrutePhase::Hop;
                        self.velocity = Vec2::new(Self::HOP_VELOCITY.x * toward, Self::HOP_VELOCITY.y);
                    } else {
                        self.phase = BrutePhase::Throw;
                        throw = Some(Vec2::new(Self::ROCK_VELOCITY.x * toward, Self::ROCK_VELOCITY.y));
                    }
                }
            }
            BrutePhase::Hop => {
                self.velocity.y -= Self::GRAVITY * dt;
                position += self.velocity * dt;
                if self.velocity.y < 0.0 && position.y <= self.ground_y {
                    position.y = self.ground_y;
                    self.velocity = Vec2::ZERO;
                    self.phase = BrutePhase::Idle;
                }
            }
            BrutePhase::Throw => {
                self.timer += dt;
                if self.timer >= Self::THROW_SECS {
                    self.timer = 0.0;
                    self.phase = BrutePhase::Idle;
                }
            }
        }

        BruteStep {
            position,
            changed: (from != self.phase).then_some((from, self.phase)),
            throw,
        }
    }
}

const ENEMY_BULLET_DAMAGE: i32 = 2;
const ROCK_DAMAGE: i32 = 4;
const ENEMY_PROJECTILE_LIFETIME: f32 = 3.0;

fn drive_enemies(
    mut commands: Commands,
    time: Res<Time>,
    mut log: ResMut<PatternLog>,
    player: Query<&Transform, With<Player>>,
    mut enemies: Query<(&Enemy, &mut EnemyBrain, &mut Transform), Without<Player>>,
) {
    let Ok(player_transform) = player.get_single() else {
        return;
    };
    let target = player_transform.translation.truncate();
    let dt = time.delta_seconds();

    for (enemy, mut brain, mut transform) in &mut enemies {
        let position = transform.translation.truncate();
        match &mut *brain {
            EnemyBrain::Turret(turret) => {
                if turret.tick(dt, position, target) {
                    for velocity in turret.volley() {
                        spawn_projectile(
                            &mut commands,
                            Projectile {
                                side: Side::Enemy,
                                velocity,
                                damage: ENEMY_BULLET_DAMAGE,
                                lifetime: ENEMY_PROJECTILE_LIFETIME,
                            },
                            position,
                        );
                    }
                }
            }
            EnemyBrain::Flier(flier) => {
                let next = flier.step(position, dt);
                transform.translation.x = next.x;
                transform.translation.y = next.y;
            }
            EnemyBrain::Brute(brute) => {
                let step = brute.step(position, target, dt);
                transform.translation.x = step.position.x;
                transform.translation.y = step.position.y;

                if let Some((from, to)) = step.changed {
                    log.record(
                        LogCategory::State,
                        format!("{}: {} -> {}", enemy.kind.name(), from.label(), to.label()),
                    );
                }
                if let Some(velocity) = step.throw {
                    spawn_projectile(
                        &mut commands,
                        Projectile {
                            side: Side::Enemy,
                            velocity,
                            damage: ROCK_DAMAGE,
                            lifetime: ENEMY_PROJECTILE_LIFETIME,
                        },
                        position,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turret_guards_out_of_range() {
        let mut turret = Turret::default();
        assert!(!turret.tick(0.1, Vec2::ZERO, Vec2::new(500.0, 0.0)));
        assert!(turret.guarding);
        assert_eq!(turret.facing, 1.0);
    }

    #[test]
    fn turret_fires_on_entering_range_then_waits() {
        let mut turret = Turret::default();
        let player = Vec2::new(-100.0, 0.0);
        assert!(turret.tick(0.1, Vec2::ZERO, player));
        assert!(!turret.guarding);
        assert!(!turret.tick(1.0, Vec2::ZERO, player));
        assert!(turret.tick(0.6, Vec2::ZERO, player));

        let volley: Vec<_> = turret.volley().collect();
        assert_eq!(volley.len(), 3);
        assert!(volley.iter().all(|v| v.x < 0.0));
    }

    #[test]
    fn flier_reverses_at_the_edge_of_its_box() {
        let mut flier = Flier::around(Vec2::ZERO);
        let near_edge = Vec2::new(95.0, 0.0);
        let next = flier.step(near_edge, 0.1);
        assert_eq!(next.x, 95.0);
        assert!(flier.velocity.x < 0.0);
    }

    #[test]
    fn brute_throws_at_a_near_player() {
        let mut brute = Brute::grounded_at(0.0);
        let near = Vec2::new(100.0, 0.0);
        let step = brute.step(Vec2::ZERO, near, 1.0);
        assert_eq!(step.changed, None);

        let step = brute.step(Vec2::ZERO, near, 1.0);
        assert_eq!(step.changed, Some((BrutePhase::Idle, BrutePhase::Throw)));
        assert!(step.throw.is_some_and(|v| v.x > 0.0));

        let step = brute.step(Vec2::ZERO, near, 1.0);
        assert_eq!(step.changed, Some((BrutePhase::Throw, BrutePhase::Idle)));
    }

    #[test]
    fn brute_hops_toward_a_far_player_and_lands() {
        let mut brute = Brute::grounded_at(0.0);
        let far = Vec2::new(-400.0, 0.0);
        let step = brute.step(Vec2::ZERO, far, 2.0);
        assert_eq!(step.changed, Some((BrutePhase::Idle, BrutePhase::Hop)));
        assert!(step.throw.is_none());

        let mut position = step.position;
        let mut landed = false;
        for _ in 0..200 {
            let step = brute.step(position, far, 1.0 / 60.0);
            position = step.position;
            if step.changed == Some((BrutePhase::Hop, BrutePhase::Idle)) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(position.x < 0.0);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn enemy_is_defeated_exactly_once() {
        let mut enemy = Enemy {
            kind: EnemyKind::Gutsman,
            health: 3,
            points: 5000,
        };
        assert!(!enemy.take_hit(2));
        assert!(enemy.take_hit(2));
        assert!(!enemy.take_hit(2));
    }
}
