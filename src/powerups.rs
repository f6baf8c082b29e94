//! Capability decoration stack.
//!
//! A player's numbers come from a base `Capabilities` record wrapped by an ordered list of
//! power-up layers. Each layer rewrites exactly one attribute and passes the rest through.
//! `effective()` folds the layers over the base in insertion order every time it is called, so the
//! stored state is only ever the base plus the list, never an accumulated result.

use std::fmt;

use bevy::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    pub speed: f32,
    pub strength: f32,
    pub defense: i32,
    pub max_health: i32,
    pub shot_count: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            speed: 150.0,
            strength: 1.0,
            defense: 0,
            max_health: 28,
            shot_count: 1,
        }
    }
}

impl Capabilities {
    /// Projectile damage derived from strength; never below one.
    pub fn shot_damage(&self) -> i32 {
        (self.strength.round() as i32).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PowerUpKind {
    SpeedBoost,
    StrengthBoost,
    DefenseBoost,
    HealthBoost,
    MultiShot,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::StrengthBoost,
        PowerUpKind::DefenseBoost,
        PowerUpKind::HealthBoost,
        PowerUpKind::MultiShot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::SpeedBoost => "SpeedBoost",
            PowerUpKind::StrengthBoost => "StrengthBoost",
            PowerUpKind::DefenseBoost => "DefenseBoost",
            PowerUpKind::HealthBoost => "HealthBoost",
            PowerUpKind::MultiShot => "MultiShot",
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerUp {
    SpeedBoost { factor: f32 },
    StrengthBoost { factor: f32 },
    DefenseBoost { bonus: i32 },
    HealthBoost { bonus: i32 },
    MultiShot { extra: u32 },
}

impl PowerUp {
    /// The stock layer for `kind`.
    pub fn standard(kind: PowerUpKind) -> Self {
        match kind {
            PowerUpKind::SpeedBoost => PowerUp::SpeedBoost { factor: 2.0 },
            PowerUpKind::StrengthBoost => PowerUp::StrengthBoost { factor: 2.0 },
            PowerUpKind::DefenseBoost => PowerUp::DefenseBoost { bonus: 2 },
            PowerUpKind::HealthBoost => PowerUp::HealthBoost { bonus: 10 },
            PowerUpKind::MultiShot => PowerUp::MultiShot { extra: 2 },
        }
    }

    pub fn kind(&self) -> PowerUpKind {
        match self {
            PowerUp::SpeedBoost { .. } => PowerUpKind::SpeedBoost,
            PowerUp::StrengthBoost { .. } => PowerUpKind::StrengthBoost,
            PowerUp::DefenseBoost { .. } => PowerUpKind::DefenseBoost,
            PowerUp::HealthBoost { .. } => PowerUpKind::HealthBoost,
            PowerUp::MultiShot { .. } => PowerUpKind::MultiShot,
        }
    }

    pub fn apply(&self, caps: Capabilities) -> Capabilities {
        match *self {
            PowerUp::SpeedBoost { factor } => Capabilities {
                speed: caps.speed * factor,
                ..caps
            },
            PowerUp::StrengthBoost { factor } => Capabilities {
                strength: caps.strength * factor,
                ..caps
            },
            PowerUp::DefenseBoost { bonus } => Capabilities {
                defense: caps.defense + bonus,
                ..caps
            },
            PowerUp::HealthBoost { bonus } => Capabilities {
                max_health: caps.max_health + bonus,
                ..caps
            },
            PowerUp::MultiShot { extra } => Capabilities {
                shot_count: caps.shot_count + extra,
                ..caps
            },
        }
    }
}

impl fmt::Display for PowerUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerUp::SpeedBoost { factor } | PowerUp::StrengthBoost { factor } => {
                write!(f, "{}(x{factor})", self.kind())
            }
            PowerUp::DefenseBoost { bonus } | PowerUp::HealthBoost { bonus } => {
                write!(f, "{}(+{bonus})", self.kind())
            }
            PowerUp::MultiShot { extra } => write!(f, "{}(+{extra})", self.kind()),
        }
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct CapabilityStack {
    base: Capabilities,
    layers: Vec<PowerUp>,
}

impl CapabilityStack {
    pub fn new(base: Capabilities) -> Self {
        Self {
            base,
            layers: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Capabilities::default())
    }

    pub fn base(&self) -> Capabilities {
        self.base
    }

    pub fn layers(&self) -> &[PowerUp] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn count(&self, kind: PowerUpKind) -> usize {
        self.layers.iter().filter(|layer| layer.kind() == kind).count()
    }

    pub fn add(&mut self, layer: PowerUp) {
        self.layers.push(layer);
    }

    /// Drops the most recently added layer of `kind`, leaving every other layer in place.
    /// Returns `None` when no such layer exists.
    pub fn remove(&mut self, kind: PowerUpKind) -> Option<PowerUp> {
        let index = self.layers.iter().rposition(|layer| layer.kind() == kind)?;
        Some(self.layers.remove(index))
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn effective(&self) -> Capabilities {
        self.layers
            .iter()
            .fold(self.base, |caps, layer| layer.apply(caps))
    }
}

/// Remaining lifetime of each timed layer on the player. Expired entries are handed back so the
/// caller can strip the matching layer from the stack.
#[derive(Component, Debug, Clone, Default)]
pub struct PowerUpTimers {
    active: Vec<(PowerUpKind, f32)>,
}

impl PowerUpTimers {
    pub fn start(&mut self, kind: PowerUpKind, seconds: f32) {
        self.active.push((kind, seconds));
    }

    pub fn tick(&mut self, delta_seconds: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.active.retain_mut(|(kind, remaining)| {
            *remaining -= delta_seconds;
            if *remaining <= 0.0 {
                expired.push(*kind);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.active
            .iter()
            .filter(|(active, _)| *active == kind)
            .map(|(_, remaining)| *remaining)
            .reduce(f32::max)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn speed_stack(speed: f32) -> CapabilityStack {
        CapabilityStack::new(Capabilities {
            speed,
            ..Capabilities::default()
        })
    }

    #[test]
    fn two_speed_boosts_compound() {
        let mut stack = speed_stack(5.0);
        stack.add(PowerUp::SpeedBoost { factor: 1.2 });
        stack.add(PowerUp::SpeedBoost { factor: 1.5 });
        assert!(approx(stack.effective().speed, 9.0));
    }

    #[test]
    fn multiplicative_order_gives_the_same_product() {
        let mut forward = speed_stack(4.0);
        forward.add(PowerUp::SpeedBoost { factor: 1.5 });
        forward.add(PowerUp::SpeedBoost { factor: 2.0 });

        let mut reverse = speed_stack(4.0);
        reverse.add(PowerUp::SpeedBoost { factor: 2.0 });
        reverse.add(PowerUp::SpeedBoost { factor: 1.5 });

        assert!(approx(forward.effective().speed, 12.0));
        assert!(approx(reverse.effective().speed, 12.0));
    }

    #[test]
    fn effective_is_repeatable() {
        let mut stack = CapabilityStack::default();
        stack.add(PowerUp::standard(PowerUpKind::SpeedBoost));
        stack.add(PowerUp::standard(PowerUpKind::MultiShot));

        let first = stack.effective();
        let second = stack.effective();
        assert_eq!(first, second);
        assert_eq!(stack.base(), Capabilities::default());
    }

    #[test]
    fn each_layer_touches_one_attribute() {
        let base = Capabilities::default();
        for kind in PowerUpKind::ALL {
            let after = PowerUp::standard(kind).apply(base);
            let changed = [
                after.speed != base.speed,
                after.strength != base.strength,
                after.defense != base.defense,
                after.max_health != base.max_health,
                after.shot_count != base.shot_count,
            ];
            assert_eq!(changed.iter().filter(|c| **c).count(), 1, "{kind}");
        }
    }

    #[test]
    fn removing_an_absent_kind_is_a_no_op() {
        let mut stack = CapabilityStack::default();
        stack.add(PowerUp::standard(PowerUpKind::HealthBoost));
        let before = stack.effective();

        assert_eq!(stack.remove(PowerUpKind::DefenseBoost), None);
        assert_eq!(stack.effective(), before);
        assert_eq!(stack.layers().len(), 1);
    }

    #[test]
    fn remove_takes_the_newest_layer_of_that_kind() {
        let mut stack = speed_stack(10.0);
        stack.add(PowerUp::SpeedBoost { factor: 2.0 });
        stack.add(PowerUp::DefenseBoost { bonus: 3 });
        stack.add(PowerUp::SpeedBoost { factor: 3.0 });

        assert_eq!(
            stack.remove(PowerUpKind::SpeedBoost),
            Some(PowerUp::SpeedBoost { factor: 3.0 })
        );
        let caps = stack.effective();
        assert!(approx(caps.speed, 20.0));
        assert_eq!(caps.defense, 3);
        assert_eq!(stack.count(PowerUpKind::SpeedBoost), 1);
    }

    #[test]
    fn additive_layers_accumulate() {
        let mut stack = CapabilityStack::default();
        stack.add(PowerUp::MultiShot { extra: 2 });
        stack.add(PowerUp::MultiShot { extra: 1 });
        stack.add(PowerUp::HealthBoost { bonus: 10 });
        let caps = stack.effective();
        assert_eq!(caps.shot_count, 4);
        assert_eq!(caps.max_health, 38);
    }

    #[test]
    fn strength_boost_doubles_damage() {
        let mut stack = CapabilityStack::default();
        assert_eq!(stack.effective().shot_damage(), 1);
        stack.add(PowerUp::standard(PowerUpKind::StrengthBoost));
        assert_eq!(stack.effective().shot_damage(), 2);
    }

    #[test]
    fn display_names_parameters() {
        assert_eq!(PowerUp::SpeedBoost { factor: 1.5 }.to_string(), "SpeedBoost(x1.5)");
        assert_eq!(PowerUp::DefenseBoost { bonus: 2 }.to_string(), "DefenseBoost(+2)");
    }

    #[test]
    fn timers_hand_back_expired_kinds() {
        let mut timers = PowerUpTimers::default();
        timers.start(PowerUpKind::SpeedBoost, 1.0);
        timers.start(PowerUpKind::MultiShot, 3.0);

        assert!(timers.tick(0.5).is_empty());
        assert_eq!(timers.tick(0.6), vec![PowerUpKind::SpeedBoost]);
        assert_eq!(timers.remaining(PowerUpKind::SpeedBoost), None);
        assert!(timers.remaining(PowerUpKind::MultiShot).is_some());
    }
}
