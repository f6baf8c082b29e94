//! Player behaviour state machine.
//!
//! The six states are the product of two independent axes, motion (standing, running, airborne)
//! and whether a shot pose is active. `handle_input` resolves each axis from the frame's input and
//! the physical signals, then recombines them, so every input combination lands on a defined state
//! and disallowed requests (a jump in mid-air, a shot during cooldown) are simply not taken.

use bevy::prelude::*;
use serde::Serialize;

use crate::input::FrameInput;

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Running,
    Jumping,
    Shooting,
    RunningShooting,
    JumpShooting,
}

impl PlayerState {
    pub const ALL: [PlayerState; 6] = [
        PlayerState::Idle,
        PlayerState::Running,
        PlayerState::Jumping,
        PlayerState::Shooting,
        PlayerState::RunningShooting,
        PlayerState::JumpShooting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlayerState::Idle => "IDLE",
            PlayerState::Running => "RUNNING",
            PlayerState::Jumping => "JUMPING",
            PlayerState::Shooting => "SHOOTING",
            PlayerState::RunningShooting => "RUNNING_SHOOTING",
            PlayerState::JumpShooting => "JUMP_SHOOTING",
        }
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, PlayerState::Jumping | PlayerState::JumpShooting)
    }

    pub fn is_shooting(self) -> bool {
        matches!(
            self,
            PlayerState::Shooting | PlayerState::RunningShooting | PlayerState::JumpShooting
        )
    }

    pub fn is_running(self) -> bool {
        matches!(self, PlayerState::Running | PlayerState::RunningShooting)
    }

    fn compose(airborne: bool, shooting: bool, running: bool) -> Self {
        match (airborne, shooting, running) {
            (true, true, _) => PlayerState::JumpShooting,
            (true, false, _) => PlayerState::Jumping,
            (false, true, true) => PlayerState::RunningShooting,
            (false, true, false) => PlayerState::Shooting,
            (false, false, true) => PlayerState::Running,
            (false, false, false) => PlayerState::Idle,
        }
    }
}

/// Facts supplied by physics and the weapon each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSignals {
    /// The body rests on a solid tile.
    pub grounded: bool,
    /// The current shot pose has been held for its full duration.
    pub shot_finished: bool,
    /// The weapon is off cooldown.
    pub can_shoot: bool,
}

impl Default for PlayerSignals {
    fn default() -> Self {
        Self {
            grounded: true,
            shot_finished: true,
            can_shoot: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlayerState,
    pub to: PlayerState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// The body leaves the ground because of a jump request rather than a ledge.
    pub fn launches_jump(&self, input: &FrameInput, signals: PlayerSignals) -> bool {
        self.to.is_airborne() && input.jump && signals.grounded
    }

    /// A new projectile volley should be fired this frame.
    pub fn fires_shot(&self, input: &FrameInput, signals: PlayerSignals) -> bool {
        self.to.is_shooting() && input.shoot && signals.can_shoot
    }
}

/// Next state for `current` given this frame's input and signals.
pub fn handle_input(current: PlayerState, input: &FrameInput, signals: PlayerSignals) -> PlayerState {
    let jump_requested = input.jump && signals.grounded;
    let airborne = !signals.grounded || jump_requested;

    let shot_requested = input.shoot && signals.can_shoot;
    let shooting = shot_requested || (current.is_shooting() && !signals.shot_finished);

    PlayerState::compose(airborne, shooting, input.horizontal())
}

pub fn transition(current: PlayerState, input: &FrameInput, signals: PlayerSignals) -> Transition {
    Transition {
        from: current,
        to: handle_input(current, input, signals),
    }
}
