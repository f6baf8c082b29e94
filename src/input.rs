//! Keyboard sampling. Raw key codes are folded into the fixed action set the rest of the game
//! understands, once per frame and before any gameplay system runs.

use bevy::input::keyboard::KeyCode;
use bevy::input::InputSystem;
use bevy::prelude::*;

pub struct FrameInputPlugin;

impl Plugin for FrameInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameInput>()
            .add_systems(PreUpdate, sample_keyboard.after(InputSystem));
    }
}

/// Actions requested this frame. `jump`, `pause` and `restart` are edge-triggered; movement and
/// `shoot` are level-triggered so holding the fire button keeps shooting at the cooldown rate.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub shoot: bool,
    pub pause: bool,
    pub restart: bool,
}

impl FrameInput {
    /// -1.0, 0.0 or 1.0. Opposing directions cancel.
    pub fn axis(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn horizontal(&self) -> bool {
        self.left != self.right
    }
}

fn sample_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<FrameInput>) {
    *input = FrameInput {
        left: keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]),
        jump: keyboard.any_just_pressed([KeyCode::KeyW, KeyCode::ArrowUp, KeyCode::Space]),
        shoot: keyboard.any_pressed([KeyCode::KeyJ, KeyCode::KeyX]),
        pause: keyboard.just_pressed(KeyCode::Escape),
        restart: keyboard.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]),
    };
}
