//! Sound playback. The sound listener only queues cues; this plugin turns queued cues into
//! one-shot audio entities. Missing files just mean silence.

use bevy::prelude::*;

use crate::events::{dispatch_game_events, SoundCue, SoundQueue};
use crate::state::GameState;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioHandles>()
            .add_systems(OnEnter(GameState::Loading), load_audio_handles)
            .add_systems(Update, play_sound_cues.after(dispatch_game_events));
    }
}

#[derive(Resource, Default)]
pub struct AudioHandles {
    pub jump: Option<Handle<AudioSource>>,
    pub shoot: Option<Handle<AudioSource>>,
    pub enemy_defeated: Option<Handle<AudioSource>>,
    pub pickup: Option<Handle<AudioSource>>,
    pub power_up: Option<Handle<AudioSource>>,
    pub power_down: Option<Handle<AudioSource>>,
    pub hurt: Option<Handle<AudioSource>>,
    pub level_complete: Option<Handle<AudioSource>>,
}

impl AudioHandles {
    pub fn clip(&self, cue: SoundCue) -> Option<Handle<AudioSource>> {
        let handle = match cue {
            SoundCue::Jump => &self.jump,
            SoundCue::Shoot => &self.shoot,
            SoundCue::EnemyDefeated => &self.enemy_defeated,
            SoundCue::Pickup => &self.pickup,
            SoundCue::PowerUp => &self.power_up,
            SoundCue::PowerDown => &self.power_down,
            SoundCue::Hurt => &self.hurt,
            SoundCue::LevelComplete => &self.level_complete,
        };
        handle.clone()
    }
}

fn load_audio_handles(asset_server: Res<AssetServer>, mut handles: ResMut<AudioHandles>) {
    if handles.jump.is_some() {
        return;
    }

    *handles = AudioHandles {
        jump: Some(asset_server.load("audio/jump.ogg")),
        shoot: Some(asset_server.load("audio/shoot.ogg")),
        enemy_defeated: Some(asset_server.load("audio/enemy_defeated.ogg")),
        pickup: Some(asset_server.load("audio/pickup.ogg")),
        power_up: Some(asset_server.load("audio/power_up.ogg")),
        power_down: Some(asset_server.load("audio/power_down.ogg")),
        hurt: Some(asset_server.load("audio/hurt.ogg")),
        level_complete: Some(asset_server.load("audio/level_complete.ogg")),
    };

    info!("Queued sound effects. Add files under assets/audio/ to enable playback.");
}

fn play_sound_cues(
    mut commands: Commands,
    mut queue: ResMut<SoundQueue>,
    handles: Res<AudioHandles>,
) {
    for cue in queue.drain() {
        let Some(source) = handles.clip(cue) else {
            continue;
        };
        commands.spawn(AudioBundle {
            source,
            settings: PlaybackSettings::DESPAWN,
        });
    }
}
