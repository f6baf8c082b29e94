//! Binary entry point: reads tunables, opens the pattern log and hands both to the Bevy app.

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

use blaster_platformer::app::BlasterPlatformerPlugin;
use blaster_platformer::config::{Tunables, TUNABLES_PATH};
use blaster_platformer::pattern_log::PatternLog;

fn main() -> AppExit {
    // Bevy's log plugin is not running yet, so startup failures go straight to stderr.
    let tunables = match Tunables::load(TUNABLES_PATH) {
        Ok(tunables) => tunables,
        Err(err) => {
            eprintln!("error: {err}");
            return AppExit::error();
        }
    };

    let mut pattern_log = PatternLog::with_capacity(tunables.log_capacity);
    if let Some(path) = tunables.log_file.as_deref() {
        if let Err(err) = pattern_log.attach_file(path) {
            eprintln!("warning: cannot open log file '{path}': {err}; logging to memory only");
        }
    }

    let primary_window = Window {
        title: "Blaster Platformer".to_string(),
        resolution: WindowResolution::new(1280.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 640.0,
            min_height: 360.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        ..default()
    };

    let default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(ImagePlugin::default_nearest())
        .set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(true),
            ..default()
        });

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)))
        .insert_resource(tunables)
        .insert_resource(pattern_log)
        .add_plugins(default_plugins)
        .add_plugins(BlasterPlatformerPlugin)
        .run()
}
