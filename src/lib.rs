//! A side-scrolling blaster platformer on Bevy.
//!
//! The player's behaviour is a six-state machine (`player_state`) and its numbers come from a base
//! record wrapped by stacked power-up layers (`powerups`). Around that core sit a single shared
//! `GameContext`, a typed event bus with listeners, a tag-driven entity factory and a
//! Level → Zone → Tile tree built from LDtk data or a built-in ASCII stage.

pub mod app;
pub mod audio;
pub mod camera;
pub mod collision;
pub mod combat;
pub mod config;
pub mod context;
pub mod enemies;
pub mod events;
pub mod factory;
pub mod input;
pub mod level;
pub mod level_tree;
pub mod movement;
pub mod pattern_log;
pub mod player;
pub mod player_state;
pub mod powerups;
pub mod state;
pub mod ui;
