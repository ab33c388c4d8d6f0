//! Laulud TUI library exports.

pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod search;
pub mod state;
pub mod tags;
pub mod theme;
pub mod views;
pub mod widgets;
