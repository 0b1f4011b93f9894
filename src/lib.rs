//! Investment dashboard: melts a wide per-country, per-year table into long
//! format and charts it with egui.
//!
//! The [`data`] module is the whole pipeline and has no UI dependencies;
//! [`app`], [`state`] and [`ui`] only call into it.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;
