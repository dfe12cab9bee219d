//! Board-agnostic logic for the analog watch face
//!
//! Everything here runs on the host as well as on the watch:
//!
//! - Fixed-point trigonometry and hand/tick geometry
//! - Date label formatting and redraw scheduling
//! - Value sync with the companion (cache and request channel)
//! - Configuration types and the on-device `watch.toml` reader
//! - The [`app::WatchApp`] context that ties them together
//!
//! Hardware is reached only through the traits in [`traits`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod date;
pub mod geometry;
pub mod scheduler;
pub mod sync;
pub mod time;
pub mod traits;
pub mod trig;
