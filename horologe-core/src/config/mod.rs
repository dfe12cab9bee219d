//! Watch face configuration
//!
//! Defaults reproduce the stock face: 144x168 screen, 64-byte message
//! buffers, per-second redraw. Firmware overrides them from an embedded
//! `watch.toml` read by [`parse_config`].

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::{
    ConfigError, LabelLayout, WatchConfig, DEFAULT_MESSAGE_SIZE, DEFAULT_PLACEHOLDER,
    DEFAULT_SCREEN, MAX_PLACEHOLDER_LEN,
};
