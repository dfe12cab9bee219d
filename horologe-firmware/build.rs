//! Build script for horologe-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates watch.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use horologe_core::config::WatchConfig;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Print a boxed build error and stop
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| format!("║  {:<64} ║", line))
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<58} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

/// Validate watch.toml: syntax, then values
fn validate_config() {
    println!("cargo:rerun-if-changed=watch.toml");

    let config_path = Path::new("watch.toml");
    if !config_path.exists() {
        fail(
            "watch.toml not found",
            &[
                "The firmware embeds watch.toml from the crate directory.".into(),
                "Create one; every key is optional.".into(),
            ],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read watch.toml", &[e.to_string()]),
    };

    if let Err(e) = toml::from_str::<toml::Value>(&content) {
        let lines = e.to_string().lines().map(String::from).collect::<Vec<_>>();
        fail("Invalid TOML syntax in watch.toml", &lines);
    }

    let config: WatchConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            let lines = e.to_string().lines().map(String::from).collect::<Vec<_>>();
            fail("Invalid value in watch.toml", &lines);
        }
    };

    if let Err(e) = config.validate() {
        let hint = match e {
            horologe_core::config::ConfigError::EmptyScreen => {
                "screen width and height must be non-zero"
            }
            horologe_core::config::ConfigError::InboxSize => "inbox_size must be 1-256",
            horologe_core::config::ConfigError::OutboxSize => "outbox_size must be 16-256",
            horologe_core::config::ConfigError::Placeholder => {
                "placeholder must fit the 64-byte sync cache and contain no NUL"
            }
        };
        fail("Invalid watch configuration", &[format!("{:?}: {}", e, hint)]);
    }
}
