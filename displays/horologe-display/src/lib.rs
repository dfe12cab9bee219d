//! Pixels for the watch face
//!
//! - [`FrameBuffer`]: 144x168 1-bit buffer that tracks changed rows
//! - [`EgCanvas`]: the core `Canvas` on any binary embedded-graphics target
//! - [`MemoryLcd`]: pushes changed rows to a Sharp memory LCD over SPI
//!
//! The core draws through `Canvas`, the canvas writes into the frame
//! buffer, and the firmware flushes the buffer after each handled event.

#![cfg_attr(not(test), no_std)]

pub mod canvas;
pub mod lcd;
pub mod screen;

pub use canvas::{CanvasError, EgCanvas, LABEL_FONT};
pub use lcd::{DisplayError, MemoryLcd};
pub use screen::{DirtyRows, FrameBuffer, ROW_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
