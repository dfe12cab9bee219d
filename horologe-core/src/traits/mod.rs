//! Platform abstraction traits
//!
//! The core draws, talks to the companion and reads the clock only through
//! these traits.

pub mod canvas;
pub mod clock;
pub mod transport;

pub use canvas::{Canvas, Color, TextAlign};
pub use clock::{ClockSource, FixedClock};
pub use transport::Transport;
