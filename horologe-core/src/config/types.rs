//! Watch face configuration types

use heapless::String;

use horologe_protocol::{calc_buffer_size, MAX_PAYLOAD_SIZE};

use crate::geometry::{Rect, Size};
use crate::scheduler::TickUnit;
use crate::sync::{MIN_OUTBOX_SIZE, SYNC_BUFFER_SIZE};
use crate::traits::TextAlign;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum length of the placeholder temperature text
pub const MAX_PLACEHOLDER_LEN: usize = 32;

/// Shown until the companion delivers a temperature
pub const DEFAULT_PLACEHOLDER: &str = "1234°C";

pub const DEFAULT_SCREEN: Size = Size::new(144, 168);

/// Inbox and outbox sizes asked of the transport
pub const DEFAULT_MESSAGE_SIZE: u16 = 64;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Screen has zero width or height
    EmptyScreen,
    /// Inbox size is zero or above the link payload limit
    InboxSize,
    /// Outbox size cannot hold a request or is above the link payload limit
    OutboxSize,
    /// Placeholder does not fit the sync cache or contains NUL
    Placeholder,
}

/// Where the date and temperature labels sit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LabelLayout {
    /// Day of week
    pub day: Rect,
    /// Day of month
    pub num: Rect,
    pub temperature: Rect,
    pub temperature_align: TextAlign,
}

impl LabelLayout {
    /// Layout for a screen `width` pixels wide
    pub fn for_width(width: u16) -> Self {
        Self {
            day: Rect::new(4, 146, 27, 20),
            num: Rect::new(30, 146, 18, 20),
            temperature: Rect::new(60, 146, width, 68),
            temperature_align: TextAlign::Center,
        }
    }
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self::for_width(DEFAULT_SCREEN.width)
    }
}

/// Watch face configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WatchConfig {
    /// Face size in pixels
    pub screen: Size,
    /// Largest inbound message accepted
    pub inbox_size: u16,
    /// Largest outbound message built
    pub outbox_size: u16,
    /// Redraw granularity
    pub tick_unit: TickUnit,
    /// Draw the second hand (only honored at second granularity)
    pub second_hand: bool,
    /// Draw the twelve hour marks
    pub tick_marks: bool,
    /// Temperature text before the first update
    pub placeholder: String<MAX_PLACEHOLDER_LEN>,
    pub layout: LabelLayout,
}

impl Default for WatchConfig {
    fn default() -> Self {
        let mut placeholder = String::new();
        let _ = placeholder.push_str(DEFAULT_PLACEHOLDER);
        Self {
            screen: DEFAULT_SCREEN,
            inbox_size: DEFAULT_MESSAGE_SIZE,
            outbox_size: DEFAULT_MESSAGE_SIZE,
            tick_unit: TickUnit::Second,
            second_hand: true,
            tick_marks: true,
            placeholder,
            layout: LabelLayout::default(),
        }
    }
}

impl WatchConfig {
    /// Check sizes against the link and sync cache limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.is_empty() {
            return Err(ConfigError::EmptyScreen);
        }

        let inbox = self.inbox_size as usize;
        if inbox == 0 || inbox > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::InboxSize);
        }

        let outbox = self.outbox_size as usize;
        if !(MIN_OUTBOX_SIZE..=MAX_PAYLOAD_SIZE).contains(&outbox) {
            return Err(ConfigError::OutboxSize);
        }

        // Stored as a C string, terminator included
        let encoded = calc_buffer_size(&[self.placeholder.len() + 1]);
        if self.placeholder.contains('\0') || encoded > SYNC_BUFFER_SIZE {
            return Err(ConfigError::Placeholder);
        }

        Ok(())
    }

    /// Whether the second hand is drawn at all
    pub fn shows_second_hand(&self) -> bool {
        self.second_hand && self.tick_unit == TickUnit::Second
    }
}
