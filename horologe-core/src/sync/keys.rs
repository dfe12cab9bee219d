//! Keys shared with the companion app

/// Key of the temperature string pushed by the companion
pub const WEATHER_TEMPERATURE_KEY: u32 = 1;

/// Value written under a key to ask the companion for a refresh
pub const REQUEST_VALUE: i32 = 1;

/// A value kept in sync with the companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncKey {
    /// Current temperature, a display-ready string such as "21°C"
    Temperature,
}

impl SyncKey {
    /// Wire key
    pub const fn raw(self) -> u32 {
        match self {
            SyncKey::Temperature => WEATHER_TEMPERATURE_KEY,
        }
    }

    /// Map a wire key back, `None` for keys this app does not track
    pub fn from_raw(key: u32) -> Option<Self> {
        match key {
            WEATHER_TEMPERATURE_KEY => Some(SyncKey::Temperature),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        assert_eq!(SyncKey::Temperature.raw(), 1);
        assert_eq!(SyncKey::from_raw(1), Some(SyncKey::Temperature));
        assert_eq!(SyncKey::from_raw(2), None);
    }
}
