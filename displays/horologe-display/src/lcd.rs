//! Sharp memory LCD driver (LS013B7DH05 and friends)
//!
//! The panel is write-only over SPI with an active-high chip select.
//! A write transaction is one mode byte, then for each line its 1-based
//! address, 18 data bytes and a dummy byte, then a trailing dummy byte.
//! Addresses go out LSB first, so they are bit-reversed for an MSB-first
//! bus. The VCOM bit must alternate at least once a second to keep the
//! liquid crystal from charging; every transaction flips it.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

use crate::screen::{FrameBuffer, ROW_BYTES};

mod cmd {
    pub const WRITE_LINE: u8 = 0x80;
    pub const VCOM: u8 = 0x40;
    pub const CLEAR_ALL: u8 = 0x20;
    pub const DUMMY: u8 = 0x00;
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// SPI transfer failed
    Communication,
    /// Chip select could not be driven
    Pin,
}

pub struct MemoryLcd<SPI, CS> {
    spi: SPI,
    cs: CS,
    vcom: bool,
}

impl<SPI, CS> MemoryLcd<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            vcom: false,
        }
    }

    /// Blank the panel
    pub async fn clear(&mut self) -> Result<(), DisplayError> {
        let mode = self.mode(cmd::CLEAR_ALL);
        self.transaction(&[&[mode, cmd::DUMMY]]).await
    }

    /// Toggle VCOM without changing the image
    pub async fn refresh_vcom(&mut self) -> Result<(), DisplayError> {
        let mode = self.mode(0);
        self.transaction(&[&[mode, cmd::DUMMY]]).await
    }

    /// Send the rows of `frame` that changed; returns how many were sent
    ///
    /// On failure every row is marked dirty again so the next flush
    /// repaints the whole panel.
    pub async fn flush(&mut self, frame: &mut FrameBuffer) -> Result<usize, DisplayError> {
        let dirty = frame.take_dirty_rows();
        if dirty.is_empty() {
            return Ok(0);
        }

        let result = self.write_rows(frame, dirty.iter()).await;
        if result.is_err() {
            frame.mark_all_dirty();
        }
        result.map(|()| dirty.len())
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn mode(&mut self, command: u8) -> u8 {
        self.vcom = !self.vcom;
        if self.vcom {
            command | cmd::VCOM
        } else {
            command
        }
    }

    async fn write_rows(
        &mut self,
        frame: &FrameBuffer,
        rows: impl Iterator<Item = usize>,
    ) -> Result<(), DisplayError> {
        let mode = self.mode(cmd::WRITE_LINE);
        self.cs.set_high().map_err(|_| DisplayError::Pin)?;

        let result = async {
            self.spi.write(&[mode]).await?;
            let mut line = [0u8; ROW_BYTES + 2];
            for y in rows {
                let Some(row) = frame.row(y) else { continue };
                line[0] = line_address(y);
                line[1..=ROW_BYTES].copy_from_slice(row);
                line[ROW_BYTES + 1] = cmd::DUMMY;
                self.spi.write(&line).await?;
            }
            self.spi.write(&[cmd::DUMMY]).await?;
            self.spi.flush().await
        }
        .await
        .map_err(|_| DisplayError::Communication);

        self.cs.set_low().map_err(|_| DisplayError::Pin)?;
        result
    }

    async fn transaction(&mut self, parts: &[&[u8]]) -> Result<(), DisplayError> {
        self.cs.set_high().map_err(|_| DisplayError::Pin)?;

        let mut result = Ok(());
        for part in parts {
            result = self.spi.write(part).await;
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            result = self.spi.flush().await;
        }

        self.cs.set_low().map_err(|_| DisplayError::Pin)?;
        result.map_err(|_| DisplayError::Communication)
    }
}

/// Wire form of the address of row `y`
fn line_address(y: usize) -> u8 {
    ((y + 1) as u8).reverse_bits()
}
