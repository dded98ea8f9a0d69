//! Raw pixel buffer handed over by the image collaborator.

use crate::error::{Result, StegoError};

/// Number of color channels (R, G, B) that carry payload bits.
pub const COLOR_CHANNELS: usize = 3;

/// Row-major, interleaved 8-bit pixel samples.
///
/// Channels 0..3 are R, G, B. Any further channel (alpha) is carried along
/// but never written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking that the geometry matches the data.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if (channels as usize) < COLOR_CHANNELS {
            return Err(StegoError::InvalidInput(format!(
                "pixel buffer needs at least {COLOR_CHANNELS} channels, got {channels}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize))
            .ok_or_else(|| StegoError::InvalidInput("pixel buffer dimensions overflow".into()))?;
        if data.len() != expected {
            return Err(StegoError::InvalidInput(format!(
                "pixel buffer has {} samples, {}x{}x{} requires {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Convenience for tightly packed RGB data.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, COLOR_CHANNELS as u8, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Samples that can carry a payload bit (R, G, B of every pixel).
    pub fn color_sample_count(&self) -> usize {
        self.pixel_count() * COLOR_CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Indices into [`as_bytes`](Self::as_bytes) of the color samples in scan
    /// order: row-major pixels, R then G then B within each pixel.
    ///
    /// The iterator owns its state, so the buffer may be borrowed mutably
    /// while it is consumed.
    pub fn color_sample_indices(&self) -> impl Iterator<Item = usize> {
        let stride = self.channels as usize;
        (0..self.color_sample_count()).map(move |n| color_sample_index(n, stride))
    }
}

/// Position of the `n`-th color sample in an interleaved buffer whose pixels
/// are `stride` samples wide.
#[inline]
fn color_sample_index(n: usize, stride: usize) -> usize {
    (n / COLOR_CHANNELS) * stride + n % COLOR_CHANNELS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_two_channel_buffers() {
        let err = PixelBuffer::new(2, 2, 2, vec![0; 8]).unwrap_err();
        assert!(matches!(err, StegoError::InvalidInput(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = PixelBuffer::from_rgb(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, StegoError::InvalidInput(_)));
    }

    #[test]
    fn zero_sized_buffer_is_legal() {
        let buf = PixelBuffer::from_rgb(0, 5, Vec::new()).unwrap();
        assert_eq!(buf.color_sample_count(), 0);
        assert_eq!(buf.color_sample_indices().count(), 0);
    }

    #[test]
    fn scan_order_skips_alpha() {
        let buf = PixelBuffer::new(2, 1, 4, vec![0; 8]).unwrap();
        let idx: Vec<usize> = buf.color_sample_indices().collect();
        assert_eq!(idx, vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn scan_order_is_row_major() {
        let buf = PixelBuffer::from_rgb(2, 2, vec![0; 12]).unwrap();
        let idx: Vec<usize> = buf.color_sample_indices().collect();
        assert_eq!(idx, (0..12).collect::<Vec<_>>());
    }
}
