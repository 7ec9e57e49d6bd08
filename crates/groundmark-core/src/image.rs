/// Borrowed view of an interleaved 8-bit color frame.
///
/// Pixels are row-major. Each pixel occupies `channels` bytes and the first
/// three are interpreted as R, G, B (a fourth alpha byte is ignored).
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: &'a [u8], // row-major, len = w*h*channels
}

/// Frame buffer validation errors.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("unsupported channel count {0} (expected 3 or 4)")]
    UnsupportedChannels(usize),
    #[error("frame buffer too small (expected {expected} bytes, got {got})")]
    BufferTooSmall { expected: usize, got: usize },
    #[error("empty frame ({width}x{height})")]
    Empty { width: usize, height: usize },
}

impl<'a> FrameView<'a> {
    /// Wrap an RGB buffer.
    pub fn rgb(width: usize, height: usize, data: &'a [u8]) -> Result<Self, FrameError> {
        Self::new(width, height, 3, data)
    }

    /// Wrap an RGBA buffer.
    pub fn rgba(width: usize, height: usize, data: &'a [u8]) -> Result<Self, FrameError> {
        Self::new(width, height, 4, data)
    }

    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        let view = Self {
            width,
            height,
            channels,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Check channel count and buffer length.
    ///
    /// Views built through struct literals skip the constructor, so consumers
    /// call this before indexing.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.channels != 3 && self.channels != 4 {
            return Err(FrameError::UnsupportedChannels(self.channels));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::Empty {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width * self.height * self.channels;
        if self.data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }

    /// `[r, g, b]` at `(x, y)`. Caller guarantees the coordinates are in range.
    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * self.channels;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Iterate over the `[r, g, b]` triples of one row.
    #[inline]
    pub fn row(&self, y: usize) -> impl Iterator<Item = [u8; 3]> + '_ {
        let start = y * self.width * self.channels;
        let end = start + self.width * self.channels;
        self.data[start..end]
            .chunks_exact(self.channels)
            .map(|px| [px[0], px[1], px[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        let data = [0u8; 11];
        let err = FrameView::rgb(2, 2, &data).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferTooSmall {
                expected: 12,
                got: 11
            }
        );
    }

    #[test]
    fn rgba_rows_skip_alpha() {
        let data = [1u8, 2, 3, 255, 4, 5, 6, 255];
        let view = FrameView::rgba(2, 1, &data).expect("view");
        let row: Vec<[u8; 3]> = view.row(0).collect();
        assert_eq!(row, vec![[1, 2, 3], [4, 5, 6]]);
        assert_eq!(view.rgb_at(1, 0), [4, 5, 6]);
    }

    #[test]
    fn rejects_two_channel_frames() {
        let data = [0u8; 8];
        assert_eq!(
            FrameView::new(2, 2, 2, &data).unwrap_err(),
            FrameError::UnsupportedChannels(2)
        );
    }
}
