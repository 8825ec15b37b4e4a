use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::{compression::decompress_lzo, DecodeOptions, Error, RowOrder};

mod dxt;
pub use dxt::{
    decode_dxt1, decode_dxt1_block, decode_dxt5, decode_dxt5_block, AlphaEndpoints, ColorEndpoint,
    TexelBlock,
};

mod raw;
pub use raw::{decode_ai88, decode_argb1555, decode_argb4444, decode_argb8888};

mod swizzle;
pub use swizzle::{ChannelSwizzle, Swizzle};

/// One normalized RGBA sample.
pub type Texel = [f32; 4];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("Unexpected resolution: {width} x {height} (must be a multiple of 4)")]
    UnalignedResolution { width: u32, height: u32 },
    #[error("Texture data too short (expected {expected} bytes, got {actual})")]
    Truncated { expected: usize, actual: usize },
    #[error("Texture of {width} x {height} is too large")]
    TooLarge { width: u32, height: u32 },
    #[error("Unsupported pixel format: {0:#06x}")]
    UnsupportedFormat(u16),
    #[error("Unknown channel swizzle value: {0}")]
    UnknownSwizzle(u8),
}

/// Row-major, interleaved RGBA pixel buffer with normalized channel values.
///
/// Row 0 is the first row in block scan order (the top of the image for
/// top-down containers). Use [`RgbaBuffer::flip_vertical`] for bottom-up
/// consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        let len = pixel_count(width, height)?
            .checked_mul(4)
            .ok_or(TextureError::TooLarge { width, height })?;

        Ok(Self {
            width,
            height,
            data: vec![0.0; len],
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Texel> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let index = (y as usize * self.width as usize + x as usize) * 4;
        let pixel = &self.data[index..index + 4];
        Some([pixel[0], pixel[1], pixel[2], pixel[3]])
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(4)
    }

    /// Reverses the row order in place.
    pub fn flip_vertical(&mut self) {
        let row = self.width as usize * 4;
        let height = self.height as usize;

        for y in 0..height / 2 {
            let (top, bottom) = self.data.split_at_mut((height - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
    }

    pub fn into_row_order(mut self, row_order: RowOrder) -> Self {
        if row_order == RowOrder::BottomUp {
            self.flip_vertical();
        }

        self
    }

    /// Quantizes every channel to 8 bits.
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let pixel = self.pixel(x, y).unwrap_or_default();
            Rgba(pixel.map(quantize))
        })
    }
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn pixel_count(width: u32, height: u32) -> Result<usize, TextureError> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(TextureError::TooLarge { width, height })
}

pub(crate) fn check_input(data: &[u8], expected: usize) -> Result<&[u8], TextureError> {
    if data.len() < expected {
        return Err(TextureError::Truncated {
            expected,
            actual: data.len(),
        });
    }
    if data.len() > expected {
        log::debug!(
            "ignoring {} bytes of trailing texture data",
            data.len() - expected
        );
    }

    Ok(&data[..expected])
}

/// Pixel encodings found in texture containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Dxt1,
    Dxt5,
    Argb8888,
    Argb1555,
    Argb4444,
    Ai88,
}

impl TryFrom<u16> for PixelFormat {
    type Error = TextureError;

    fn try_from(tag: u16) -> Result<Self, Self::Error> {
        match tag {
            0xff01 => Ok(Self::Dxt1),
            0xff05 => Ok(Self::Dxt5),
            0x8888 => Ok(Self::Argb8888),
            0x1555 => Ok(Self::Argb1555),
            0x4444 => Ok(Self::Argb4444),
            0x8080 => Ok(Self::Ai88),
            n => Err(TextureError::UnsupportedFormat(n)),
        }
    }
}

impl PixelFormat {
    pub const fn is_block_compressed(self) -> bool {
        matches!(self, Self::Dxt1 | Self::Dxt5)
    }

    /// Number of encoded bytes a `width` x `height` image occupies.
    pub fn encoded_size(self, width: u32, height: u32) -> Result<usize, TextureError> {
        let pixels = pixel_count(width, height)?;
        let size = match self {
            Self::Dxt1 => Some(pixels / 2),
            Self::Dxt5 => Some(pixels),
            Self::Argb1555 | Self::Argb4444 | Self::Ai88 => pixels.checked_mul(2),
            Self::Argb8888 => pixels.checked_mul(4),
        };

        size.ok_or(TextureError::TooLarge { width, height })
    }

    pub fn check_resolution(self, width: u32, height: u32) -> Result<(), TextureError> {
        if self.is_block_compressed() && (width % 4 != 0 || height % 4 != 0) {
            return Err(TextureError::UnalignedResolution { width, height });
        }

        Ok(())
    }

    pub fn decode(self, width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
        match self {
            Self::Dxt1 => decode_dxt1(width, height, data),
            Self::Dxt5 => decode_dxt5(width, height, data),
            Self::Argb8888 => decode_argb8888(width, height, data),
            Self::Argb1555 => decode_argb1555(width, height, data),
            Self::Argb4444 => decode_argb4444(width, height, data),
            Self::Ai88 => decode_ai88(width, height, data),
        }
    }

    fn decode_with(
        self,
        width: u32,
        height: u32,
        data: &[u8],
        parallel: bool,
    ) -> Result<RgbaBuffer, TextureError> {
        match self {
            Self::Dxt1 => dxt::decode_blocks(width, height, data, dxt::DXT1_BLOCK, parallel),
            Self::Dxt5 => dxt::decode_blocks(width, height, data, dxt::DXT5_BLOCK, parallel),
            _ => self.decode(width, height, data),
        }
    }
}

/// Decodes one texture payload as handed over by a container reader: optional
/// LZO decompression, pixel decoding, then swizzling and row order as
/// configured.
pub fn decode_texture(
    format: PixelFormat,
    width: u32,
    height: u32,
    payload: &[u8],
    lzo_compressed: bool,
    options: &DecodeOptions,
) -> Result<RgbaBuffer, Error> {
    format.check_resolution(width, height)?;

    let decompressed;
    let data = if lzo_compressed {
        let expected = format.encoded_size(width, height)?;
        decompressed = decompress_lzo(payload, expected)?;
        &decompressed.data[..]
    } else {
        payload
    };

    let mut buffer = format.decode_with(width, height, data, options.parallel)?;
    options.swizzle.apply(&mut buffer, options.process_blanks);

    Ok(buffer.into_row_order(options.row_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> RgbaBuffer {
        let mut buffer = RgbaBuffer::new(width, height).unwrap();
        for (i, value) in buffer.data_mut().iter_mut().enumerate() {
            *value = i as f32;
        }
        buffer
    }

    #[test]
    fn flip_vertical_reverses_rows() {
        let mut buffer = numbered(2, 3);
        buffer.flip_vertical();

        assert_eq!(buffer.pixel(0, 0), Some([16.0, 17.0, 18.0, 19.0]));
        assert_eq!(buffer.pixel(1, 1), Some([12.0, 13.0, 14.0, 15.0]));
        assert_eq!(buffer.pixel(1, 2), Some([4.0, 5.0, 6.0, 7.0]));

        buffer.flip_vertical();
        assert_eq!(buffer, numbered(2, 3));
    }

    #[test]
    fn pixel_out_of_bounds() {
        let buffer = numbered(2, 2);
        assert_eq!(buffer.pixel(2, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);
    }

    #[test]
    fn quantize_rounds_and_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-0.2), 0);
        assert_eq!(quantize(1.7), 255);
    }

    #[test]
    fn format_tags() {
        assert_eq!(PixelFormat::try_from(0xff01u16), Ok(PixelFormat::Dxt1));
        assert_eq!(PixelFormat::try_from(0xff05u16), Ok(PixelFormat::Dxt5));
        assert_eq!(
            PixelFormat::try_from(0xff03u16),
            Err(TextureError::UnsupportedFormat(0xff03))
        );
    }

    #[test]
    fn encoded_sizes() {
        assert_eq!(PixelFormat::Dxt1.encoded_size(16, 16), Ok(128));
        assert_eq!(PixelFormat::Dxt5.encoded_size(16, 16), Ok(256));
        assert_eq!(PixelFormat::Argb4444.encoded_size(3, 5), Ok(30));
        assert_eq!(PixelFormat::Argb8888.encoded_size(3, 5), Ok(60));
    }
}
