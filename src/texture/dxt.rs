//! S3TC block decoding.
//!
//! Both formats store 4x4 texel blocks left to right, top to bottom. Block
//! rows write to disjoint bands of the output, so they are decoded in parallel.

use rayon::prelude::*;

use super::{check_input, pixel_count, RgbaBuffer, Texel, TextureError};

const BLOCK_DIM: usize = 4;

/// Decoded 4x4 block, texels in row-major order.
pub type TexelBlock = [Texel; 16];

pub(super) struct BlockCodec {
    size: usize,
    decode: fn(&[u8]) -> TexelBlock,
}

pub(super) const DXT1_BLOCK: BlockCodec = BlockCodec {
    size: 8,
    decode: dxt1_block,
};

pub(super) const DXT5_BLOCK: BlockCodec = BlockCodec {
    size: 16,
    decode: dxt5_block,
};

/// Packed RGB565 color, `RRRRRGGGGGGBBBBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ColorEndpoint(pub u16);

impl ColorEndpoint {
    pub fn to_rgb(self) -> [f32; 3] {
        self.channels().map(|channel| channel as f32)
    }

    /// Ramps are blended at double precision and rounded once when stored.
    fn channels(self) -> [f64; 3] {
        let red = (self.0 >> 11) as f64 / 31.0;
        let green = ((self.0 >> 5) & 0x3f) as f64 / 63.0;
        let blue = (self.0 & 0x1f) as f64 / 31.0;

        [red, green, blue]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaEndpoints {
    pub alpha0: u8,
    pub alpha1: u8,
}

impl AlphaEndpoints {
    /// Builds the 8 entry alpha lookup table.
    ///
    /// If `alpha0 > alpha1` the table holds 6 values interpolated between the
    /// endpoints, otherwise 4 interpolated values followed by 0.0 and 1.0.
    pub fn ramp(self) -> [f32; 8] {
        let a0 = self.alpha0 as f64 / 255.0;
        let a1 = self.alpha1 as f64 / 255.0;

        let mut ramp = [a0, a1, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        if self.alpha0 > self.alpha1 {
            for i in 1..7 {
                ramp[i + 1] = (7 - i) as f64 / 7.0 * a0 + i as f64 / 7.0 * a1;
            }
        } else {
            for i in 1..5 {
                ramp[i + 1] = (5 - i) as f64 / 5.0 * a0 + i as f64 / 5.0 * a1;
            }
        }

        ramp.map(|alpha| alpha as f32)
    }
}

fn blend(c0: [f64; 3], c1: [f64; 3], w0: f64, w1: f64) -> Texel {
    [
        (w0 * c0[0] + w1 * c1[0]) as f32,
        (w0 * c0[1] + w1 * c1[1]) as f32,
        (w0 * c0[2] + w1 * c1[2]) as f32,
        1.0,
    ]
}

fn opaque(color: [f64; 3]) -> Texel {
    [color[0] as f32, color[1] as f32, color[2] as f32, 1.0]
}

fn midpoint(c0: [f64; 3], c1: [f64; 3]) -> Texel {
    [
        (0.5 * (c0[0] + c1[0])) as f32,
        (0.5 * (c0[1] + c1[1])) as f32,
        (0.5 * (c0[2] + c1[2])) as f32,
        1.0,
    ]
}

/// 4 entry color lookup table for a color block.
///
/// With `punch_through` the 3 color mode is selected when `color0 <= color1`,
/// its fourth entry being transparent black.
fn color_ramp(color0: ColorEndpoint, color1: ColorEndpoint, punch_through: bool) -> [Texel; 4] {
    let c0 = color0.channels();
    let c1 = color1.channels();

    let first = opaque(c0);
    let second = opaque(c1);

    if !punch_through || color0 > color1 {
        [
            first,
            second,
            blend(c0, c1, 2.0 / 3.0, 1.0 / 3.0),
            blend(c0, c1, 1.0 / 3.0, 2.0 / 3.0),
        ]
    } else {
        [first, second, midpoint(c0, c1), [0.0; 4]]
    }
}

/// Decodes the 8 byte color part shared by both formats.
fn color_block(block: &[u8], punch_through: bool) -> TexelBlock {
    let color0 = ColorEndpoint(u16::from_le_bytes([block[0], block[1]]));
    let color1 = ColorEndpoint(u16::from_le_bytes([block[2], block[3]]));
    let codes = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);

    let ramp = color_ramp(color0, color1, punch_through);

    let mut texels = [[0.0; 4]; 16];
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = ramp[(codes >> (i * 2)) as usize & 0x03];
    }
    texels
}

fn dxt1_block(block: &[u8]) -> TexelBlock {
    color_block(block, true)
}

fn dxt5_block(block: &[u8]) -> TexelBlock {
    let alpha = AlphaEndpoints {
        alpha0: block[0],
        alpha1: block[1],
    };
    let codes = u64::from_le_bytes([
        block[2], block[3], block[4], block[5], block[6], block[7], 0, 0,
    ]);

    let ramp = alpha.ramp();

    let mut texels = color_block(&block[8..16], false);
    for (i, texel) in texels.iter_mut().enumerate() {
        texel[3] = ramp[(codes >> (i * 3)) as usize & 0x07];
    }
    texels
}

/// Decodes a single 8 byte DXT1 block.
pub fn decode_dxt1_block(block: &[u8; 8]) -> TexelBlock {
    dxt1_block(block)
}

/// Decodes a single 16 byte DXT5 block.
pub fn decode_dxt5_block(block: &[u8; 16]) -> TexelBlock {
    dxt5_block(block)
}

fn decode_band(band: &mut [f32], src: &[u8], width: usize, codec: &BlockCodec) {
    for (bx, block) in src.chunks_exact(codec.size).enumerate() {
        let texels = (codec.decode)(block);

        for (i, texel) in texels.iter().enumerate() {
            let row = i / BLOCK_DIM;
            let col = bx * BLOCK_DIM + i % BLOCK_DIM;
            let index = (row * width + col) * 4;
            band[index..index + 4].copy_from_slice(texel);
        }
    }
}

pub(super) fn decode_blocks(
    width: u32,
    height: u32,
    data: &[u8],
    codec: BlockCodec,
    parallel: bool,
) -> Result<RgbaBuffer, TextureError> {
    if width as usize % BLOCK_DIM != 0 || height as usize % BLOCK_DIM != 0 {
        return Err(TextureError::UnalignedResolution { width, height });
    }

    let blocks = pixel_count(width, height)? / (BLOCK_DIM * BLOCK_DIM);
    let expected = blocks
        .checked_mul(codec.size)
        .ok_or(TextureError::TooLarge { width, height })?;
    let data = check_input(data, expected)?;

    let mut buffer = RgbaBuffer::new(width, height)?;
    if blocks == 0 {
        return Ok(buffer);
    }

    let width = width as usize;
    let band_len = width * BLOCK_DIM * 4;
    let row_len = width / BLOCK_DIM * codec.size;
    log::debug!(
        "decoding {} blocks of {} bytes ({} x {})",
        blocks,
        codec.size,
        width,
        height
    );

    if parallel {
        buffer
            .data_mut()
            .par_chunks_mut(band_len)
            .zip(data.par_chunks_exact(row_len))
            .for_each(|(band, src)| decode_band(band, src, width, &codec));
    } else {
        buffer
            .data_mut()
            .chunks_mut(band_len)
            .zip(data.chunks_exact(row_len))
            .for_each(|(band, src)| decode_band(band, src, width, &codec));
    }

    Ok(buffer)
}

/// Decodes DXT1 (BC1) data into a `width` x `height` buffer.
///
/// Both dimensions must be multiples of 4.
pub fn decode_dxt1(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_blocks(width, height, data, DXT1_BLOCK, true)
}

/// Decodes DXT5 (BC3) data into a `width` x `height` buffer.
///
/// Both dimensions must be multiples of 4.
pub fn decode_dxt5(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_blocks(width, height, data, DXT5_BLOCK, true)
}
