use super::{check_input, pixel_count, RgbaBuffer, Texel, TextureError};

fn decode_pixels(
    width: u32,
    height: u32,
    data: &[u8],
    bytes_per_pixel: usize,
    decode_pixel: fn(&[u8]) -> Texel,
) -> Result<RgbaBuffer, TextureError> {
    let expected = pixel_count(width, height)?
        .checked_mul(bytes_per_pixel)
        .ok_or(TextureError::TooLarge { width, height })?;
    let data = check_input(data, expected)?;

    let mut buffer = RgbaBuffer::new(width, height)?;
    for (texel, pixel) in buffer
        .data_mut()
        .chunks_exact_mut(4)
        .zip(data.chunks_exact(bytes_per_pixel))
    {
        texel.copy_from_slice(&decode_pixel(pixel));
    }

    Ok(buffer)
}

/// 8 bits per channel, stored as `B G R A`.
pub fn decode_argb8888(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_pixels(width, height, data, 4, |pixel| {
        [
            pixel[2] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[0] as f32 / 255.0,
            pixel[3] as f32 / 255.0,
        ]
    })
}

/// 5 bits per color channel with a single alpha bit: `A RRRRR GGGGG BBBBB`.
pub fn decode_argb1555(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_pixels(width, height, data, 2, |pixel| {
        let argb = u16::from_le_bytes([pixel[0], pixel[1]]);
        [
            ((argb >> 10) & 0x1f) as f32 / 31.0,
            ((argb >> 5) & 0x1f) as f32 / 31.0,
            (argb & 0x1f) as f32 / 31.0,
            (argb >> 15) as f32,
        ]
    })
}

/// 4 bits per channel: `AAAA RRRR GGGG BBBB`.
pub fn decode_argb4444(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_pixels(width, height, data, 2, |pixel| {
        let argb = u16::from_le_bytes([pixel[0], pixel[1]]);
        [
            ((argb >> 8) & 0x0f) as f32 / 15.0,
            ((argb >> 4) & 0x0f) as f32 / 15.0,
            (argb & 0x0f) as f32 / 15.0,
            (argb >> 12) as f32 / 15.0,
        ]
    })
}

/// 8 bit intensity followed by 8 bit alpha.
pub fn decode_ai88(width: u32, height: u32, data: &[u8]) -> Result<RgbaBuffer, TextureError> {
    decode_pixels(width, height, data, 2, |pixel| {
        let intensity = pixel[0] as f32 / 255.0;
        [intensity, intensity, intensity, pixel[1] as f32 / 255.0]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb8888_swaps_red_and_blue() {
        let buffer = decode_argb8888(1, 1, &[0, 51, 255, 102]).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([1.0, 0.2, 0.0, 0.4]));
    }

    #[test]
    fn argb1555_alpha_bit() {
        let buffer = decode_argb1555(2, 1, &[0x1f, 0x80, 0x00, 0x7c]).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(buffer.pixel(1, 0), Some([1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn argb4444_nibbles() {
        // gb = 0xf0, ar = 0x0f
        let buffer = decode_argb4444(1, 1, &[0xf0, 0x0f]).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([1.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn ai88_gray() {
        let buffer = decode_ai88(1, 1, &[255, 0]).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([1.0, 1.0, 1.0, 0.0]));
    }

    #[test]
    fn no_alignment_required() {
        let buffer = decode_ai88(3, 5, &[0; 30]).unwrap();
        assert_eq!(buffer.data().len(), 3 * 5 * 4);
    }

    #[test]
    fn short_input_fails() {
        assert_eq!(
            decode_argb8888(2, 2, &[0; 15]),
            Err(TextureError::Truncated {
                expected: 16,
                actual: 15
            })
        );
    }
}
