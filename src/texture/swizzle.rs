use serde::Deserialize;

use super::{RgbaBuffer, TextureError};

const RED: usize = 0;
const GREEN: usize = 1;
const BLUE: usize = 2;
const ALPHA: usize = 3;

/// Where the data of a channel is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSwizzle {
    Alpha,
    Red,
    Green,
    Blue,
    InvertedAlpha,
    InvertedRed,
    InvertedGreen,
    InvertedBlue,
    BlankWhite,
    BlankBlack,
}

impl TryFrom<u8> for ChannelSwizzle {
    type Error = TextureError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Alpha),
            1 => Ok(Self::Red),
            2 => Ok(Self::Green),
            3 => Ok(Self::Blue),
            4 => Ok(Self::InvertedAlpha),
            5 => Ok(Self::InvertedRed),
            6 => Ok(Self::InvertedGreen),
            7 => Ok(Self::InvertedBlue),
            8 => Ok(Self::BlankWhite),
            9 => Ok(Self::BlankBlack),
            n => Err(TextureError::UnknownSwizzle(n)),
        }
    }
}

impl ChannelSwizzle {
    /// Target channel index and whether the value is inverted.
    fn target(self) -> Option<(usize, bool)> {
        match self {
            Self::Red => Some((RED, false)),
            Self::Green => Some((GREEN, false)),
            Self::Blue => Some((BLUE, false)),
            Self::Alpha => Some((ALPHA, false)),
            Self::InvertedRed => Some((RED, true)),
            Self::InvertedGreen => Some((GREEN, true)),
            Self::InvertedBlue => Some((BLUE, true)),
            Self::InvertedAlpha => Some((ALPHA, true)),
            Self::BlankWhite | Self::BlankBlack => None,
        }
    }
}

/// Channel copy commands, one per source channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Swizzle {
    pub red: ChannelSwizzle,
    pub green: ChannelSwizzle,
    pub blue: ChannelSwizzle,
    pub alpha: ChannelSwizzle,
}

impl Default for Swizzle {
    fn default() -> Self {
        Self {
            red: ChannelSwizzle::Red,
            green: ChannelSwizzle::Green,
            blue: ChannelSwizzle::Blue,
            alpha: ChannelSwizzle::Alpha,
        }
    }
}

impl Swizzle {
    /// Reads the 4 command bytes in their stored order: alpha, red, green, blue.
    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self, TextureError> {
        Ok(Self {
            alpha: ChannelSwizzle::try_from(bytes[0])?,
            red: ChannelSwizzle::try_from(bytes[1])?,
            green: ChannelSwizzle::try_from(bytes[2])?,
            blue: ChannelSwizzle::try_from(bytes[3])?,
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the commands to every pixel. Commands always read the
    /// unswizzled values. Blanking only happens with `process_blanks`.
    pub fn apply(&self, buffer: &mut RgbaBuffer, process_blanks: bool) {
        if self.is_identity() {
            return;
        }
        log::debug!("swizzling channels: {:?}", self);

        let commands = [
            (ALPHA, self.alpha),
            (RED, self.red),
            (GREEN, self.green),
            (BLUE, self.blue),
        ];

        for pixel in buffer.data_mut().chunks_exact_mut(4) {
            let source = [pixel[RED], pixel[GREEN], pixel[BLUE], pixel[ALPHA]];

            for (channel, command) in commands {
                match command.target() {
                    Some((target, false)) if target == channel => {}
                    Some((target, false)) => pixel[target] = source[channel],
                    Some((target, true)) => pixel[target] = 1.0 - source[channel],
                    None if process_blanks => {
                        pixel[channel] = match command {
                            ChannelSwizzle::BlankWhite => 1.0,
                            _ => 0.0,
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pixel: [f32; 4]) -> RgbaBuffer {
        let mut buffer = RgbaBuffer::new(1, 1).unwrap();
        buffer.data_mut().copy_from_slice(&pixel);
        buffer
    }

    #[test]
    fn identity_is_noop() {
        let mut buffer = single([0.1, 0.2, 0.3, 0.4]);
        Swizzle::default().apply(&mut buffer, true);
        assert_eq!(buffer.data(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn copy_and_invert() {
        let mut buffer = single([0.25, 0.5, 0.75, 1.0]);
        let swizzle = Swizzle {
            red: ChannelSwizzle::InvertedAlpha,
            alpha: ChannelSwizzle::InvertedRed,
            ..Default::default()
        };
        swizzle.apply(&mut buffer, false);

        assert_eq!(buffer.data(), &[0.0, 0.5, 0.75, 0.75]);
    }

    #[test]
    fn blanks_need_opt_in() {
        let swizzle = Swizzle {
            green: ChannelSwizzle::BlankWhite,
            blue: ChannelSwizzle::BlankBlack,
            ..Default::default()
        };

        let mut buffer = single([0.25, 0.5, 0.75, 1.0]);
        swizzle.apply(&mut buffer, false);
        assert_eq!(buffer.data(), &[0.25, 0.5, 0.75, 1.0]);

        swizzle.apply(&mut buffer, true);
        assert_eq!(buffer.data(), &[0.25, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn stored_byte_order() {
        let swizzle = Swizzle::from_bytes([4, 1, 2, 3]).unwrap();
        assert_eq!(swizzle.alpha, ChannelSwizzle::InvertedAlpha);
        assert_eq!(swizzle.red, ChannelSwizzle::Red);

        assert_eq!(
            Swizzle::from_bytes([0, 1, 2, 10]),
            Err(TextureError::UnknownSwizzle(10))
        );
    }
}
