use serde::Deserialize;

use crate::texture::Swizzle;

/// Which image row comes first in a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// rows in block scan order, first row on top
    #[default]
    TopDown,
    /// reversed rows, first row at the bottom (OpenGL convention)
    BottomUp,
}

/// Post-processing applied by [`crate::decode_texture`].
///
/// ```toml
/// row_order = "bottom_up"
/// parallel = false
///
/// [swizzle]
/// red = "inverted_alpha"
/// alpha = "inverted_red"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub row_order: RowOrder,
    pub swizzle: Swizzle,
    /// allow `blank_white`/`blank_black` swizzle commands to overwrite channels
    pub process_blanks: bool,
    /// decode texture blocks on the rayon thread pool
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            row_order: RowOrder::TopDown,
            swizzle: Swizzle::default(),
            process_blanks: false,
            parallel: true,
        }
    }
}

impl DecodeOptions {
    pub fn parse(options: &str) -> Result<DecodeOptions, toml::de::Error> {
        toml::de::from_str(options)
    }
}
