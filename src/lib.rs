pub mod compression;
pub use compression::{
    decompress_lzo, decompress_lzss, Checksum, DecompressError, Decompressed, LzoDecompressor,
    LzssDecompressor,
};

mod options;
pub use options::{DecodeOptions, RowOrder};

pub mod texture;
pub use texture::{decode_dxt1, decode_dxt5, decode_texture, PixelFormat, RgbaBuffer, TextureError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to decompress data")]
    Decompress(#[from] DecompressError),
    #[error("Failed to decode texture")]
    Texture(#[from] TextureError),
    #[error("Invalid decode options")]
    Options(#[from] toml::de::Error),
}
