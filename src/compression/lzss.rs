use super::{DecompressError, Decompressed, Output, Reader};

/// Byte produced for the part of a backreference that reaches before the
/// start of the output.
const FILLER: u8 = 0x20;

const MIN_MATCH_LENGTH: usize = 3;

/// Flavour of the additive checksum trailing an LZSS stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Checksum {
    /// sum of all output bytes as unsigned values, modulo 2^32
    #[default]
    Unsigned,
    /// sum of all output bytes as signed values, folded into an `i32`
    Signed,
}

impl Checksum {
    pub fn compute(self, data: &[u8]) -> u32 {
        match self {
            Checksum::Unsigned => data
                .iter()
                .fold(0u32, |sum, &value| sum.wrapping_add(value as u32)),
            Checksum::Signed => data
                .iter()
                .fold(0i32, |sum, &value| sum.wrapping_add(value as i8 as i32))
                as u32,
        }
    }
}

/// Decompressor for the flag-byte LZSS stream.
///
/// Every flag byte governs the next 8 units, least significant bit first: a set
/// bit is one literal byte, a clear bit a two byte backreference.
#[derive(Debug)]
pub struct LzssDecompressor<'a> {
    reader: Reader<'a>,
    dst: Output,
    checksum: Checksum,
}

impl<'a> LzssDecompressor<'a> {
    pub fn new(src: &'a [u8], expected_length: usize, checksum: Checksum) -> Self {
        Self {
            reader: Reader::new(src),
            dst: Output::new(expected_length),
            checksum,
        }
    }

    pub fn decompress(mut self) -> Result<Decompressed, DecompressError> {
        while !self.dst.is_full() {
            let flags = self.reader.read()?;

            for bit in 0..8 {
                if self.dst.is_full() {
                    break;
                }

                if flags & (1 << bit) != 0 {
                    let value = self.reader.read()?;
                    self.dst.push(value)?;
                } else {
                    self.copy_backref()?;
                }
            }
        }

        let expected = self.reader.read_u32_le()?;
        let bytes_read = self.reader.position();
        let data = self.dst.finish()?;

        let actual = self.checksum.compute(&data);
        if actual != expected {
            return Err(DecompressError::ChecksumMismatch {
                kind: self.checksum,
                expected,
                actual,
            });
        }

        log::debug!(
            "decompressed {} bytes of LZSS data into {} bytes",
            bytes_read,
            data.len()
        );

        Ok(Decompressed { data, bytes_read })
    }

    fn copy_backref(&mut self) -> Result<(), DecompressError> {
        let offset = self.reader.position();
        let lower = self.reader.read()? as usize;
        let upper = self.reader.read()? as usize;

        let distance = lower | ((upper & 0xf0) << 4);
        if distance == 0 {
            return Err(DecompressError::InvalidDistance { offset });
        }

        // the stream ends as soon as the output is complete, even mid-match
        let mut length = ((upper & 0x0f) + MIN_MATCH_LENGTH).min(self.dst.free());
        log::trace!("backref: distance {}, length {}", distance, length);

        if distance > self.dst.len() {
            let filler = (distance - self.dst.len()).min(length);
            self.dst.fill(FILLER, filler)?;
            length -= filler;
            if length == 0 {
                return Ok(());
            }
        }

        self.dst.copy_back(distance, length)
    }
}

/// Decompresses an LZSS stream of `expected_length` bytes and verifies its
/// trailing checksum.
pub fn decompress_lzss(
    src: &[u8],
    expected_length: usize,
    checksum: Checksum,
) -> Result<Decompressed, DecompressError> {
    LzssDecompressor::new(src, expected_length, checksum).decompress()
}
