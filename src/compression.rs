use std::fmt;
use thiserror::Error;

mod lzo;
pub use lzo::{decompress_lzo, LzoDecompressor};

mod lzss;
pub use lzss::{decompress_lzss, Checksum, LzssDecompressor};

/// Output of a successful decompression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompressed {
    pub data: Vec<u8>,
    /// number of input bytes consumed, including any trailing checksum
    pub bytes_read: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    #[error("Input ended unexpectedly at offset {offset:#x}")]
    Truncated { offset: usize },
    #[error("Output overrun (free buffer: {free}, requested: {requested})")]
    OutputOverrun { free: usize, requested: usize },
    #[error("Stream produced {actual} bytes but {expected} were expected")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Invalid end of stream (expected match length: 3, got: {0})")]
    InvalidEndOfStream(usize),
    #[error("Match distance {distance} reaches before output start ({available} bytes written)")]
    LookbehindOverrun { distance: usize, available: usize },
    #[error("Backreference with zero distance at offset {offset:#x}")]
    InvalidDistance { offset: usize },
    #[error("{kind} checksum mismatch (stored: {expected:#010x}, computed: {actual:#010x})")]
    ChecksumMismatch {
        kind: Checksum,
        expected: u32,
        actual: u32,
    },
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checksum::Unsigned => f.write_str("Unsigned"),
            Checksum::Signed => f.write_str("Signed"),
        }
    }
}

/// Bounds checked cursor over a compressed region.
#[derive(Debug, Clone)]
struct Reader<'a> {
    src: &'a [u8],
    read_index: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, read_index: 0 }
    }

    fn position(&self) -> usize {
        self.read_index
    }

    fn read(&mut self) -> Result<u8, DecompressError> {
        let value = *self
            .src
            .get(self.read_index)
            .ok_or(DecompressError::Truncated {
                offset: self.read_index,
            })?;
        self.read_index += 1;

        Ok(value)
    }

    fn read_slice(&mut self, count: usize) -> Result<&'a [u8], DecompressError> {
        let end = self
            .read_index
            .checked_add(count)
            .filter(|&end| end <= self.src.len())
            .ok_or(DecompressError::Truncated {
                offset: self.read_index,
            })?;

        let slice = &self.src[self.read_index..end];
        self.read_index = end;

        Ok(slice)
    }

    fn read_u16_le(&mut self) -> Result<u16, DecompressError> {
        let lower = self.read()?;
        let upper = self.read()?;

        Ok(u16::from_le_bytes([lower, upper]))
    }

    fn read_u32_le(&mut self) -> Result<u32, DecompressError> {
        let bytes = self.read_slice(4)?;

        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Pre-sized output that never grows past the declared length.
#[derive(Debug)]
struct Output {
    dst: Vec<u8>,
    write_index: usize,
}

impl Output {
    fn new(expected_length: usize) -> Self {
        Self {
            dst: vec![0; expected_length],
            write_index: 0,
        }
    }

    fn len(&self) -> usize {
        self.write_index
    }

    fn free(&self) -> usize {
        self.dst.len() - self.write_index
    }

    fn is_full(&self) -> bool {
        self.free() == 0
    }

    fn check_free(&self, requested: usize) -> Result<(), DecompressError> {
        if requested > self.free() {
            return Err(DecompressError::OutputOverrun {
                free: self.free(),
                requested,
            });
        }

        Ok(())
    }

    fn push(&mut self, value: u8) -> Result<(), DecompressError> {
        self.check_free(1)?;

        self.dst[self.write_index] = value;
        self.write_index += 1;

        Ok(())
    }

    fn extend(&mut self, values: &[u8]) -> Result<(), DecompressError> {
        self.check_free(values.len())?;

        let end = self.write_index + values.len();
        self.dst[self.write_index..end].copy_from_slice(values);
        self.write_index = end;

        Ok(())
    }

    fn fill(&mut self, value: u8, count: usize) -> Result<(), DecompressError> {
        self.check_free(count)?;

        let end = self.write_index + count;
        self.dst[self.write_index..end].fill(value);
        self.write_index = end;

        Ok(())
    }

    /// Copies `count` bytes starting `distance` bytes behind the write position.
    ///
    /// When `count` exceeds `distance` the source range overlaps bytes written by
    /// this same copy, so the copy is done in chunks of at most `distance` bytes,
    /// tiling the pattern.
    fn copy_back(&mut self, distance: usize, count: usize) -> Result<(), DecompressError> {
        if distance == 0 || distance > self.write_index {
            return Err(DecompressError::LookbehindOverrun {
                distance,
                available: self.write_index,
            });
        }
        self.check_free(count)?;

        let mut start = self.write_index - distance;
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(distance);
            self.dst.copy_within(start..start + chunk, self.write_index);

            start += chunk;
            self.write_index += chunk;
            remaining -= chunk;
        }

        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, DecompressError> {
        if self.write_index != self.dst.len() {
            return Err(DecompressError::LengthMismatch {
                expected: self.dst.len(),
                actual: self.write_index,
            });
        }

        Ok(self.dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_copy_tiles_pattern() {
        let mut out = Output::new(11);
        out.extend(b"abc").unwrap();
        out.copy_back(3, 8).unwrap();

        assert_eq!(out.finish().unwrap(), b"abcabcabcab");
    }

    #[test]
    fn overlapping_copy_matches_reference_pattern() {
        let prefix = b"0123456789";
        for distance in 1..=prefix.len() {
            for length in 0..40 {
                let mut out = Output::new(prefix.len() + length);
                out.extend(prefix).unwrap();
                out.copy_back(distance, length).unwrap();

                let start = prefix.len() - distance;
                let mut expected = prefix.to_vec();
                for _ in 0..length / distance {
                    expected.extend_from_slice(&prefix[start..]);
                }
                expected.extend_from_slice(&prefix[start..start + length % distance]);

                assert_eq!(
                    out.finish().unwrap(),
                    expected,
                    "distance {distance}, length {length}"
                );
            }
        }
    }

    #[test]
    fn copy_beyond_output_start_fails() {
        let mut out = Output::new(8);
        out.extend(b"ab").unwrap();

        assert_eq!(
            out.copy_back(3, 1),
            Err(DecompressError::LookbehindOverrun {
                distance: 3,
                available: 2
            })
        );
    }

    #[test]
    fn writes_past_capacity_fail() {
        let mut out = Output::new(2);
        out.push(1).unwrap();

        assert_eq!(
            out.extend(&[2, 3]),
            Err(DecompressError::OutputOverrun {
                free: 1,
                requested: 2
            })
        );
    }

    #[test]
    fn reader_reports_truncation() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0201);
        assert_eq!(
            reader.read_u16_le(),
            Err(DecompressError::Truncated { offset: 3 })
        );
    }

    #[test]
    fn short_slice_reports_its_start() {
        let mut reader = Reader::new(&[1, 2, 3, 4, 5]);
        reader.read().unwrap();

        assert_eq!(reader.read_u32_le(), Ok(0x0504_0302));
        assert_eq!(
            reader.read_slice(1),
            Err(DecompressError::Truncated { offset: 5 })
        );

        let mut reader = Reader::new(&[1, 2, 3, 4, 5]);
        reader.read_u16_le().unwrap();
        assert_eq!(
            reader.read_u32_le(),
            Err(DecompressError::Truncated { offset: 2 })
        );
        assert_eq!(reader.position(), 2);
    }
}
