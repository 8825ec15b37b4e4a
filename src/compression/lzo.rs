use super::{DecompressError, Decompressed, Output, Reader};

/// Distance marking the end of the stream when paired with a match length of 3.
const END_OF_STREAM_DISTANCE: usize = 16384;

/// Context carried from one command to the next.
///
/// Small command values (0..=15) mean different things depending on what the
/// previous command left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// previous command was a match without trailing literals (or nothing was decoded yet)
    Match,
    /// previous match was followed by 1 to 3 literal bytes
    ShortLiterals(u8),
    /// previous command copied a run of at least 4 literals
    LongLiterals,
}

impl State {
    fn after_match(trailing: u8) -> Self {
        match trailing {
            0 => Self::Match,
            n => Self::ShortLiterals(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    /// copy `length` bytes verbatim from the input
    Literal { length: usize },
    /// copy `length` bytes from `distance` bytes back, then `trailing` literal bytes
    Match {
        distance: usize,
        length: usize,
        trailing: u8,
    },
    Exit,
}

impl Operation {
    fn decode(op: u8, state: State, reader: &mut Reader) -> Result<Self, DecompressError> {
        let operation = match op {
            n @ 0x00..=0x0f => match state {
                State::Match => Self::Literal {
                    length: 3 + Self::extended_length(n, 0x0f, reader)?,
                },
                State::ShortLiterals(_) => Self::decode_match_recent(n, 1, 2, reader)?,
                State::LongLiterals => Self::decode_match_recent(n, 2049, 3, reader)?,
            },

            n @ 0x10..=0x1f => Self::decode_match_far(n, reader)?,
            n @ 0x20..=0x3f => Self::decode_match_medium(n, reader)?,

            n @ 0x40..=0x7f => {
                Self::decode_match_short(n, 3 + ((n as usize >> 5) & 0x01), reader)?
            }
            n @ 0x80..=0xff => {
                Self::decode_match_short(n, 5 + ((n as usize >> 5) & 0x03), reader)?
            }
        };

        Ok(operation)
    }

    /// Length field of `op` masked by `mask`; a zero field is followed by an
    /// escaped extension where every zero byte adds 255 and the first nonzero
    /// byte terminates.
    fn extended_length(op: u8, mask: u8, reader: &mut Reader) -> Result<usize, DecompressError> {
        let length = (op & mask) as usize;
        if length != 0 {
            return Ok(length);
        }

        let mut extension = 0usize;
        loop {
            let value = reader.read()?;
            if value != 0 {
                return Ok(extension.saturating_add(mask as usize + value as usize));
            }

            extension = extension.saturating_add(255);
        }
    }

    fn decode_match_recent(
        op: u8,
        base: usize,
        length: usize,
        reader: &mut Reader,
    ) -> Result<Self, DecompressError> {
        let upper = reader.read()? as usize;

        Ok(Self::Match {
            distance: (upper << 2) + (op as usize >> 2) + base,
            length,
            trailing: op & 0x03,
        })
    }

    fn decode_match_short(
        op: u8,
        length: usize,
        reader: &mut Reader,
    ) -> Result<Self, DecompressError> {
        let upper = reader.read()? as usize;

        Ok(Self::Match {
            distance: (upper << 3) + ((op as usize >> 2) & 0x07) + 1,
            length,
            trailing: op & 0x03,
        })
    }

    fn decode_match_medium(op: u8, reader: &mut Reader) -> Result<Self, DecompressError> {
        let length = 2 + Self::extended_length(op, 0x1f, reader)?;
        let extra = reader.read_u16_le()?;

        Ok(Self::Match {
            distance: (extra as usize >> 2) + 1,
            length,
            trailing: (extra & 0x03) as u8,
        })
    }

    fn decode_match_far(op: u8, reader: &mut Reader) -> Result<Self, DecompressError> {
        let length = 2 + Self::extended_length(op, 0x07, reader)?;
        let extra = reader.read_u16_le()?;

        let distance =
            END_OF_STREAM_DISTANCE + ((op as usize & 0x08) << 11) + (extra as usize >> 2);
        if distance == END_OF_STREAM_DISTANCE {
            if length != 3 {
                return Err(DecompressError::InvalidEndOfStream(length));
            }

            return Ok(Self::Exit);
        }

        Ok(Self::Match {
            distance,
            length,
            trailing: (extra & 0x03) as u8,
        })
    }
}

/// Decompressor for the LZO1X byte-command stream.
///
/// The stream carries no length of its own, the caller has to know how many
/// bytes it decompresses to.
#[derive(Debug)]
pub struct LzoDecompressor<'a> {
    reader: Reader<'a>,
    dst: Output,
    state: State,
}

impl<'a> LzoDecompressor<'a> {
    pub fn new(src: &'a [u8], expected_length: usize) -> Self {
        Self {
            reader: Reader::new(src),
            dst: Output::new(expected_length),
            state: State::Match,
        }
    }

    pub fn decompress(mut self) -> Result<Decompressed, DecompressError> {
        let mut op = self.reader.read()?;

        // nothing to match against yet, so values above 17 encode a plain literal run
        if op > 17 {
            let length = (op - 17) as usize;
            self.copy_literals(length)?;
            self.state = if length >= 4 {
                State::LongLiterals
            } else {
                State::ShortLiterals(length as u8)
            };

            op = self.reader.read()?;
        }

        loop {
            let operation = Operation::decode(op, self.state, &mut self.reader)?;
            log::trace!("operation: {:?}", operation);

            match operation {
                Operation::Literal { length } => {
                    self.copy_literals(length)?;
                    self.state = State::LongLiterals;
                }
                Operation::Match {
                    distance,
                    length,
                    trailing,
                } => {
                    self.dst.copy_back(distance, length)?;
                    self.copy_literals(trailing as usize)?;
                    self.state = State::after_match(trailing);
                }
                Operation::Exit => break,
            }

            op = self.reader.read()?;
        }

        let bytes_read = self.reader.position();
        let data = self.dst.finish()?;
        log::debug!(
            "decompressed {} bytes of LZO data into {} bytes",
            bytes_read,
            data.len()
        );

        Ok(Decompressed { data, bytes_read })
    }

    fn copy_literals(&mut self, length: usize) -> Result<(), DecompressError> {
        self.dst.check_free(length)?;
        let literals = self.reader.read_slice(length)?;
        self.dst.extend(literals)
    }
}

/// Decompresses an LZO1X stream that is known to expand to `expected_length` bytes.
pub fn decompress_lzo(src: &[u8], expected_length: usize) -> Result<Decompressed, DecompressError> {
    LzoDecompressor::new(src, expected_length).decompress()
}
