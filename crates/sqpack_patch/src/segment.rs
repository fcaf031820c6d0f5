//! Writer for the appended data segment.
//!
//! A new segment starts with the header of the archive's original segment
//! (with the segment count field bumped) and is then filled with payloads,
//! each starting on an [`ALIGNMENT`] boundary so it can be addressed by a
//! packed offset.

use crate::error::{Error, Result};
use crate::locator::{align_up, ALIGNMENT};
use byteorder::{ByteOrder, LE};
use std::io::Write;

/// Size of the header block at the start of every data segment.
pub const SEGMENT_HEADER_SIZE: usize = 0x800;

/// Position of the archive's total segment count within the segment header.
pub const SEGMENT_COUNT_FIELD: usize = 0x410;

const ZERO_PADDING: [u8; ALIGNMENT as usize] = [0; ALIGNMENT as usize];

/// Append-only writer for a new data segment.
///
/// Appends must be strictly sequential; the writer tracks the cursor itself
/// and never seeks.
#[derive(Debug)]
pub struct SegmentWriter<W: Write> {
    sink: W,
    position: u64,
    payloads: usize,
}

impl<W: Write> SegmentWriter<W> {
    /// Write the segment header into `sink`.
    ///
    /// The first [`SEGMENT_HEADER_SIZE`] bytes of `template` (the original
    /// segment) are copied verbatim, except for the segment count field which
    /// is set to `segment_count`.
    pub fn initialize(template: &[u8], segment_count: u32, mut sink: W) -> Result<Self> {
        let Some(template_header) = template.get(..SEGMENT_HEADER_SIZE) else {
            return Err(Error::MalformedSegment {
                expected: SEGMENT_HEADER_SIZE,
                actual: template.len(),
            });
        };

        let mut header = template_header.to_vec();
        LE::write_u32(
            &mut header[SEGMENT_COUNT_FIELD..SEGMENT_COUNT_FIELD + 4],
            segment_count,
        );
        sink.write_all(&header)?;

        Ok(Self {
            sink,
            position: SEGMENT_HEADER_SIZE as u64,
            payloads: 0,
        })
    }

    /// Append `payload` and return the byte offset it was written at.
    ///
    /// Zero padding is inserted first if the cursor is not aligned, so the
    /// returned offset is always a multiple of [`ALIGNMENT`].
    pub fn append(&mut self, payload: &[u8]) -> Result<u64> {
        let aligned = align_up(self.position);
        let padding = (aligned - self.position) as usize;
        if padding > 0 {
            self.sink.write_all(&ZERO_PADDING[..padding])?;
        }

        self.sink.write_all(payload)?;
        self.position = aligned + payload.len() as u64;
        self.payloads += 1;

        Ok(aligned)
    }

    /// Current end of the segment (header plus payloads and padding).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of payloads appended so far.
    pub fn payload_count(&self) -> usize {
        self.payloads
    }

    /// Flush and return the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
