//! RIFF/WAVE clips
//!
//! Clips are uncompressed PCM, 8- or 16-bit, mono or stereo. The header is
//! parsed from the first sector of the file; sample data is then streamed
//! and packed into 32-bit I2S frames (left in the upper half-word).

/// Bytes of file read to locate the data chunk
pub const HEADER_WINDOW: usize = 512;

const FORMAT_PCM: u16 = 1;

/// WAV parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WavError {
    /// Missing "RIFF" magic
    NotRiff,
    /// RIFF container that is not "WAVE"
    NotWave,
    /// Compressed, or an unsupported channel count or sample width
    UnsupportedFormat,
    /// Chunk ran past the end of the header window
    Truncated,
    /// No "fmt " chunk before the data
    MissingFormat,
    /// No "data" chunk within the header window
    MissingData,
}

/// PCM layout of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Bytes per interleaved frame
    pub fn block_align(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }
}

/// Parsed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavHeader {
    pub format: WavFormat,
    /// File offset of the first sample byte
    pub data_offset: u32,
    /// Length of the sample data in bytes
    pub data_len: u32,
}

impl WavHeader {
    /// Playback length in milliseconds
    pub fn duration_ms(&self) -> u32 {
        let bytes_per_sec = self.format.block_align() as u64 * u64::from(self.format.sample_rate);
        if bytes_per_sec == 0 {
            return 0;
        }
        (u64::from(self.data_len) * 1000 / bytes_per_sec) as u32
    }
}

fn u16_at(bytes: &[u8], at: usize) -> Result<u16, WavError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(WavError::Truncated)
}

fn u32_at(bytes: &[u8], at: usize) -> Result<u32, WavError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(WavError::Truncated)
}

fn parse_format(chunk: &[u8]) -> Result<WavFormat, WavError> {
    let audio_format = u16_at(chunk, 0)?;
    let format = WavFormat {
        channels: u16_at(chunk, 2)?,
        sample_rate: u32_at(chunk, 4)?,
        bits_per_sample: u16_at(chunk, 14)?,
    };
    let supported = audio_format == FORMAT_PCM
        && matches!(format.channels, 1 | 2)
        && matches!(format.bits_per_sample, 8 | 16)
        && format.sample_rate > 0;
    if !supported {
        return Err(WavError::UnsupportedFormat);
    }
    Ok(format)
}

/// Index just past a `size`-byte chunk body starting at `body`
///
/// Computed in 32 bits like the RIFF sizes themselves, so a corrupt size
/// is rejected instead of wrapping the index.
fn body_end(body: usize, size: u32) -> Result<usize, WavError> {
    u32::try_from(body)
        .ok()
        .and_then(|start| start.checked_add(size))
        .and_then(|end| usize::try_from(end).ok())
        .ok_or(WavError::Truncated)
}

/// Parse the header from the start of a file
///
/// Chunks other than "fmt " and "data" (LIST, fact, ...) are skipped. The
/// data length is clamped to what the RIFF size says the file holds.
pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, WavError> {
    if bytes.get(0..4) != Some(b"RIFF".as_slice()) {
        return Err(WavError::NotRiff);
    }
    let riff_end = u32_at(bytes, 4)?.saturating_add(8);
    if bytes.get(8..12) != Some(b"WAVE".as_slice()) {
        return Err(WavError::NotWave);
    }

    let mut format = None;
    let mut at = 12usize;
    while bytes.len().saturating_sub(at) >= 8 {
        let id = &bytes[at..at + 4];
        let size = u32_at(bytes, at + 4)?;
        let body = at + 8;
        match id {
            b"fmt " => {
                let chunk = bytes.get(body..body_end(body, size)?).ok_or(WavError::Truncated)?;
                format = Some(parse_format(chunk)?);
            }
            b"data" => {
                let format = format.ok_or(WavError::MissingFormat)?;
                let available = riff_end.saturating_sub(body as u32);
                return Ok(WavHeader {
                    format,
                    data_offset: body as u32,
                    data_len: size.min(available),
                });
            }
            _ => {}
        }
        // Chunks are word aligned
        let padded = size.checked_add(size & 1).ok_or(WavError::Truncated)?;
        at = body_end(body, padded)?;
    }
    Err(WavError::MissingData)
}

/// Pack PCM bytes into stereo I2S frames
///
/// Mono is duplicated to both channels; 8-bit unsigned samples are
/// re-centred to signed 16-bit. Returns `(bytes consumed, frames written)`;
/// a trailing partial frame is left unconsumed.
pub fn pack_frames(format: &WavFormat, pcm: &[u8], out: &mut [u32]) -> (usize, usize) {
    let align = format.block_align();
    if align == 0 {
        return (0, 0);
    }
    let mut written = 0;
    for (frame, slot) in pcm.chunks_exact(align).zip(out.iter_mut()) {
        let (left, right) = match (format.bits_per_sample, format.channels) {
            (16, 2) => (
                i16::from_le_bytes([frame[0], frame[1]]),
                i16::from_le_bytes([frame[2], frame[3]]),
            ),
            (16, _) => {
                let s = i16::from_le_bytes([frame[0], frame[1]]);
                (s, s)
            }
            (_, 2) => (widen_u8(frame[0]), widen_u8(frame[1])),
            _ => {
                let s = widen_u8(frame[0]);
                (s, s)
            }
        };
        *slot = (u32::from(left as u16) << 16) | u32::from(right as u16);
        written += 1;
    }
    (written * align, written)
}

fn widen_u8(sample: u8) -> i16 {
    (i16::from(sample) - 128) << 8
}

/// Nearest-neighbour rate conversion onto a fixed output rate
///
/// The I2S clock runs at one rate for every clip; frames are repeated or
/// skipped to match. Phase is carried across calls so block boundaries
/// don't drift.
#[derive(Debug, Clone, Copy)]
pub struct RateConverter {
    /// Source frames per output frame, 16.16 fixed point
    step: u32,
    phase: u32,
}

impl RateConverter {
    pub fn new(source_rate: u32, output_rate: u32) -> Self {
        let step = (u64::from(source_rate) << 16) / u64::from(output_rate.max(1));
        Self {
            step: step.clamp(1, u64::from(u32::MAX)) as u32,
            phase: 0,
        }
    }

    /// Resample `input` into `out`; returns `(frames consumed, frames written)`
    pub fn convert(&mut self, input: &[u32], out: &mut [u32]) -> (usize, usize) {
        let mut written = 0;
        for slot in out.iter_mut() {
            let index = (self.phase >> 16) as usize;
            match input.get(index) {
                Some(&frame) => *slot = frame,
                None => break,
            }
            self.phase += self.step;
            written += 1;
        }
        let consumed = ((self.phase >> 16) as usize).min(input.len());
        self.phase -= (consumed as u32) << 16;
        (consumed, written)
    }
}

/// Bytes pulled from storage per read
pub const READ_CHUNK: usize = 512;

const STAGED_FRAMES: usize = READ_CHUNK / 2;

/// Pull-based decoder from clip bytes to output-rate I2S frames
///
/// Storage access is left to the caller: [`fill`](Self::fill) takes a read
/// function that copies the next bytes of sample data into a buffer and
/// returns how many it wrote (0 at end of file or on error).
pub struct ClipStream {
    format: WavFormat,
    remaining: u32,
    converter: RateConverter,
    pcm: [u8; READ_CHUNK],
    pcm_pos: usize,
    pcm_len: usize,
    staged: [u32; STAGED_FRAMES],
    staged_pos: usize,
    staged_len: usize,
}

impl ClipStream {
    pub fn new(header: &WavHeader, output_rate: u32) -> Self {
        Self {
            format: header.format,
            remaining: header.data_len,
            converter: RateConverter::new(header.format.sample_rate, output_rate),
            pcm: [0; READ_CHUNK],
            pcm_pos: 0,
            pcm_len: 0,
            staged: [0; STAGED_FRAMES],
            staged_pos: 0,
            staged_len: 0,
        }
    }

    /// Sample bytes not yet read from storage
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Fill `out` with frames; returns how many were written
    ///
    /// Fewer than `out.len()` means the clip has ended.
    pub fn fill<R>(&mut self, mut read: R, out: &mut [u32]) -> usize
    where
        R: FnMut(&mut [u8]) -> usize,
    {
        let mut written = 0;
        while written < out.len() {
            if self.staged_pos == self.staged_len && !self.stage(&mut read) {
                break;
            }
            let (used, produced) = self
                .converter
                .convert(&self.staged[self.staged_pos..self.staged_len], &mut out[written..]);
            self.staged_pos += used;
            written += produced;
        }
        written
    }

    /// Decode the next run of frames; false at end of data
    fn stage<R: FnMut(&mut [u8]) -> usize>(&mut self, read: &mut R) -> bool {
        loop {
            if self.pcm_pos == self.pcm_len {
                let want = (self.remaining as usize).min(READ_CHUNK);
                if want == 0 {
                    return false;
                }
                let got = read(&mut self.pcm[..want]).min(want);
                if got == 0 {
                    self.remaining = 0;
                    return false;
                }
                self.remaining -= got as u32;
                self.pcm_pos = 0;
                self.pcm_len = got;
            }
            let (used, frames) = pack_frames(&self.format, &self.pcm[self.pcm_pos..self.pcm_len], &mut self.staged);
            if frames == 0 {
                // Partial frame at the end of a read; carry it into the next one
                let tail = self.pcm_len - self.pcm_pos;
                self.pcm.copy_within(self.pcm_pos..self.pcm_len, 0);
                let want = (self.remaining as usize).min(READ_CHUNK - tail);
                let got = if want == 0 { 0 } else { read(&mut self.pcm[tail..tail + want]).min(want) };
                if got == 0 {
                    self.remaining = 0;
                    self.pcm_pos = self.pcm_len;
                    return false;
                }
                self.remaining -= got as u32;
                self.pcm_pos = 0;
                self.pcm_len = tail + got;
                continue;
            }
            self.pcm_pos += used;
            self.staged_pos = 0;
            self.staged_len = frames;
            return true;
        }
    }
}
