//! The ALSA ioplug side of the plugin: the values the host hands us and the
//! calls we use to declare which hardware parameters it may pick.

use nix::errno::Errno;
use nix::poll::PollFlags;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Playback,
    Capture,
}

impl Stream {
    /// Readiness the host has to wait for before calling `transfer`.
    pub fn poll_events(self) -> PollFlags {
        match self {
            Stream::Playback => PollFlags::POLLOUT,
            Stream::Capture => PollFlags::POLLIN,
        }
    }

    pub fn direction(self) -> &'static str {
        match self {
            Stream::Playback => "playback",
            Stream::Capture => "capture",
        }
    }
}

/// `snd_pcm_format_t`, with the host's numeric codes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum Format {
    S8 = 0,
    U8 = 1,
    S16LE = 2,
    S16BE = 3,
    U16LE = 4,
    U16BE = 5,
    S24LE = 6,
    S24BE = 7,
    U24LE = 8,
    U24BE = 9,
    S32LE = 10,
    S32BE = 11,
    U32LE = 12,
    U32BE = 13,
    FloatLE = 14,
    FloatBE = 15,
    Float64LE = 16,
    Float64BE = 17,
    MuLaw = 20,
    ALaw = 21,
    S20LE = 25,
    S20BE = 26,
    S243LE = 32,
    S243BE = 33,
    U243LE = 34,
    U243BE = 35,
}

impl Format {
    const ALL: [Format; 26] = [
        Format::S8,
        Format::U8,
        Format::S16LE,
        Format::S16BE,
        Format::U16LE,
        Format::U16BE,
        Format::S24LE,
        Format::S24BE,
        Format::U24LE,
        Format::U24BE,
        Format::S32LE,
        Format::S32BE,
        Format::U32LE,
        Format::U32BE,
        Format::FloatLE,
        Format::FloatBE,
        Format::Float64LE,
        Format::Float64BE,
        Format::MuLaw,
        Format::ALaw,
        Format::S20LE,
        Format::S20BE,
        Format::S243LE,
        Format::S243BE,
        Format::U243LE,
        Format::U243BE,
    ];

    pub fn from_raw(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| *f as i32 == code)
    }

    pub fn raw(self) -> u32 {
        self as i32 as u32
    }

    /// Bits one sample occupies in memory, padding included.
    pub fn physical_width(self) -> u32 {
        match self {
            Format::S8 | Format::U8 | Format::MuLaw | Format::ALaw => 8,
            Format::S16LE | Format::S16BE | Format::U16LE | Format::U16BE => 16,
            Format::S243LE | Format::S243BE | Format::U243LE | Format::U243BE => 24,
            Format::Float64LE | Format::Float64BE => 64,
            _ => 32,
        }
    }
}

/// `snd_pcm_access_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Access {
    MmapInterleaved = 0,
    MmapNoninterleaved = 1,
    MmapComplex = 2,
    RwInterleaved = 3,
    RwNoninterleaved = 4,
}

/// The `SND_PCM_IOPLUG_HW_*` parameters a plugin may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HwParam {
    Access,
    Format,
    Channels,
    BufferBytes,
    PeriodBytes,
    Periods,
    Rate,
}

/// Capability declaration calls offered by the host while the plugin is
/// being created.
pub trait Constraints {
    fn set_param_list(&mut self, param: HwParam, list: &[u32]) -> Result<(), Errno>;
    fn set_param_minmax(&mut self, param: HwParam, min: u32, max: u32) -> Result<(), Errno>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRange {
    List(Vec<u32>),
    MinMax(u32, u32),
}

impl ParamRange {
    pub fn allows(&self, value: u32) -> bool {
        match self {
            ParamRange::List(list) => list.contains(&value),
            ParamRange::MinMax(min, max) => (*min..=*max).contains(&value),
        }
    }
}

/// Records declared constraints the way the host's hw_params refinement
/// sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamTable {
    ranges: BTreeMap<HwParam, ParamRange>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: HwParam) -> Option<&ParamRange> {
        self.ranges.get(&param)
    }

    pub fn list(&self, param: HwParam) -> Option<&[u32]> {
        match self.ranges.get(&param)? {
            ParamRange::List(list) => Some(list),
            ParamRange::MinMax(..) => None,
        }
    }

    /// Unconstrained parameters allow any value.
    pub fn allows(&self, param: HwParam, value: u32) -> bool {
        self.ranges.get(&param).is_none_or(|r| r.allows(value))
    }
}

impl Constraints for ParamTable {
    fn set_param_list(&mut self, param: HwParam, list: &[u32]) -> Result<(), Errno> {
        if list.is_empty() {
            return Err(Errno::EINVAL);
        }
        let mut list = list.to_vec();
        list.sort_unstable();
        list.dedup();
        self.ranges.insert(param, ParamRange::List(list));
        Ok(())
    }

    fn set_param_minmax(&mut self, param: HwParam, min: u32, max: u32) -> Result<(), Errno> {
        if min > max {
            return Err(Errno::EINVAL);
        }
        self.ranges.insert(param, ParamRange::MinMax(min, max));
        Ok(())
    }
}

/// Hardware parameters the host settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwParams {
    pub format: Format,
    pub channels: u32,
    pub rate: u32,
    /// Ring buffer size in frames.
    pub buffer_size: usize,
    pub period_size: Option<usize>,
}

/// One `snd_pcm_channel_area_t` over the host's ring buffer. `first` and
/// `step` are in bits, as the host gives them.
#[derive(Debug)]
pub struct ChannelArea<'a> {
    pub buf: &'a mut [u8],
    pub first: usize,
    pub step: usize,
}

impl<'a> ChannelArea<'a> {
    /// Area for interleaved frames of `frame_bytes` bytes starting at the
    /// beginning of `buf`.
    pub fn interleaved(buf: &'a mut [u8], frame_bytes: usize) -> Self {
        Self {
            buf,
            first: 0,
            step: frame_bytes * 8,
        }
    }

    /// Byte range covering `len` bytes from frame `offset`.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let start = self.step.checked_mul(offset)?.checked_add(self.first)? / 8;
        let end = start.checked_add(len)?;
        self.buf.get_mut(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_codes_round_trip_through_raw() {
        assert_eq!(Format::from_raw(2), Some(Format::S16LE));
        assert_eq!(Format::from_raw(32), Some(Format::S243LE));
        assert_eq!(Format::from_raw(30), None);
        assert_eq!(Format::S32BE.raw(), 11);
    }

    #[test]
    fn physical_width_counts_padding() {
        assert_eq!(Format::U8.physical_width(), 8);
        assert_eq!(Format::S16BE.physical_width(), 16);
        assert_eq!(Format::S24LE.physical_width(), 32);
        assert_eq!(Format::S243LE.physical_width(), 24);
        assert_eq!(Format::Float64LE.physical_width(), 64);
    }

    #[test]
    fn param_table_rejects_empty_lists_and_inverted_ranges() {
        let mut table = ParamTable::new();
        assert_eq!(table.set_param_list(HwParam::Rate, &[]), Err(Errno::EINVAL));
        assert_eq!(
            table.set_param_minmax(HwParam::Periods, 8, 2),
            Err(Errno::EINVAL)
        );
        assert!(table.get(HwParam::Rate).is_none());
        assert!(table.allows(HwParam::Rate, 12345));
    }

    #[test]
    fn param_table_sorts_lists() {
        let mut table = ParamTable::new();
        table
            .set_param_list(HwParam::Channels, &[6, 2, 1, 2])
            .unwrap();
        assert_eq!(table.list(HwParam::Channels), Some(&[1, 2, 6][..]));
        assert!(table.allows(HwParam::Channels, 6));
        assert!(!table.allows(HwParam::Channels, 4));
    }

    #[test]
    fn area_addresses_frames() {
        let mut buf = vec![0_u8; 64];
        let mut area = ChannelArea::interleaved(&mut buf, 4);
        assert_eq!(area.bytes_mut(2, 8).map(|b| b.len()), Some(8));
        assert!(area.bytes_mut(15, 4).is_some());
        assert!(area.bytes_mut(15, 8).is_none());

        let mut area = ChannelArea {
            buf: &mut buf,
            first: 16,
            step: 32,
        };
        let slice = area.bytes_mut(1, 2).unwrap();
        slice[0] = 0xaa;
        assert_eq!(buf[6], 0xaa);
    }
}
