//! Turns what the sndio server reports into the hardware parameter space
//! the host may choose from.

use crate::error::{Error, Result};
use crate::format::host_format;
use crate::host::{Access, Constraints, Format, HwParam, Stream};
use sndio_hdl::{Cap, Device};
use tracing::debug;

pub static ACCESS: [Access; 1] = [Access::RwInterleaved];

// TODO: add S243LE/S243BE once packed 3 byte samples can be handed to the server.
pub static FORMATS: [Format; 7] = [
    Format::S32LE,
    Format::S32BE,
    Format::S24LE,
    Format::S24BE,
    Format::S16LE,
    Format::S16BE,
    Format::U8,
];

pub const BUFFER_BYTES_MIN: u32 = 64;
pub const BUFFER_BYTES_MAX: u32 = 4 * 1024 * 1024;
pub const PERIOD_BYTES_MIN: u32 = 64;
pub const PERIOD_BYTES_MAX: u32 = 2 * 1024 * 1024;
pub const PERIODS_MIN: u32 = 1;
pub const PERIODS_MAX: u32 = 2048;

/// Channel counts and rates the server offers for one stream direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub channels: Vec<u32>,
    pub rates: Vec<u32>,
}

impl Capabilities {
    /// Collects the channel counts and rates of every configuration in
    /// `cap`, looking at the record tables for capture streams.
    pub fn from_cap(cap: &Cap, stream: Stream) -> Result<Self> {
        if cap.confs.is_empty() {
            return Err(Error::InvalidCapabilities("device reports no configurations"));
        }
        let rec = stream == Stream::Capture;

        let mut channels: Vec<u32> = cap
            .confs
            .iter()
            .flat_map(move |conf| {
                let mask = if rec { conf.rchan } else { conf.pchan };
                cap.channels(mask, rec)
            })
            .filter(|&n| n > 0)
            .collect();
        channels.sort_unstable();
        channels.dedup();

        let mut rates: Vec<u32> = cap
            .confs
            .iter()
            .flat_map(move |conf| cap.rates(conf.rate))
            .filter(|&r| r > 0)
            .collect();
        rates.sort_unstable();
        rates.dedup();

        if channels.is_empty() {
            return Err(Error::InvalidCapabilities("no usable channel count"));
        }
        if rates.is_empty() {
            return Err(Error::InvalidCapabilities("no usable sample rate"));
        }
        Ok(Self { channels, rates })
    }

    /// Declares the whole parameter space to the host.
    pub fn constrain(&self, io: &mut impl Constraints) -> Result<()> {
        let access: Vec<u32> = ACCESS.iter().map(|a| *a as u32).collect();
        io.set_param_list(HwParam::Access, &access)?;

        let formats: Vec<u32> = FORMATS.iter().map(|f| f.raw()).collect();
        io.set_param_list(HwParam::Format, &formats)?;

        io.set_param_list(HwParam::Channels, &self.channels)?;
        io.set_param_list(HwParam::Rate, &self.rates)?;

        io.set_param_minmax(HwParam::BufferBytes, BUFFER_BYTES_MIN, BUFFER_BYTES_MAX)?;
        io.set_param_minmax(HwParam::PeriodBytes, PERIOD_BYTES_MIN, PERIOD_BYTES_MAX)?;
        io.set_param_minmax(HwParam::Periods, PERIODS_MIN, PERIODS_MAX)?;
        Ok(())
    }
}

/// Queries `device` and declares the resulting constraints on `io`.
pub fn negotiate<D: Device>(
    device: &mut D,
    stream: Stream,
    io: &mut impl Constraints,
) -> Result<Capabilities> {
    let cap = device
        .getcap()
        .ok_or(Error::InvalidCapabilities("sio_getcap failed"))?;
    let caps = Capabilities::from_cap(&cap, stream)?;

    let native: Vec<Format> = cap
        .confs
        .iter()
        .flat_map(|conf| {
            cap.enc
                .iter()
                .enumerate()
                .filter(move |&(i, _)| conf.enc & (1u32 << i) != 0)
                .filter_map(|(_, e)| host_format(e.bits, e.sig, e.le))
        })
        .collect();
    debug!(
        "sndio {} capabilities: channels {:?}, rates {:?}, native formats {:?}",
        stream.direction(),
        caps.channels,
        caps.rates,
        native
    );

    caps.constrain(io)?;
    Ok(caps)
}
