//! The sndio device protocol as seen by a client: parameter and capability
//! structures, protocol constants and the [`Device`] trait covering every
//! primitive the ALSA plugin drives.
//!
//! With the `libsndio` feature enabled, [`Handle`] implements [`Device`] on
//! top of the system library.

use nix::poll::PollFlags;
use std::os::fd::RawFd;

#[cfg(feature = "libsndio")]
mod ffi;

#[cfg(feature = "libsndio")]
pub use self::ffi::Handle;

// Modes
pub const SIO_PLAY: u32 = 0x1;
pub const SIO_REC: u32 = 0x2;

// Capability array sizes
pub const SIO_NENC: usize = 8;
pub const SIO_NCHAN: usize = 8;
pub const SIO_NRATE: usize = 16;
pub const SIO_NCONF: usize = 4;

pub const SIO_MAXVOL: u32 = 127;
pub const SIO_DEVANY: &str = "default";

#[cfg(target_endian = "little")]
pub const SIO_LE_NATIVE: bool = true;
#[cfg(target_endian = "big")]
pub const SIO_LE_NATIVE: bool = false;

/// Bytes per sample the server uses to store `bits` wide samples.
pub const fn sio_bps(bits: u32) -> u32 {
    if bits <= 8 {
        1
    } else if bits <= 16 {
        2
    } else {
        4
    }
}

/// Stream parameters, both requested and reported back by the server.
///
/// In a request, `round`, `bufsz` and `appbufsz` set to 0 leave the choice
/// to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Par {
    pub bits: u32,
    pub bps: u32,
    pub sig: bool,
    pub le: bool,
    pub msb: bool,
    pub rchan: u32,
    pub pchan: u32,
    pub rate: u32,
    pub bufsz: u32,
    pub round: u32,
    pub appbufsz: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enc {
    pub bits: u32,
    pub bps: u32,
    pub sig: bool,
    pub le: bool,
    pub msb: bool,
}

/// One supported configuration. Every field is a bitmask indexing the
/// matching table of [`Cap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conf {
    pub enc: u32,
    pub rchan: u32,
    pub pchan: u32,
    pub rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cap {
    pub enc: [Enc; SIO_NENC],
    pub rchan: [u32; SIO_NCHAN],
    pub pchan: [u32; SIO_NCHAN],
    pub rate: [u32; SIO_NRATE],
    pub confs: Vec<Conf>,
}

impl Cap {
    /// Channel counts selected by `mask` out of the record or play table.
    pub fn channels(&self, mask: u32, rec: bool) -> impl Iterator<Item = u32> + '_ {
        let table = if rec { &self.rchan } else { &self.pchan };
        masked(table, mask)
    }

    /// Sample rates selected by `mask`.
    pub fn rates(&self, mask: u32) -> impl Iterator<Item = u32> + '_ {
        masked(&self.rate, mask)
    }
}

fn masked(table: &[u32], mask: u32) -> impl Iterator<Item = u32> + '_ {
    table
        .iter()
        .enumerate()
        .filter(move |&(i, _)| mask & (1u32 << i) != 0)
        .map(|(_, &v)| v)
}

/// The descriptor a client polls on, with the events it waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDesc {
    pub fd: RawFd,
    pub events: PollFlags,
}

/// A connected sndio device.
///
/// Calls never block. Position changes the server reports while one of
/// these calls runs are accumulated by the device and handed out through
/// [`Device::take_moved`].
pub trait Device {
    fn getcap(&mut self) -> Option<Cap>;
    fn setpar(&mut self, par: &Par) -> bool;
    fn getpar(&mut self) -> Option<Par>;
    fn start(&mut self) -> bool;
    fn stop(&mut self) -> bool;
    /// Returns the number of bytes accepted, 0 when none could be.
    fn write(&mut self, buf: &[u8]) -> usize;
    /// Returns the number of bytes stored into `buf`, 0 when none were ready.
    fn read(&mut self, buf: &mut [u8]) -> usize;
    fn eof(&mut self) -> bool;
    fn setvol(&mut self, vol: u32) -> bool;
    fn pollfd(&mut self, events: PollFlags) -> Option<PollDesc>;
    fn revents(&mut self, desc: &PollDesc, revents: PollFlags) -> PollFlags;
    /// Frames the hardware moved since the previous call.
    fn take_moved(&mut self) -> i64;
}

pub fn open_error(direction: &str, device: &str, err: impl std::fmt::Display) -> String {
    format!("Failed to open sndio {direction} '{device}': {err}")
}
