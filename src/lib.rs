//! ALSA PCM I/O plugin backed by a sndio server.
//!
//! [`SndioPcm`] implements the ioplug callbacks (`hw_params`, `prepare`,
//! `start`, `stop`, `drain`, `transfer`, `pointer`, `delay`, `close`) over a
//! [`sndio_hdl::Device`]. Samples pass through untouched: the host may only
//! choose formats, channel counts and rates the server stores as-is.

pub mod caps;
pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod logging;
pub mod params;
pub mod pcm;
pub mod position;
pub mod transfer;

pub use config::PluginConfig;
pub use error::{Error, Result};
pub use host::{ChannelArea, Format, HwParams, Stream};
pub use pcm::{SndioPcm, State};
