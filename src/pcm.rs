//! The ioplug callback set, one method per callback, driving one sndio
//! connection.

use crate::caps::{self, Capabilities};
use crate::config::PluginConfig;
use crate::error::{Error, Result};
use crate::host::{ChannelArea, Constraints, HwParams, Stream};
use crate::logging;
use crate::params::{self, Negotiated};
use crate::position::Position;
use crate::transfer;
use nix::poll::PollFlags;
use sndio_hdl::{Device, PollDesc, SIO_PLAY, SIO_REC};
use tracing::{debug, error};

pub const NAME: &str = "ALSA <-> SNDIO PCM I/O Plugin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Configured,
    Prepared,
    Running,
    Stopped,
    Draining,
}

/// One open PCM. Owns its server connection; closing or dropping the PCM
/// stops the stream and releases it.
pub struct SndioPcm<D: Device> {
    device: D,
    stream: Stream,
    state: State,
    caps: Capabilities,
    negotiated: Option<Negotiated>,
    position: Position,
    poll: PollDesc,
    started: bool,
}

impl<D: Device> std::fmt::Debug for SndioPcm<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SndioPcm")
            .field("stream", &self.stream)
            .field("state", &self.state)
            .field("caps", &self.caps)
            .field("negotiated", &self.negotiated)
            .field("position", &self.position)
            .field("poll", &self.poll)
            .field("started", &self.started)
            .finish()
    }
}

impl<D: Device> Drop for SndioPcm<D> {
    fn drop(&mut self) {
        if self.started {
            self.device.stop();
            self.started = false;
        }
    }
}

/// Server mode matching a host stream direction.
pub fn sio_mode(stream: Stream) -> u32 {
    match stream {
        Stream::Playback => SIO_PLAY,
        Stream::Capture => SIO_REC,
    }
}

#[cfg(feature = "libsndio")]
impl SndioPcm<sndio_hdl::Handle> {
    /// Connects to the configured sndio device and declares its
    /// capabilities on `io`.
    pub fn open(config: &PluginConfig, stream: Stream, io: &mut impl Constraints) -> Result<Self> {
        let device = sndio_hdl::Handle::open(config.device_name(), sio_mode(stream), true)
            .map_err(Error::NoDevice)?;
        Self::with_device(device, config, stream, io)
    }
}

impl<D: Device> SndioPcm<D> {
    /// Builds the PCM on an already connected device. On failure the device
    /// is dropped, which closes it.
    pub fn with_device(
        mut device: D,
        config: &PluginConfig,
        stream: Stream,
        io: &mut impl Constraints,
    ) -> Result<Self> {
        logging::init();

        if let Some(volume) = config.initial_volume() {
            if !device.setvol(volume) {
                error!("sndio: couldn't set initial volume");
            }
        }

        let poll = device
            .pollfd(stream.poll_events())
            .ok_or(Error::BadState("device has no pollable descriptor"))?;
        let caps = caps::negotiate(&mut device, stream, io)?;
        device.take_moved();

        debug!(
            "{NAME}: opened {} on '{}', polling fd {}",
            stream.direction(),
            config.device_name(),
            poll.fd
        );
        Ok(Self {
            device,
            stream,
            state: State::Created,
            caps,
            negotiated: None,
            position: Position::default(),
            poll,
            started: false,
        })
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn negotiated(&self) -> Option<&Negotiated> {
        self.negotiated.as_ref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn poll_descriptor(&self) -> PollDesc {
        self.poll
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn frame_bytes(&self) -> usize {
        self.negotiated.map_or(0, |n| n.frame_bytes)
    }

    fn buffer_size(&self) -> usize {
        self.negotiated.map_or(0, |n| n.buffer_size)
    }

    /// Hands the frames the server moved during the last call to the
    /// position counters.
    fn pump_moves(&mut self) {
        let delta = self.device.take_moved();
        if delta != 0 {
            self.position.on_move(delta);
        }
    }

    fn stop_device(&mut self) {
        if self.started {
            self.device.stop();
            self.started = false;
        }
    }

    pub fn hw_params(&mut self, params: &HwParams) -> Result<()> {
        if matches!(self.state, State::Running | State::Draining) {
            return Err(Error::BadState("hw_params on a running stream"));
        }
        let was_started = self.started;
        self.stop_device();
        let negotiated = match params::commit(&mut self.device, params) {
            Ok(negotiated) => negotiated,
            Err(err) => {
                // The previous parameters stay, but the server is stopped now.
                if was_started {
                    self.state = State::Stopped;
                }
                self.pump_moves();
                return Err(err);
            }
        };
        self.pump_moves();
        self.negotiated = Some(negotiated);
        self.state = State::Configured;
        Ok(())
    }

    pub fn prepare(&mut self) -> Result<()> {
        if self.negotiated.is_none() {
            return Err(Error::BadState("prepare before hw_params"));
        }
        self.stop_device();
        // Moves reported while stopping belong to the previous run.
        self.device.take_moved();
        self.position.reset();

        if !self.device.start() {
            if matches!(
                self.state,
                State::Prepared | State::Running | State::Draining
            ) {
                self.state = State::Stopped;
            }
            if self.device.eof() {
                return Err(Error::BadState("device closed"));
            }
            return Err(Error::Retry);
        }
        self.started = true;
        self.state = State::Prepared;
        self.pump_moves();
        Ok(())
    }

    /// The server starts on the first transfer after `prepare`; nothing to
    /// trigger here.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            State::Prepared | State::Running => {
                self.state = State::Running;
                Ok(())
            }
            _ => Err(Error::BadState("start before prepare")),
        }
    }

    pub fn stop(&mut self) -> Result<()> {
        self.stop_device();
        if matches!(
            self.state,
            State::Prepared | State::Running | State::Draining
        ) {
            self.state = State::Stopped;
        }
        Ok(())
    }

    /// Asks the server to stop once it has played what it holds.
    pub fn drain(&mut self) -> Result<()> {
        if self.started {
            self.device.stop();
            self.started = false;
            self.pump_moves();
        }
        if matches!(self.state, State::Prepared | State::Running) {
            self.state = State::Draining;
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        area: &mut ChannelArea<'_>,
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        if !matches!(self.state, State::Prepared | State::Running) {
            return Err(Error::BadState("transfer on a stream that is not prepared"));
        }
        let frame_bytes = self.frame_bytes();
        let moved = transfer::transfer(
            &mut self.device,
            self.stream,
            frame_bytes,
            &mut self.position,
            area,
            offset,
            frames,
        );
        self.pump_moves();
        moved
    }

    /// Lets the server process poll results and reports whether the stream
    /// is ready for the next transfer.
    pub fn poll_revents(&mut self, revents: PollFlags) -> PollFlags {
        let poll = self.poll;
        let ready = self.device.revents(&poll, revents);
        self.pump_moves();
        ready
    }

    pub fn delay(&self) -> i64 {
        self.position.delay(self.stream)
    }

    pub fn pointer(&self) -> i64 {
        self.position.pointer(self.stream, self.buffer_size())
    }

    pub fn close(mut self) {
        self.stop_device();
    }
}
