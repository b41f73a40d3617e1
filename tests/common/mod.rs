#![allow(dead_code)]

use alsa_sndio::host::ParamTable;
use alsa_sndio::{Format, HwParams, PluginConfig, SndioPcm, Stream};
use nix::poll::PollFlags;
use sndio_hdl::{Cap, Conf, Device, Par, PollDesc};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const POLL_FD: i32 = 7;

/// Scripted server state shared between a test and its [`MockDevice`].
#[derive(Debug)]
pub struct MockState {
    pub cap: Option<Cap>,
    pub setpar_ok: bool,
    pub start_ok: bool,
    pub setvol_ok: bool,
    pub eof: bool,
    /// Applied to the requested parameters before `getpar` reports them.
    pub adjust: Option<fn(&mut Par)>,
    /// Byte counts the next reads or writes accept; all bytes once empty.
    pub accept: VecDeque<usize>,
    /// Move reported during the next server call.
    pub queued_move: i64,
    delivered: i64,
    pub par: Option<Par>,
    pub setpar_calls: usize,
    pub getpar_calls: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub write_calls: usize,
    pub read_calls: usize,
    pub volumes: Vec<u32>,
    pub written: Vec<u8>,
    pub closed: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            cap: Some(default_cap()),
            setpar_ok: true,
            start_ok: true,
            setvol_ok: true,
            eof: false,
            adjust: None,
            accept: VecDeque::new(),
            queued_move: 0,
            delivered: 0,
            par: None,
            setpar_calls: 0,
            getpar_calls: 0,
            start_calls: 0,
            stop_calls: 0,
            write_calls: 0,
            read_calls: 0,
            volumes: Vec::new(),
            written: Vec::new(),
            closed: false,
        }
    }
}

impl MockState {
    fn deliver(&mut self) {
        self.delivered += self.queued_move;
        self.queued_move = 0;
    }

    fn accepted(&mut self, len: usize) -> usize {
        self.accept.pop_front().unwrap_or(len).min(len)
    }
}

pub type Shared = Rc<RefCell<MockState>>;

#[derive(Debug)]
pub struct MockDevice {
    state: Shared,
}

impl MockDevice {
    pub fn new(state: &Shared) -> Self {
        Self {
            state: Rc::clone(state),
        }
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

impl Device for MockDevice {
    fn getcap(&mut self) -> Option<Cap> {
        self.state.borrow().cap.clone()
    }

    fn setpar(&mut self, par: &Par) -> bool {
        let mut s = self.state.borrow_mut();
        s.setpar_calls += 1;
        s.par = Some(*par);
        s.setpar_ok
    }

    fn getpar(&mut self) -> Option<Par> {
        let mut s = self.state.borrow_mut();
        s.getpar_calls += 1;
        let mut par = s.par?;
        if par.round == 0 {
            par.round = 480;
        }
        par.bufsz = par.appbufsz;
        if let Some(adjust) = s.adjust {
            adjust(&mut par);
        }
        Some(par)
    }

    fn start(&mut self) -> bool {
        let mut s = self.state.borrow_mut();
        s.start_calls += 1;
        s.start_ok
    }

    fn stop(&mut self) -> bool {
        let mut s = self.state.borrow_mut();
        s.stop_calls += 1;
        s.deliver();
        true
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let mut s = self.state.borrow_mut();
        s.write_calls += 1;
        s.deliver();
        let n = s.accepted(buf.len());
        s.written.extend_from_slice(&buf[..n]);
        n
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut s = self.state.borrow_mut();
        s.read_calls += 1;
        s.deliver();
        let n = s.accepted(buf.len());
        buf[..n].fill(0x5a);
        n
    }

    fn eof(&mut self) -> bool {
        self.state.borrow().eof
    }

    fn setvol(&mut self, vol: u32) -> bool {
        let mut s = self.state.borrow_mut();
        s.volumes.push(vol);
        s.setvol_ok
    }

    fn pollfd(&mut self, events: PollFlags) -> Option<PollDesc> {
        Some(PollDesc {
            fd: POLL_FD,
            events,
        })
    }

    fn revents(&mut self, desc: &PollDesc, revents: PollFlags) -> PollFlags {
        self.state.borrow_mut().deliver();
        revents & desc.events
    }

    fn take_moved(&mut self) -> i64 {
        std::mem::take(&mut self.state.borrow_mut().delivered)
    }
}

pub fn default_cap() -> Cap {
    let mut cap = Cap::default();
    cap.pchan = [1, 2, 4, 6, 8, 0, 0, 0];
    cap.rchan = [1, 2, 4, 0, 0, 0, 0, 0];
    cap.rate[..6].copy_from_slice(&[8000, 11025, 22050, 44100, 48000, 96000]);
    cap.confs = vec![Conf {
        enc: 0x1,
        rchan: 0b111,
        pchan: 0b11111,
        rate: 0b11_1111,
    }];
    cap
}

pub fn shared() -> Shared {
    Rc::new(RefCell::new(MockState::default()))
}

pub fn open(
    state: &Shared,
    stream: Stream,
) -> (alsa_sndio::Result<SndioPcm<MockDevice>>, ParamTable) {
    open_with(state, stream, &PluginConfig::default())
}

pub fn open_with(
    state: &Shared,
    stream: Stream,
    config: &PluginConfig,
) -> (alsa_sndio::Result<SndioPcm<MockDevice>>, ParamTable) {
    let mut table = ParamTable::new();
    let pcm = SndioPcm::with_device(MockDevice::new(state), config, stream, &mut table);
    (pcm, table)
}

pub fn hw(format: Format, channels: u32, rate: u32, buffer_size: usize) -> HwParams {
    HwParams {
        format,
        channels,
        rate,
        buffer_size,
        period_size: None,
    }
}

/// A PCM that went through open, hw_params and prepare.
pub fn prepared(state: &Shared, stream: Stream, params: &HwParams) -> SndioPcm<MockDevice> {
    let (pcm, _) = open(state, stream);
    let mut pcm = pcm.expect("open");
    pcm.hw_params(params).expect("hw_params");
    pcm.prepare().expect("prepare");
    pcm
}
