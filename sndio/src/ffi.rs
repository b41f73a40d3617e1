use super::{Cap, Conf, Device, Enc, Par, PollDesc, SIO_NCHAN, SIO_NCONF, SIO_NENC, SIO_NRATE};
use nix::libc;
use nix::poll::PollFlags;
use std::cell::Cell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint, c_void};

#[repr(C)]
struct SioPar {
    bits: c_uint,
    bps: c_uint,
    sig: c_uint,
    le: c_uint,
    msb: c_uint,
    rchan: c_uint,
    pchan: c_uint,
    rate: c_uint,
    bufsz: c_uint,
    xrun: c_uint,
    round: c_uint,
    appbufsz: c_uint,
    __pad: [c_int; 3],
    __magic: c_uint,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct SioEnc {
    bits: c_uint,
    bps: c_uint,
    sig: c_uint,
    le: c_uint,
    msb: c_uint,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct SioConf {
    enc: c_uint,
    rchan: c_uint,
    pchan: c_uint,
    rate: c_uint,
}

#[repr(C)]
struct SioCap {
    enc: [SioEnc; SIO_NENC],
    rchan: [c_uint; SIO_NCHAN],
    pchan: [c_uint; SIO_NCHAN],
    rate: [c_uint; SIO_NRATE],
    __pad: [c_int; 7],
    nconf: c_uint,
    confs: [SioConf; SIO_NCONF],
}

enum SioHdl {}

type OnMove = unsafe extern "C" fn(arg: *mut c_void, delta: c_int);

#[link(name = "sndio")]
unsafe extern "C" {
    fn sio_initpar(par: *mut SioPar);
    fn sio_open(name: *const c_char, mode: c_uint, nbio: c_int) -> *mut SioHdl;
    fn sio_close(hdl: *mut SioHdl);
    fn sio_setpar(hdl: *mut SioHdl, par: *mut SioPar) -> c_int;
    fn sio_getpar(hdl: *mut SioHdl, par: *mut SioPar) -> c_int;
    fn sio_getcap(hdl: *mut SioHdl, cap: *mut SioCap) -> c_int;
    fn sio_onmove(hdl: *mut SioHdl, cb: Option<OnMove>, arg: *mut c_void);
    fn sio_start(hdl: *mut SioHdl) -> c_int;
    fn sio_stop(hdl: *mut SioHdl) -> c_int;
    fn sio_read(hdl: *mut SioHdl, addr: *mut c_void, nbytes: usize) -> usize;
    fn sio_write(hdl: *mut SioHdl, addr: *const c_void, nbytes: usize) -> usize;
    fn sio_pollfd(hdl: *mut SioHdl, pfd: *mut libc::pollfd, events: c_int) -> c_int;
    fn sio_revents(hdl: *mut SioHdl, pfd: *mut libc::pollfd) -> c_int;
    fn sio_eof(hdl: *mut SioHdl) -> c_int;
    fn sio_setvol(hdl: *mut SioHdl, vol: c_uint) -> c_int;
}

unsafe extern "C" fn on_move(arg: *mut c_void, delta: c_int) {
    let moved = unsafe { &*(arg as *const Cell<i64>) };
    moved.set(moved.get() + i64::from(delta));
}

/// An open libsndio handle. Dropping it closes the connection.
pub struct Handle {
    hdl: *mut SioHdl,
    // Boxed so the address registered with sio_onmove stays put.
    moved: Box<Cell<i64>>,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("hdl", &self.hdl)
            .field("moved", &self.moved.get())
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.hdl.is_null() {
            return;
        }
        unsafe {
            sio_close(self.hdl);
        }
        self.hdl = std::ptr::null_mut();
    }
}

impl Handle {
    pub fn open(device: &str, mode: u32, nbio: bool) -> Result<Self, String> {
        let direction = if mode & super::SIO_REC != 0 {
            "capture"
        } else {
            "playback"
        };
        let name =
            CString::new(device).map_err(|e| super::open_error(direction, device, e))?;

        let hdl = unsafe { sio_open(name.as_ptr(), mode, c_int::from(nbio)) };
        if hdl.is_null() {
            return Err(super::open_error(
                direction,
                device,
                "sio_open returned null",
            ));
        }

        let handle = Self {
            hdl,
            moved: Box::new(Cell::new(0)),
        };
        let arg = &*handle.moved as *const Cell<i64> as *mut c_void;
        unsafe {
            sio_onmove(handle.hdl, Some(on_move), arg);
        }
        tracing::debug!("opened sndio {direction} device '{device}'");
        Ok(handle)
    }

    fn blank_par() -> SioPar {
        let mut par = unsafe { std::mem::zeroed::<SioPar>() };
        unsafe {
            sio_initpar(&mut par);
        }
        par
    }
}

impl Device for Handle {
    fn getcap(&mut self) -> Option<Cap> {
        let mut raw = unsafe { std::mem::zeroed::<SioCap>() };
        if unsafe { sio_getcap(self.hdl, &mut raw) } == 0 {
            return None;
        }
        let nconf = (raw.nconf as usize).min(SIO_NCONF);
        Some(Cap {
            enc: raw.enc.map(|e| Enc {
                bits: e.bits,
                bps: e.bps,
                sig: e.sig != 0,
                le: e.le != 0,
                msb: e.msb != 0,
            }),
            rchan: raw.rchan,
            pchan: raw.pchan,
            rate: raw.rate,
            confs: raw.confs[..nconf]
                .iter()
                .map(|c| Conf {
                    enc: c.enc,
                    rchan: c.rchan,
                    pchan: c.pchan,
                    rate: c.rate,
                })
                .collect(),
        })
    }

    fn setpar(&mut self, par: &Par) -> bool {
        let mut raw = Self::blank_par();
        raw.bits = par.bits;
        raw.bps = par.bps;
        raw.sig = c_uint::from(par.sig);
        raw.le = c_uint::from(par.le);
        raw.msb = c_uint::from(par.msb);
        raw.rchan = par.rchan;
        raw.pchan = par.pchan;
        raw.rate = par.rate;
        if par.appbufsz != 0 {
            raw.appbufsz = par.appbufsz;
        }
        if par.round != 0 {
            raw.round = par.round;
        }
        if par.bufsz != 0 {
            raw.bufsz = par.bufsz;
        }
        unsafe { sio_setpar(self.hdl, &mut raw) == 1 }
    }

    fn getpar(&mut self) -> Option<Par> {
        let mut raw = Self::blank_par();
        if unsafe { sio_getpar(self.hdl, &mut raw) } != 1 {
            return None;
        }
        Some(Par {
            bits: raw.bits,
            bps: raw.bps,
            sig: raw.sig != 0,
            le: raw.le != 0,
            msb: raw.msb != 0,
            rchan: raw.rchan,
            pchan: raw.pchan,
            rate: raw.rate,
            bufsz: raw.bufsz,
            round: raw.round,
            appbufsz: raw.appbufsz,
        })
    }

    fn start(&mut self) -> bool {
        unsafe { sio_start(self.hdl) == 1 }
    }

    fn stop(&mut self) -> bool {
        unsafe { sio_stop(self.hdl) == 1 }
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        unsafe { sio_write(self.hdl, buf.as_ptr().cast::<c_void>(), buf.len()) }
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        unsafe { sio_read(self.hdl, buf.as_mut_ptr().cast::<c_void>(), buf.len()) }
    }

    fn eof(&mut self) -> bool {
        unsafe { sio_eof(self.hdl) != 0 }
    }

    fn setvol(&mut self, vol: u32) -> bool {
        unsafe { sio_setvol(self.hdl, vol) == 1 }
    }

    fn pollfd(&mut self, events: PollFlags) -> Option<PollDesc> {
        let mut pfd = libc::pollfd {
            fd: -1,
            events: 0,
            revents: 0,
        };
        let n = unsafe { sio_pollfd(self.hdl, &mut pfd, c_int::from(events.bits())) };
        if n < 1 {
            return None;
        }
        Some(PollDesc {
            fd: pfd.fd,
            events: PollFlags::from_bits_truncate(pfd.events),
        })
    }

    fn revents(&mut self, desc: &PollDesc, revents: PollFlags) -> PollFlags {
        let mut pfd = libc::pollfd {
            fd: desc.fd,
            events: desc.events.bits(),
            revents: revents.bits(),
        };
        let ready = unsafe { sio_revents(self.hdl, &mut pfd) };
        PollFlags::from_bits_truncate(ready as libc::c_short)
    }

    fn take_moved(&mut self) -> i64 {
        self.moved.replace(0)
    }
}
