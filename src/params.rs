//! Applies the host's hardware parameters to the server and checks that it
//! kept them.

use crate::error::{Error, Result};
use crate::format::{SampleEncoding, map_format};
use crate::host::{Format, HwParams};
use sndio_hdl::{Device, Par, sio_bps};
use tracing::{debug, error};

/// Parameters both sides agreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub format: Format,
    pub encoding: SampleEncoding,
    pub bps: u32,
    pub channels: u32,
    pub rate: u32,
    /// Host ring buffer size in frames.
    pub buffer_size: usize,
    pub frame_bytes: usize,
    /// What the server reported back.
    pub par: Par,
}

/// Builds the server request for `params` and the host frame size in bytes.
pub fn request(params: &HwParams) -> Result<(Par, usize)> {
    let encoding = map_format(params.format)?;
    if params.channels == 0 || params.rate == 0 {
        return Err(Error::InvalidArgument(format!(
            "{} channels at {} Hz",
            params.channels, params.rate
        )));
    }
    let appbufsz = u32::try_from(params.buffer_size)
        .map_err(|_| Error::InvalidArgument(format!("buffer of {} frames", params.buffer_size)))?;
    let round = match params.period_size {
        Some(period) => u32::try_from(period)
            .map_err(|_| Error::InvalidArgument(format!("period of {period} frames")))?,
        None => 0,
    };

    let bps = sio_bps(encoding.bits);
    let par = Par {
        bits: encoding.bits,
        bps,
        sig: encoding.sig,
        le: encoding.le,
        // Samples narrower than their container sit in the low bits.
        msb: false,
        // The server expects both directions filled in.
        rchan: params.channels,
        pchan: params.channels,
        rate: params.rate,
        bufsz: 0,
        round,
        appbufsz,
    };
    let frame_bytes = (params.format.physical_width() * params.channels / 8) as usize;
    Ok((par, frame_bytes))
}

/// Checks that `got` stores samples exactly as `req` asked.
pub fn verify(req: &Par, got: &Par) -> Result<()> {
    let mismatch = if req.bits != got.bits {
        Some(format!("bits {} became {}", req.bits, got.bits))
    } else if req.bps != got.bps {
        Some(format!("bytes per sample {} became {}", req.bps, got.bps))
    } else if req.rate != got.rate {
        Some(format!("rate {} became {}", req.rate, got.rate))
    } else if req.bps > 1 && req.le != got.le {
        Some("byte order changed".to_string())
    } else if req.bits < req.bps * 8 && req.msb != got.msb {
        Some("sample justification changed".to_string())
    } else {
        None
    };
    match mismatch {
        Some(reason) => Err(Error::ParameterRejected(reason)),
        None => Ok(()),
    }
}

pub fn commit<D: Device>(device: &mut D, params: &HwParams) -> Result<Negotiated> {
    let (req, frame_bytes) = request(params).inspect_err(|e| error!("{e}"))?;

    if !device.setpar(&req) {
        return Err(Error::ParameterRejected("sio_setpar failed".to_string()));
    }
    let got = device
        .getpar()
        .ok_or_else(|| Error::ParameterRejected("sio_getpar failed".to_string()))?;
    verify(&req, &got).inspect_err(|e| error!("{e}"))?;

    debug!(
        "sndio parameters: {:?} {}ch {}Hz, appbufsz {} round {} bufsz {}",
        params.format, params.channels, got.rate, got.appbufsz, got.round, got.bufsz
    );
    Ok(Negotiated {
        format: params.format,
        encoding: SampleEncoding {
            bits: got.bits,
            sig: got.sig,
            le: got.le,
        },
        bps: got.bps,
        channels: params.channels,
        rate: got.rate,
        buffer_size: params.buffer_size,
        frame_bytes,
        par: got,
    })
}
