use crate::error::{Error, Result};
use crate::host::{ChannelArea, Stream};
use crate::position::Position;
use sndio_hdl::Device;

/// Moves up to `frames` interleaved frames between the host ring buffer and
/// the server without blocking.
///
/// Returns the frames moved. Zero means the server could not take or give
/// anything yet and the host should poll again; a short count leaves the
/// rest for the next call.
pub fn transfer<D: Device>(
    device: &mut D,
    stream: Stream,
    frame_bytes: usize,
    position: &mut Position,
    area: &mut ChannelArea<'_>,
    offset: usize,
    frames: usize,
) -> Result<usize> {
    if frame_bytes == 0 {
        return Err(Error::BadState("transfer before hw_params"));
    }
    let len = frames
        .checked_mul(frame_bytes)
        .ok_or_else(|| Error::InvalidArgument(format!("{frames} frames")))?;
    let buf = area.bytes_mut(offset, len).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{frames} frames at offset {offset} outside the ring buffer"
        ))
    })?;

    let n = match stream {
        Stream::Playback => device.write(buf),
        Stream::Capture => device.read(buf),
    };
    if n == 0 {
        if device.eof() {
            return Err(Error::Io);
        }
        return Ok(0);
    }

    let moved = n / frame_bytes;
    position.on_transfer(moved);
    Ok(moved)
}
