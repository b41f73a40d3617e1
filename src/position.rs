use crate::host::Stream;
use tracing::warn;

/// Frames the host transferred (`appl`) and frames the server reported as
/// played or recorded (`real`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    appl: i64,
    real: i64,
}

impl Position {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn appl(&self) -> i64 {
        self.appl
    }

    pub fn real(&self) -> i64 {
        self.real
    }

    pub fn on_transfer(&mut self, frames: usize) {
        self.appl += frames as i64;
    }

    pub fn on_move(&mut self, delta: i64) {
        self.real += delta;
    }

    /// Frames sitting between the host and the hardware: submitted but not
    /// played yet, or recorded but not read yet.
    ///
    /// Capture counts `real - appl`, the reverse of the playback formula, so
    /// a capture delay grows as the server records ahead of the reader.
    pub fn delay(&self, stream: Stream) -> i64 {
        let delay = match stream {
            Stream::Playback => self.appl - self.real,
            Stream::Capture => self.real - self.appl,
        };
        if delay < 0 {
            warn!(
                "sndio {}: position went backwards (appl {}, real {})",
                stream.direction(),
                self.appl,
                self.real
            );
            return 0;
        }
        delay
    }

    /// Hardware pointer as the host expects it. Capture streams report it a
    /// full buffer ahead so the host sees recorded frames as readable.
    pub fn pointer(&self, stream: Stream, buffer_size: usize) -> i64 {
        match stream {
            Stream::Playback => self.appl,
            Stream::Capture => self.appl + buffer_size as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_delay_is_submitted_minus_played() {
        let mut pos = Position::default();
        for _ in 0..3 {
            pos.on_transfer(1024);
        }
        pos.on_move(2000);
        assert_eq!((pos.appl(), pos.real()), (3072, 2000));
        assert_eq!(pos.delay(Stream::Playback), 1072);
    }

    #[test]
    fn capture_delay_is_recorded_minus_read() {
        let mut pos = Position::default();
        pos.on_move(300);
        pos.on_transfer(100);
        assert_eq!(pos.delay(Stream::Capture), 200);
    }

    #[test]
    fn delay_never_negative() {
        let mut pos = Position::default();
        pos.on_move(10);
        assert_eq!(pos.delay(Stream::Playback), 0);
    }

    #[test]
    fn pointer_offsets_capture_by_buffer() {
        let mut pos = Position::default();
        assert_eq!(pos.pointer(Stream::Playback, 4096), 0);
        assert_eq!(pos.pointer(Stream::Capture, 4096), 4096);
        pos.on_transfer(256);
        assert_eq!(pos.pointer(Stream::Playback, 4096), 256);
        assert_eq!(pos.pointer(Stream::Capture, 4096), 4352);
    }

    #[test]
    fn reset_clears_both_counters() {
        let mut pos = Position::default();
        pos.on_transfer(10);
        pos.on_move(5);
        pos.reset();
        assert_eq!(pos, Position::default());
    }
}
