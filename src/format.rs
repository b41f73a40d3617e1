use crate::error::{Error, Result};
use crate::host::Format;
use sndio_hdl::SIO_LE_NATIVE;

/// How the sndio server describes a sample: width, signedness, byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEncoding {
    pub bits: u32,
    pub sig: bool,
    pub le: bool,
}

const fn enc(bits: u32, sig: bool, le: bool) -> SampleEncoding {
    SampleEncoding { bits, sig, le }
}

// Byte order is meaningless for single byte samples; they carry the native one.
static FORMAT_MAP: [(Format, SampleEncoding); 14] = [
    (Format::U8, enc(8, false, SIO_LE_NATIVE)),
    (Format::S8, enc(8, true, SIO_LE_NATIVE)),
    (Format::S16LE, enc(16, true, true)),
    (Format::S16BE, enc(16, true, false)),
    (Format::U16LE, enc(16, false, true)),
    (Format::U16BE, enc(16, false, false)),
    (Format::S24LE, enc(24, true, true)),
    (Format::S24BE, enc(24, true, false)),
    (Format::U24LE, enc(24, false, true)),
    (Format::U24BE, enc(24, false, false)),
    (Format::S32LE, enc(32, true, true)),
    (Format::S32BE, enc(32, true, false)),
    (Format::U32LE, enc(32, false, true)),
    (Format::U32BE, enc(32, false, false)),
];

pub fn map_format(format: Format) -> Result<SampleEncoding> {
    FORMAT_MAP
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, e)| *e)
        .ok_or(Error::Unsupported(format))
}

/// Host format stored the way the server stores `bits` wide samples.
pub fn host_format(bits: u32, sig: bool, le: bool) -> Option<Format> {
    FORMAT_MAP
        .iter()
        .find(|(_, e)| e.bits == bits && e.sig == sig && (bits <= 8 || e.le == le))
        .map(|(f, _)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_width_and_order() {
        assert_eq!(map_format(Format::S16LE), Ok(enc(16, true, true)));
        assert_eq!(map_format(Format::U16BE), Ok(enc(16, false, false)));
        assert_eq!(map_format(Format::S24BE), Ok(enc(24, true, false)));
        assert_eq!(map_format(Format::U32LE), Ok(enc(32, false, true)));
        let u8 = map_format(Format::U8).unwrap();
        assert_eq!((u8.bits, u8.sig), (8, false));
    }

    #[test]
    fn packed_and_float_formats_are_unsupported() {
        for format in [
            Format::S243LE,
            Format::S243BE,
            Format::U243LE,
            Format::FloatLE,
            Format::Float64BE,
            Format::MuLaw,
            Format::S20LE,
        ] {
            assert_eq!(map_format(format), Err(Error::Unsupported(format)));
        }
    }

    #[test]
    fn reverse_lookup_matches_forward_table() {
        for (format, e) in FORMAT_MAP.iter() {
            assert_eq!(host_format(e.bits, e.sig, e.le), Some(*format));
        }
        assert_eq!(host_format(8, false, !SIO_LE_NATIVE), Some(Format::U8));
        assert_eq!(host_format(20, true, true), None);
    }
}
