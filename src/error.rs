use crate::host::Format;
use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("sndio: {0:?}: unsupported format")]
    Unsupported(Format),
    #[error("sndio: invalid device capabilities: {0}")]
    InvalidCapabilities(&'static str),
    #[error("sndio: parameters rejected: {0}")]
    ParameterRejected(String),
    #[error("sndio: device not ready, try again")]
    Retry,
    #[error("sndio: bad state: {0}")]
    BadState(&'static str),
    #[error("sndio: device io error")]
    Io,
    #[error("{0}")]
    NoDevice(String),
    #[error("sndio: invalid configuration: {0}")]
    Config(String),
    #[error("sndio: invalid argument: {0}")]
    InvalidArgument(String),
    #[error("sndio: host refused constraint: {0}")]
    Host(Errno),
}

impl Error {
    pub fn errno(&self) -> Errno {
        match self {
            Error::Unsupported(_)
            | Error::InvalidCapabilities(_)
            | Error::ParameterRejected(_)
            | Error::Config(_)
            | Error::InvalidArgument(_) => Errno::EINVAL,
            Error::Retry => Errno::EAGAIN,
            Error::BadState(_) => Errno::EBADFD,
            Error::Io => Errno::EIO,
            Error::NoDevice(_) => Errno::ENOENT,
            Error::Host(errno) => *errno,
        }
    }

    /// The negative errno the ioplug callbacks return.
    pub fn host_code(&self) -> i32 {
        -(self.errno() as i32)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Retry)
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::Host(errno)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
