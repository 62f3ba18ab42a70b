//! ISO-TP connection error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which half of a duplex connection an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexRole {
    Read,
    Write,
}

impl fmt::Display for DuplexRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplexRole::Read => f.write_str("read"),
            DuplexRole::Write => f.write_str("write"),
        }
    }
}

/// Errors that can occur while dialing or using an ISO-TP connection.
#[derive(Debug, Error)]
pub enum IsoTpError {
    #[error("address specifies wrong network type: {found:?} (expected {expected:?})")]
    WrongAddressFamily {
        expected: &'static str,
        found: String,
    },

    #[error("address {0} cannot be bound as an ISO-TP endpoint")]
    InvalidAddressType(String),

    #[error("CAN interface {name:?} not found: {source}")]
    InterfaceNotFound {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create ISO-TP socket: {0}")]
    SocketCreateFailed(#[source] io::Error),

    #[error("ISO-TP socket options rejected: {0}")]
    OptionRejected(#[source] io::Error),

    #[error("failed to set ISO-TP socket non-blocking: {0}")]
    SetNonblockFailed(#[source] io::Error),

    #[error("bind to {addr} on ifindex {ifindex} failed: {source}")]
    BindFailed {
        addr: String,
        ifindex: u32,
        #[source]
        source: io::Error,
    },

    #[error("i/o deadline exceeded")]
    DeadlineExceeded,

    #[error("use of closed connection")]
    Closed,

    #[error("CAN interface went away: {0}")]
    InterfaceGone(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("error dialing {role} connection: {source}")]
    Dial {
        role: DuplexRole,
        #[source]
        source: Box<IsoTpError>,
    },

    #[error("{}", join_errors(.0))]
    Multiple(Vec<IsoTpError>),
}

impl IsoTpError {
    /// Map an OS error from a read or write to its portable kind.
    pub fn from_io(err: io::Error) -> Self {
        match err.raw_os_error() {
            #[cfg(target_os = "linux")]
            Some(libc::EBADF) => IsoTpError::Closed,
            #[cfg(target_os = "linux")]
            Some(libc::ENODEV | libc::ENXIO | libc::ENETDOWN) => IsoTpError::InterfaceGone(err),
            _ => IsoTpError::Io(err),
        }
    }

    /// True when the error came from an expired deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            IsoTpError::DeadlineExceeded => true,
            IsoTpError::Io(err) => err.kind() == io::ErrorKind::TimedOut,
            IsoTpError::Dial { source, .. } => source.is_timeout(),
            IsoTpError::Multiple(errs) => errs.iter().any(IsoTpError::is_timeout),
            _ => false,
        }
    }

    /// True when the connection was already closed.
    pub fn is_closed(&self) -> bool {
        match self {
            IsoTpError::Closed => true,
            IsoTpError::Dial { source, .. } => source.is_closed(),
            IsoTpError::Multiple(errs) => errs.iter().any(IsoTpError::is_closed),
            _ => false,
        }
    }
}

fn join_errors(errs: &[IsoTpError]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience alias for ISO-TP results.
pub type IsoTpResult<T> = Result<T, IsoTpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_joins_messages() {
        let err = IsoTpError::Multiple(vec![IsoTpError::Closed, IsoTpError::DeadlineExceeded]);
        assert_eq!(
            err.to_string(),
            "use of closed connection\ni/o deadline exceeded"
        );
        assert!(err.is_closed());
        assert!(err.is_timeout());
    }

    #[test]
    fn dial_error_names_role() {
        let err = IsoTpError::Dial {
            role: DuplexRole::Write,
            source: Box::new(IsoTpError::Closed),
        };
        assert_eq!(
            err.to_string(),
            "error dialing write connection: use of closed connection"
        );
        assert!(err.is_closed());
        assert!(!err.is_timeout());
    }

    #[test]
    fn dial_error_exposes_inner_timeout() {
        let err = IsoTpError::Dial {
            role: DuplexRole::Read,
            source: Box::new(IsoTpError::DeadlineExceeded),
        };
        assert!(err.is_timeout());
        assert!(!err.is_closed());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn os_errors_map_to_portable_kinds() {
        let gone = IsoTpError::from_io(io::Error::from_raw_os_error(libc::ENETDOWN));
        assert!(matches!(gone, IsoTpError::InterfaceGone(_)));

        let closed = IsoTpError::from_io(io::Error::from_raw_os_error(libc::EBADF));
        assert!(closed.is_closed());

        let other = IsoTpError::from_io(io::Error::from_raw_os_error(libc::EMSGSIZE));
        assert!(matches!(other, IsoTpError::Io(_)));
    }
}
