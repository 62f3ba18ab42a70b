//! CAN bus handle and the dial path.
//!
//! A [`Bus`] is a resolved network interface. Dialing creates a kernel
//! ISO-TP socket, applies the protocol options, switches it to
//! non-blocking mode, registers it with the Tokio reactor, and binds it to
//! the address's CAN ID pair. Any failure drops the half-built socket, which
//! closes the descriptor before the error is returned.

use std::os::fd::AsRawFd;

use crate::addr::{BindTarget, IsoTpAddr, NETWORK_ISOTP, NetAddr};
use crate::conn::{Conn, IsoTpConn};
use crate::descriptor::SocketDescriptor;
use crate::duplex::Duplex;
use crate::error::{DuplexRole, IsoTpError, IsoTpResult};
use crate::options::DialOptions;
use crate::sys;

/// Connection backed by a kernel ISO-TP socket.
pub type SocketConn = IsoTpConn<SocketDescriptor>;

/// Duplex connection backed by two kernel ISO-TP sockets.
pub type SocketDuplex = Duplex<SocketConn, SocketConn>;

/// A CAN network interface that ISO-TP sockets can be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    name: String,
    ifindex: u32,
}

impl Bus {
    /// Look up a CAN interface (e.g. `"can0"`, `"vcan0"`) by name.
    pub fn by_name(name: &str) -> IsoTpResult<Self> {
        let ifindex = sys::if_nametoindex(name).map_err(|source| IsoTpError::InterfaceNotFound {
            name: name.to_string(),
            source,
        })?;
        tracing::debug!(interface = name, ifindex, "resolved CAN interface");
        Ok(Self::from_index(name, ifindex))
    }

    /// Use an interface index resolved elsewhere.
    pub fn from_index(name: impl Into<String>, ifindex: u32) -> Self {
        Self {
            name: name.into(),
            ifindex,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Dial `addr` with the kernel default options.
    pub fn dial<A: NetAddr + ?Sized>(&self, addr: &A) -> IsoTpResult<SocketConn> {
        self.dial_with(addr, DialOptions::default())
    }

    /// Dial `addr` with explicit socket options.
    ///
    /// Must be called from within a Tokio runtime; outside of one the
    /// reactor registration step fails with
    /// [`IsoTpError::SetNonblockFailed`].
    pub fn dial_with<A: NetAddr + ?Sized>(
        &self,
        addr: &A,
        options: impl Into<DialOptions>,
    ) -> IsoTpResult<SocketConn> {
        let options = options.into();
        let target = self.resolve(addr)?;
        let addr = IsoTpAddr::new(target.rx_id, target.tx_id);

        let socket = sys::open_isotp_socket().map_err(IsoTpError::SocketCreateFailed)?;

        // ISO-TP options are only honoured when applied before bind.
        sys::set_isotp_options(socket.as_raw_fd(), &options.isotp)
            .map_err(IsoTpError::OptionRejected)?;
        if let Some(fc) = &options.flow_control {
            sys::set_flow_control(socket.as_raw_fd(), fc).map_err(IsoTpError::OptionRejected)?;
        }

        socket
            .set_nonblocking(true)
            .map_err(IsoTpError::SetNonblockFailed)?;
        let desc = SocketDescriptor::register(socket).map_err(IsoTpError::SetNonblockFailed)?;

        sys::bind_isotp(desc.as_raw_fd(), target).map_err(|source| IsoTpError::BindFailed {
            addr: addr.to_string(),
            ifindex: self.ifindex,
            source,
        })?;

        tracing::debug!(
            interface = %self.name,
            %addr,
            flags = options.isotp.flags(),
            "iso-tp socket bound"
        );
        Ok(IsoTpConn::new(desc, addr))
    }

    /// Dial a read connection and a write connection and join them.
    pub fn dial_duplex<R, W>(&self, read: &R, write: &W) -> IsoTpResult<SocketDuplex>
    where
        R: NetAddr + ?Sized,
        W: NetAddr + ?Sized,
    {
        self.dial_duplex_with(read, write, DialOptions::default())
    }

    /// Like [`Bus::dial_duplex`], applying `options` to both sockets.
    pub fn dial_duplex_with<R, W>(
        &self,
        read: &R,
        write: &W,
        options: impl Into<DialOptions>,
    ) -> IsoTpResult<SocketDuplex>
    where
        R: NetAddr + ?Sized,
        W: NetAddr + ?Sized,
    {
        let options = options.into();
        let read_conn = self
            .dial_with(read, options)
            .map_err(|err| dial_error(DuplexRole::Read, err))?;
        let write_conn = match self.dial_with(write, options) {
            Ok(conn) => conn,
            Err(err) => {
                if let Err(close_err) = read_conn.close() {
                    tracing::warn!(error = %close_err, "closing read half after failed dial");
                }
                return Err(dial_error(DuplexRole::Write, err));
            }
        };
        Ok(Duplex::new(read_conn, write_conn))
    }

    /// Check the address family and build the bind target on this bus.
    fn resolve<A: NetAddr + ?Sized>(&self, addr: &A) -> IsoTpResult<BindTarget> {
        let network = addr.network();
        if network != NETWORK_ISOTP {
            return Err(IsoTpError::WrongAddressFamily {
                expected: NETWORK_ISOTP,
                found: network.into_owned(),
            });
        }
        addr.bind_target(self.ifindex)
            .ok_or_else(|| IsoTpError::InvalidAddressType(addr.to_string()))
    }
}

fn dial_error(role: DuplexRole, err: IsoTpError) -> IsoTpError {
    IsoTpError::Dial {
        role,
        source: Box::new(err),
    }
}

/// Resolve `bus_name` and dial `addr` on it.
pub fn dial<A: NetAddr + ?Sized>(bus_name: &str, addr: &A) -> IsoTpResult<SocketConn> {
    Bus::by_name(bus_name)?.dial(addr)
}

/// Resolve `bus_name` and dial a duplex connection on it.
pub fn dial_duplex<R, W>(bus_name: &str, read: &R, write: &W) -> IsoTpResult<SocketDuplex>
where
    R: NetAddr + ?Sized,
    W: NetAddr + ?Sized,
{
    Bus::by_name(bus_name)?.dial_duplex(read, write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplex::DuplexAddr;
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct UdpAddr;

    impl fmt::Display for UdpAddr {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("127.0.0.1:13400")
        }
    }

    impl NetAddr for UdpAddr {
        fn network(&self) -> Cow<'_, str> {
            Cow::Borrowed("udp")
        }
    }

    fn test_bus() -> Bus {
        Bus::from_index("vcan-test", 9999)
    }

    #[test]
    fn rejects_foreign_address_family() {
        let err = test_bus().dial(&UdpAddr).unwrap_err();
        match err {
            IsoTpError::WrongAddressFamily { expected, found } => {
                assert_eq!(expected, NETWORK_ISOTP);
                assert_eq!(found, "udp");
            }
            other => panic!("expected WrongAddressFamily, got {other:?}"),
        }
    }

    #[test]
    fn rejects_address_without_bind_target() {
        let addr = DuplexAddr {
            read: IsoTpAddr::new(3, 4),
            write: IsoTpAddr::new(5, 6),
        };
        let err = test_bus().dial(&addr).unwrap_err();
        assert!(matches!(err, IsoTpError::InvalidAddressType(_)));
    }

    #[test]
    fn duplex_dial_reports_failing_role() {
        let err = test_bus()
            .dial_duplex(&UdpAddr, &IsoTpAddr::new(5, 6))
            .unwrap_err();
        assert!(matches!(
            err,
            IsoTpError::Dial {
                role: DuplexRole::Read,
                ..
            }
        ));
    }

    #[test]
    fn unknown_interface_is_not_found() {
        let err = Bus::by_name("nosuchcan0").unwrap_err();
        assert!(matches!(err, IsoTpError::InterfaceNotFound { .. }));

        let err = dial("nosuchcan0", &IsoTpAddr::new(1, 2)).unwrap_err();
        assert!(matches!(err, IsoTpError::InterfaceNotFound { .. }));
    }

    #[test]
    fn from_index_keeps_name() {
        let bus = test_bus();
        assert_eq!(bus.name(), "vcan-test");
        assert_eq!(bus.ifindex(), 9999);
    }
}
