//! The I/O primitive underneath a connection.
//!
//! `Descriptor` is the seam between deadline/close bookkeeping in
//! [`IsoTpConn`](crate::conn::IsoTpConn) and the actual socket. Production
//! code uses [`SocketDescriptor`]; tests use
//! [`MockDescriptor`](crate::mock::MockDescriptor).

use async_trait::async_trait;
use std::io;

/// One open datagram descriptor.
///
/// `recv` and `send` wait for readiness and perform exactly one transfer.
/// They are never retried by callers; cancellation happens by dropping the
/// future.
#[async_trait]
pub trait Descriptor: Send + Sync + 'static {
    /// Receive one datagram into `buf`.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Transmit `buf` as one datagram.
    async fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Release the descriptor.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

#[cfg(target_os = "linux")]
pub use socket::SocketDescriptor;

#[cfg(target_os = "linux")]
mod socket {
    use async_trait::async_trait;
    use socket2::Socket;
    use std::io;
    use std::os::fd::{AsRawFd, IntoRawFd};
    use tokio::io::unix::AsyncFd;

    use super::Descriptor;
    use crate::sys;

    /// Kernel ISO-TP socket registered with the Tokio reactor.
    #[derive(Debug)]
    pub struct SocketDescriptor {
        io: AsyncFd<Socket>,
    }

    impl SocketDescriptor {
        /// Register a non-blocking socket with the current runtime's reactor.
        ///
        /// Fails instead of panicking when called outside a Tokio runtime.
        pub(crate) fn register(socket: Socket) -> io::Result<Self> {
            tokio::runtime::Handle::try_current().map_err(io::Error::other)?;
            Ok(Self {
                io: AsyncFd::new(socket)?,
            })
        }
    }

    impl AsRawFd for SocketDescriptor {
        fn as_raw_fd(&self) -> std::os::fd::RawFd {
            self.io.as_raw_fd()
        }
    }

    #[async_trait]
    impl Descriptor for SocketDescriptor {
        async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                let mut guard = self.io.readable().await?;
                match guard.try_io(|inner| sys::recv(inner.as_raw_fd(), &mut *buf)) {
                    Ok(result) => return result,
                    Err(_would_block) => continue,
                }
            }
        }

        async fn send(&self, buf: &[u8]) -> io::Result<usize> {
            loop {
                let mut guard = self.io.writable().await?;
                match guard.try_io(|inner| sys::send(inner.as_raw_fd(), buf)) {
                    Ok(result) => return result,
                    Err(_would_block) => continue,
                }
            }
        }

        fn close(self) -> io::Result<()> {
            let socket = self.io.into_inner();
            sys::close(socket.into_raw_fd())
        }
    }
}
