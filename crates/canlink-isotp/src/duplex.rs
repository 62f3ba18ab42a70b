//! Combine a read-only and a write-only connection into one.
//!
//! Some ECUs answer on a different CAN ID pair than the one they listen on.
//! [`Duplex`] presents the two resulting connections as a single [`Conn`]:
//! reads go to the read half, writes to the write half, nothing is buffered
//! or reordered.

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use crate::addr::NetAddr;
use crate::conn::Conn;
use crate::error::{IsoTpError, IsoTpResult};

/// Composite address of a duplex connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplexAddr<A> {
    pub read: A,
    pub write: A,
}

impl<A: NetAddr> fmt::Display for DuplexAddr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplex{{read:{}, write:{}}}", self.read, self.write)
    }
}

impl<A: NetAddr> NetAddr for DuplexAddr<A> {
    fn network(&self) -> Cow<'_, str> {
        let read = self.read.network();
        let write = self.write.network();
        if read == write {
            read
        } else {
            Cow::Owned(format!("read:{read}+write:{write}"))
        }
    }
}

/// Two connections used as one: `read` for inbound, `write` for outbound.
#[derive(Debug)]
pub struct Duplex<R, W> {
    read: R,
    write: W,
}

impl<R, W> Duplex<R, W> {
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }

    pub fn read_half(&self) -> &R {
        &self.read
    }

    pub fn write_half(&self) -> &W {
        &self.write
    }

    pub fn into_inner(self) -> (R, W) {
        (self.read, self.write)
    }
}

#[async_trait]
impl<R, W> Conn for Duplex<R, W>
where
    R: Conn,
    W: Conn<Addr = R::Addr>,
{
    type Addr = DuplexAddr<R::Addr>;

    async fn read(&self, buf: &mut [u8]) -> IsoTpResult<usize> {
        self.read.read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> IsoTpResult<usize> {
        self.write.write(buf).await
    }

    /// Close both halves. The write half is closed even when closing the
    /// read half fails.
    fn close(&self) -> IsoTpResult<()> {
        let read = self.read.close();
        let write = self.write.close();
        match (read, write) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => {
                tracing::warn!(error = %err, "duplex close partially failed");
                Err(err)
            }
            (Err(read), Err(write)) => Err(IsoTpError::Multiple(vec![read, write])),
        }
    }

    fn local_addr(&self) -> Self::Addr {
        DuplexAddr {
            read: self.read.local_addr(),
            write: self.write.local_addr(),
        }
    }

    fn remote_addr(&self) -> Self::Addr {
        // The peer reads what we write and writes what we read.
        DuplexAddr {
            read: self.write.remote_addr(),
            write: self.read.remote_addr(),
        }
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) {
        self.read.set_read_deadline(deadline);
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) {
        self.write.set_write_deadline(deadline);
    }
}
