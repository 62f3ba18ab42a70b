//! Deadline-aware connections over ISO-TP descriptors.

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;

use crate::addr::{IsoTpAddr, NetAddr};
use crate::descriptor::Descriptor;
use crate::error::{IsoTpError, IsoTpResult};

/// A bidirectional, deadline-aware datagram connection.
///
/// All methods take `&self`, so a connection can be shared between a reader
/// task and a writer task. Two concurrent calls in the same direction are not
/// coordinated and must be serialized by the caller.
#[async_trait]
pub trait Conn: Send + Sync {
    type Addr: NetAddr;

    /// Read one message into `buf`, returning the number of bytes read.
    ///
    /// Fails with [`IsoTpError::DeadlineExceeded`] once the read deadline
    /// passes and with [`IsoTpError::Closed`] if the connection is closed
    /// before or during the call.
    async fn read(&self, buf: &mut [u8]) -> IsoTpResult<usize>;

    /// Write `buf` as one message, returning the number of bytes written.
    async fn write(&self, buf: &[u8]) -> IsoTpResult<usize>;

    /// Close the connection. Pending reads and writes return
    /// [`IsoTpError::Closed`].
    fn close(&self) -> IsoTpResult<()>;

    fn local_addr(&self) -> Self::Addr;

    fn remote_addr(&self) -> Self::Addr;

    /// Set both deadlines. `None` means I/O never times out.
    fn set_deadline(&self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }

    /// Deadline for reads started after this call.
    fn set_read_deadline(&self, deadline: Option<Instant>);

    /// Deadline for writes started after this call.
    fn set_write_deadline(&self, deadline: Option<Instant>);
}

/// Connection bound to a single ISO-TP CAN ID pair.
#[derive(Debug)]
pub struct IsoTpConn<D: Descriptor> {
    addr: IsoTpAddr,
    desc: Mutex<Option<Arc<D>>>,
    closed: watch::Sender<bool>,
    read_deadline: Mutex<Option<Instant>>,
    write_deadline: Mutex<Option<Instant>>,
}

impl<D: Descriptor> IsoTpConn<D> {
    /// Wrap an open, bound descriptor.
    pub fn new(desc: D, addr: IsoTpAddr) -> Self {
        Self {
            addr,
            desc: Mutex::new(Some(Arc::new(desc))),
            closed: watch::Sender::new(false),
            read_deadline: Mutex::new(None),
            write_deadline: Mutex::new(None),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn descriptor(&self) -> IsoTpResult<Arc<D>> {
        lock(&self.desc).clone().ok_or(IsoTpError::Closed)
    }

    /// Drive one descriptor operation to completion, the deadline, or close.
    async fn run<T, F>(&self, deadline: Option<Instant>, op: F) -> IsoTpResult<T>
    where
        F: Future<Output = io::Result<T>> + Send,
    {
        let mut closed = self.closed.subscribe();
        let io = async {
            match deadline {
                Some(at) => match tokio::time::timeout_at(at.into(), op).await {
                    Ok(res) => res.map_err(IsoTpError::from_io),
                    Err(_) => Err(IsoTpError::DeadlineExceeded),
                },
                None => op.await.map_err(IsoTpError::from_io),
            }
        };

        tokio::select! {
            biased;
            _ = async { closed.wait_for(|closed| *closed).await.is_ok() } => Err(IsoTpError::Closed),
            res = io => res,
        }
    }
}

/// Fails fast when `deadline` has already passed.
fn check_deadline(deadline: Option<Instant>) -> IsoTpResult<()> {
    match deadline {
        Some(at) if at <= Instant::now() => Err(IsoTpError::DeadlineExceeded),
        _ => Ok(()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl<D: Descriptor> Conn for IsoTpConn<D> {
    type Addr = IsoTpAddr;

    async fn read(&self, buf: &mut [u8]) -> IsoTpResult<usize> {
        let desc = self.descriptor()?;
        let deadline = *lock(&self.read_deadline);
        check_deadline(deadline)?;
        self.run(deadline, desc.recv(buf)).await
    }

    async fn write(&self, buf: &[u8]) -> IsoTpResult<usize> {
        let desc = self.descriptor()?;
        let deadline = *lock(&self.write_deadline);
        check_deadline(deadline)?;
        self.run(deadline, desc.send(buf)).await
    }

    fn close(&self) -> IsoTpResult<()> {
        let desc = lock(&self.desc).take().ok_or(IsoTpError::Closed)?;
        self.closed.send_replace(true);
        tracing::debug!(addr = %self.addr, "iso-tp connection closed");

        // An in-flight call may still hold the descriptor; it drops its
        // handle as soon as it observes the close flag.
        match Arc::into_inner(desc) {
            Some(desc) => desc.close().map_err(IsoTpError::from_io),
            None => Ok(()),
        }
    }

    fn local_addr(&self) -> IsoTpAddr {
        self.addr
    }

    fn remote_addr(&self) -> IsoTpAddr {
        self.addr.remote()
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) {
        *lock(&self.read_deadline) = deadline;
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) {
        *lock(&self.write_deadline) = deadline;
    }
}
