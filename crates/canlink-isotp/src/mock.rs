//! Mock descriptor and connection for testing.
//!
//! Both mocks are cheap to clone and share state between clones, so a test
//! can keep a handle for assertions after moving one into the code under
//! test. No CAN hardware or `vcan` interface is needed.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Notify;

use crate::addr::IsoTpAddr;
use crate::conn::Conn;
use crate::descriptor::Descriptor;
use crate::error::{IsoTpError, IsoTpResult};

// ── MockDescriptor ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct DescriptorState {
    inbound: Mutex<VecDeque<Vec<u8>>>,
    arrived: Notify,
    sent: Mutex<Vec<Vec<u8>>>,
    touches: AtomicUsize,
    next_recv_error: Mutex<Option<io::ErrorKind>>,
    close_error: Mutex<Option<io::ErrorKind>>,
    released: AtomicBool,
}

/// Scripted descriptor. `recv` waits until a message is queued, like an
/// idle socket.
#[derive(Debug, Clone, Default)]
pub struct MockDescriptor {
    state: Arc<DescriptorState>,
}

impl MockDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for the next `recv`.
    pub fn queue_inbound(&self, msg: Vec<u8>) {
        self.state.inbound.lock().unwrap().push_back(msg);
        self.state.arrived.notify_one();
    }

    /// Make the next `recv` fail with `kind`.
    pub fn fail_next_recv(&self, kind: io::ErrorKind) {
        *self.state.next_recv_error.lock().unwrap() = Some(kind);
    }

    /// Make `close` fail with `kind`.
    pub fn fail_close(&self, kind: io::ErrorKind) {
        *self.state.close_error.lock().unwrap() = Some(kind);
    }

    /// Messages passed to `send`.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.sent.lock().unwrap().clone()
    }

    /// Number of `recv`/`send` calls that reached the descriptor.
    pub fn touches(&self) -> usize {
        self.state.touches.load(Ordering::SeqCst)
    }

    /// Whether `close` was called on the descriptor.
    pub fn is_released(&self) -> bool {
        self.state.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Descriptor for MockDescriptor {
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.state.touches.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.state.next_recv_error.lock().unwrap().take() {
            return Err(io::Error::new(kind, "mock recv failure"));
        }
        loop {
            let next = self.state.inbound.lock().unwrap().pop_front();
            if let Some(msg) = next {
                let n = msg.len().min(buf.len());
                buf[..n].copy_from_slice(&msg[..n]);
                return Ok(n);
            }
            self.state.arrived.notified().await;
        }
    }

    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.state.touches.fetch_add(1, Ordering::SeqCst);
        self.state.sent.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn close(self) -> io::Result<()> {
        self.state.released.store(true, Ordering::SeqCst);
        match self.state.close_error.lock().unwrap().take() {
            Some(kind) => Err(io::Error::new(kind, "mock close failure")),
            None => Ok(()),
        }
    }
}

// ── MockConn ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ConnState {
    inbound: Mutex<VecDeque<Vec<u8>>>,
    written: Mutex<Vec<Vec<u8>>>,
    reads: AtomicUsize,
    close_calls: AtomicUsize,
    fail_close: AtomicBool,
    read_deadline: Mutex<Option<Instant>>,
    write_deadline: Mutex<Option<Instant>>,
}

/// Scripted connection with call recording.
///
/// `read` returns queued messages in FIFO order and fails with
/// [`IsoTpError::DeadlineExceeded`] when the queue is empty.
#[derive(Debug, Clone)]
pub struct MockConn {
    addr: IsoTpAddr,
    state: Arc<ConnState>,
}

impl MockConn {
    pub fn new(addr: IsoTpAddr) -> Self {
        Self {
            addr,
            state: Arc::default(),
        }
    }

    pub fn queue_inbound(&self, msg: Vec<u8>) {
        self.state.inbound.lock().unwrap().push_back(msg);
    }

    /// Make every `close` call fail.
    pub fn fail_close(&self) {
        self.state.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.written.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn read_deadline(&self) -> Option<Instant> {
        *self.state.read_deadline.lock().unwrap()
    }

    pub fn write_deadline(&self) -> Option<Instant> {
        *self.state.write_deadline.lock().unwrap()
    }
}

#[async_trait]
impl Conn for MockConn {
    type Addr = IsoTpAddr;

    async fn read(&self, buf: &mut [u8]) -> IsoTpResult<usize> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        let msg = self
            .state
            .inbound
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(IsoTpError::DeadlineExceeded)?;
        let n = msg.len().min(buf.len());
        buf[..n].copy_from_slice(&msg[..n]);
        Ok(n)
    }

    async fn write(&self, buf: &[u8]) -> IsoTpResult<usize> {
        self.state.written.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn close(&self) -> IsoTpResult<()> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(IsoTpError::Io(io::Error::other("mock close failure")));
        }
        Ok(())
    }

    fn local_addr(&self) -> IsoTpAddr {
        self.addr
    }

    fn remote_addr(&self) -> IsoTpAddr {
        self.addr.remote()
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) {
        *self.state.read_deadline.lock().unwrap() = deadline;
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) {
        *self.state.write_deadline.lock().unwrap() = deadline;
    }
}
