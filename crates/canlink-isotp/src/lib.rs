//! Linux kernel ISO-TP sockets as byte-stream style connections.
//!
//! - `IsoTpAddr` / `NetAddr`: CAN ID pair addressing
//! - `IsoTpOptions`: the kernel's `can_isotp_options` record
//! - `Bus`: resolves an interface and dials connections (Linux-only)
//! - `Conn`: uniform read/write/close/deadline interface
//! - `IsoTpConn`: one socket with deadline emulation and close-unblocks-I/O
//! - `Duplex`: one read connection plus one write connection as a single `Conn`
//! - `MockDescriptor` / `MockConn`: scripted stand-ins for tests
//!
//! The ISO-TP segmentation itself runs in the kernel (`CONFIG_CAN_ISOTP`).

pub mod addr;
pub mod conn;
pub mod descriptor;
pub mod duplex;
pub mod error;
pub mod mock;
pub mod options;

// Kernel sockets only available on Linux
#[cfg(target_os = "linux")]
pub mod bus;
#[cfg(target_os = "linux")]
mod sys;

pub use addr::{BindTarget, CAN_EFF_FLAG, IsoTpAddr, NETWORK_ISOTP, NetAddr};
pub use conn::{Conn, IsoTpConn};
pub use descriptor::Descriptor;
pub use duplex::{Duplex, DuplexAddr};
pub use error::{DuplexRole, IsoTpError, IsoTpResult};
pub use mock::{MockConn, MockDescriptor};
pub use options::{DialOptions, FlowControlOptions, IsoTpOptions, flags};

#[cfg(target_os = "linux")]
pub use bus::{Bus, SocketConn, SocketDuplex, dial, dial_duplex};
#[cfg(target_os = "linux")]
pub use descriptor::SocketDescriptor;
