#![cfg(target_os = "linux")]
//! Failed dials on vcan0 must leave no descriptors behind.
//!
//! Kept in its own test binary with a single test so the descriptor count is
//! not disturbed by sockets opened concurrently in other tests.

mod helpers;

use std::borrow::Cow;
use std::fmt;

use canlink_isotp::{Bus, DuplexRole, IsoTpAddr, IsoTpError, NetAddr};
use helpers::isotp_bus;

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

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[tokio::test]
async fn failed_dials_release_descriptors() {
    let Some(bus) = isotp_bus() else { return };
    let baseline = open_fds();

    // Read half opens fine, write half is rejected: the read half is closed.
    let err = bus
        .dial_duplex(&IsoTpAddr::new(0x40, 0x41), &UdpAddr)
        .unwrap_err();
    match &err {
        IsoTpError::Dial {
            role: DuplexRole::Write,
            source,
        } => assert!(matches!(**source, IsoTpError::WrongAddressFamily { .. })),
        other => panic!("expected write-role dial error, got {other:?}"),
    }
    assert_eq!(open_fds(), baseline);

    // Socket is created, configured and registered before bind fails.
    let bogus = Bus::from_index(bus.name(), 0x7FFF_FFFF);
    let err = bogus.dial(&IsoTpAddr::new(0x50, 0x51)).unwrap_err();
    assert!(
        matches!(err, IsoTpError::BindFailed { ifindex: 0x7FFF_FFFF, .. }),
        "expected bind failure, got {err:?}"
    );
    assert_eq!(open_fds(), baseline);

    let err = bogus
        .dial_duplex(&IsoTpAddr::new(0x60, 0x61), &IsoTpAddr::new(0x62, 0x63))
        .unwrap_err();
    assert!(matches!(
        err,
        IsoTpError::Dial {
            role: DuplexRole::Read,
            ..
        }
    ));
    assert_eq!(open_fds(), baseline);
}
