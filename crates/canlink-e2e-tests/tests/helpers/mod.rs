//! Shared harness for the live-bus tests.

#![allow(dead_code)]

use std::time::Duration;

use canlink_isotp::{Bus, Conn, IsoTpAddr};

pub const VCAN: &str = "vcan0";

/// Upper bound for anything expected to finish promptly.
pub const PROMPT: Duration = Duration::from_secs(1);

/// The 12-byte test message: DE AD, 00..07, BE EF.
pub const PAYLOAD: [u8; 12] = [
    0xDE, 0xAD, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xBE, 0xEF,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("canlink_isotp=debug")
        .with_test_writer()
        .try_init();
}

/// `vcan0` with working ISO-TP sockets, or `None` to skip the test.
///
/// Must be called from inside a Tokio runtime.
pub fn isotp_bus() -> Option<Bus> {
    init_tracing();
    let bus = match Bus::by_name(VCAN) {
        Ok(bus) => bus,
        Err(e) => {
            eprintln!("skipping: {e}");
            return None;
        }
    };
    match bus.dial(&IsoTpAddr::new(0x7F0, 0x7F1)) {
        Ok(probe) => {
            let _ = probe.close();
            Some(bus)
        }
        Err(e) => {
            eprintln!("skipping: no ISO-TP on {VCAN}: {e}");
            None
        }
    }
}
