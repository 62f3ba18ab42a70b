#![cfg(target_os = "linux")]
//! Message exchange between two sockets on vcan0.

mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use canlink_isotp::{Conn, IsoTpAddr, IsoTpError};
use helpers::{PAYLOAD, PROMPT, isotp_bus};

#[tokio::test]
async fn twelve_byte_message_round_trip() {
    let Some(bus) = isotp_bus() else { return };

    let tx = bus.dial(&IsoTpAddr::new(1, 2)).unwrap();
    let rx = bus.dial(&IsoTpAddr::new(2, 1)).unwrap();
    rx.set_read_deadline(Some(Instant::now() + Duration::from_secs(2)));

    let reader = tokio::spawn(async move {
        let mut buf = [0u8; 12];
        let n = rx.read(&mut buf).await;
        rx.close().unwrap();
        n.map(|n| buf[..n].to_vec())
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let n = tx.write(&PAYLOAD).await.unwrap();
    assert_eq!(n, PAYLOAD.len());

    let received = reader.await.unwrap().unwrap();
    assert_eq!(received, PAYLOAD);
    tx.close().unwrap();
}

#[tokio::test]
async fn read_deadline_expires_on_idle_socket() {
    let Some(bus) = isotp_bus() else { return };

    let conn = bus.dial(&IsoTpAddr::new(0x321, 0x322)).unwrap();
    conn.set_read_deadline(Some(Instant::now() + Duration::from_millis(100)));

    let started = Instant::now();
    let err = conn.read(&mut [0u8; 8]).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(started.elapsed() < PROMPT);

    conn.close().unwrap();
}

#[tokio::test]
async fn close_unblocks_pending_read() {
    let Some(bus) = isotp_bus() else { return };

    let conn = Arc::new(bus.dial(&IsoTpAddr::new(0x331, 0x332)).unwrap());
    let reader = {
        let conn = conn.clone();
        tokio::spawn(async move { conn.read(&mut [0u8; 8]).await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    let closed_at = Instant::now();
    conn.close().unwrap();

    let result = tokio::time::timeout(PROMPT, reader)
        .await
        .expect("read still blocked after close")
        .unwrap();
    assert!(matches!(result, Err(IsoTpError::Closed)));
    assert!(closed_at.elapsed() < PROMPT);
}

#[tokio::test]
async fn second_close_and_later_io_report_closed() {
    let Some(bus) = isotp_bus() else { return };

    let conn = bus.dial(&IsoTpAddr::new(0x341, 0x342)).unwrap();
    conn.close().unwrap();

    assert!(matches!(conn.close(), Err(IsoTpError::Closed)));
    assert!(matches!(
        conn.read(&mut [0u8; 4]).await,
        Err(IsoTpError::Closed)
    ));
    assert!(matches!(conn.write(&[1]).await, Err(IsoTpError::Closed)));
}
