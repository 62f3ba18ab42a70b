//! One-shot receive and send against a kernel ISO-TP socket.

use anyhow::Context;

use canlink_isotp::{Bus, Conn};

use crate::settings::Settings;

/// Dial, read one message of at most `size` bytes, close.
pub async fn receive(settings: &Settings, size: usize) -> anyhow::Result<Vec<u8>> {
    let bus = Bus::by_name(&settings.interface).context("failed to get bus")?;
    let conn = bus
        .dial_with(&settings.addr, settings.options)
        .context("dial failed")?;
    tracing::info!(interface = %settings.interface, addr = %conn.local_addr(), "waiting for message");

    conn.set_read_deadline(settings.deadline());
    let mut buf = vec![0u8; size];
    let result = conn.read(&mut buf).await;
    if let Err(e) = conn.close() {
        tracing::warn!(error = %e, "close failed");
    }

    let n = result.context("read failed")?;
    buf.truncate(n);
    tracing::debug!(bytes = n, "message received");
    Ok(buf)
}

/// Dial, write `payload` as one message, close.
pub async fn send(settings: &Settings, payload: &[u8]) -> anyhow::Result<usize> {
    let bus = Bus::by_name(&settings.interface).context("failed to get bus")?;
    let conn = bus
        .dial_with(&settings.addr, settings.options)
        .context("dial failed")?;

    conn.set_write_deadline(settings.deadline());
    let result = conn.write(payload).await;
    if let Err(e) = conn.close() {
        tracing::warn!(error = %e, "close failed");
    }

    let n = result.with_context(|| format!("write of {} bytes failed", payload.len()))?;
    tracing::info!(interface = %settings.interface, addr = %settings.addr, bytes = n, "message sent");
    Ok(n)
}
