//! Command-line arguments for the ISO-TP tools.

use clap::{Args, Parser};
use std::path::PathBuf;

/// Payload `isotp-tx` sends when `--data` is not given.
pub const DEFAULT_PAYLOAD_HEX: &str = "DEAD0001020304050607BEEF";

/// Flags shared by both tools. Any flag given here overrides the config file.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// CAN ID to receive on (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_can_id)]
    pub rxaddr: Option<u32>,

    /// CAN ID to transmit to (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_can_id)]
    pub txaddr: Option<u32>,

    /// CAN interface name [default: vcan0]
    #[arg(long)]
    pub interface: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Give up after this many milliseconds (0 waits forever)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Use 29-bit CAN identifiers
    #[arg(long)]
    pub extended: bool,
}

/// Receive one ISO-TP message and print it as hex.
#[derive(Debug, Parser)]
#[command(name = "isotp-rx", version, about)]
pub struct RxArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = 12)]
    pub size: usize,
}

/// Send one ISO-TP message.
#[derive(Debug, Parser)]
#[command(name = "isotp-tx", version, about)]
pub struct TxArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Payload as hex digits
    #[arg(long, default_value = DEFAULT_PAYLOAD_HEX)]
    pub data: String,
}

/// Parse a CAN ID given as decimal (`2024`) or hex (`0x7E8`).
pub fn parse_can_id(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid CAN ID '{s}': {e}"))
}

/// Decode a hex string (`"DEAD01"`) into bytes. Whitespace is ignored.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in '{s}'"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte '{pair}'"))
        })
        .collect()
}

/// Encode bytes as uppercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
