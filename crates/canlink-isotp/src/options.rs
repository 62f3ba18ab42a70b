//! Kernel ISO-TP socket options.
//!
//! [`IsoTpOptions`] mirrors `struct can_isotp_options` from
//! `linux/can/isotp.h` and is written to the socket as a 12-byte record in
//! native byte order. Setters that carry a content byte also set the flag
//! that makes the kernel honour it.

use std::time::Duration;

/// Kernel ISO-TP flag constants.
pub mod flags {
    /// Listen-only mode (do not send FC frames).
    pub const LISTEN_MODE: u32 = 0x0001;
    /// Enable extended addressing.
    pub const EXTEND_ADDR: u32 = 0x0002;
    /// Enable CAN frame padding on the TX path.
    pub const TX_PADDING: u32 = 0x0004;
    /// Enable CAN frame padding on the RX path.
    pub const RX_PADDING: u32 = 0x0008;
    /// Check received CAN frame padding length.
    pub const CHK_PAD_LEN: u32 = 0x0010;
    /// Check received CAN frame padding content.
    pub const CHK_PAD_DATA: u32 = 0x0020;
    /// Half-duplex error state handling.
    pub const HALF_DUPLEX: u32 = 0x0040;
    /// Ignore STmin from received FC frames.
    pub const FORCE_TXSTMIN: u32 = 0x0080;
    /// Ignore CFs depending on RX STmin.
    pub const FORCE_RXSTMIN: u32 = 0x0100;
    /// Different RX extended addressing.
    pub const RX_EXT_ADDR: u32 = 0x0200;
    /// Wait for TX completion.
    pub const WAIT_TX_DONE: u32 = 0x0400;
    /// 1-to-N functional addressing (single frame).
    pub const SF_BROADCAST: u32 = 0x0800;
    /// 1-to-N transmission without FC.
    pub const CF_BROADCAST: u32 = 0x1000;
}

pub const DEFAULT_FLAGS: u32 = flags::WAIT_TX_DONE;
pub const DEFAULT_EXT_ADDRESS: u8 = 0x00;
/// 0xCC prevents bit-stuffing in padded frames.
pub const DEFAULT_PAD_CONTENT: u8 = 0xCC;
/// 50 µs between frames.
pub const DEFAULT_FRAME_TXTIME: u32 = 50_000;
/// Kernel sentinel for "no gap between frames". A raw 0 keeps the default.
pub const FRAME_TXTIME_ZERO: u32 = u32::MAX;
pub const DEFAULT_RECV_BS: u8 = 0;
pub const DEFAULT_RECV_STMIN: u8 = 0x00;
pub const DEFAULT_RECV_WFTMAX: u8 = 0;

/// Size of the encoded `can_isotp_options` record.
pub const ISOTP_OPTIONS_LEN: usize = 12;

/// Size of the encoded `can_isotp_fc_options` record.
pub const FC_OPTIONS_LEN: usize = 3;

/// Base protocol behaviour for one ISO-TP socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoTpOptions {
    flags: u32,
    frame_txtime: u32,
    ext_address: u8,
    tx_pad_content: u8,
    rx_pad_content: u8,
    rx_ext_address: u8,
}

impl Default for IsoTpOptions {
    fn default() -> Self {
        Self {
            flags: DEFAULT_FLAGS,
            frame_txtime: DEFAULT_FRAME_TXTIME,
            ext_address: DEFAULT_EXT_ADDRESS,
            tx_pad_content: DEFAULT_PAD_CONTENT,
            rx_pad_content: DEFAULT_PAD_CONTENT,
            rx_ext_address: DEFAULT_EXT_ADDRESS,
        }
    }
}

impl IsoTpOptions {
    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag == flag
    }

    /// Frame transmission time (N_As/N_Ar) in nanoseconds.
    pub fn frame_txtime(&self) -> u32 {
        self.frame_txtime
    }

    pub fn ext_address(&self) -> u8 {
        self.ext_address
    }

    pub fn tx_pad_content(&self) -> u8 {
        self.tx_pad_content
    }

    pub fn rx_pad_content(&self) -> u8 {
        self.rx_pad_content
    }

    pub fn rx_ext_address(&self) -> u8 {
        self.rx_ext_address
    }

    pub fn set_flag(&mut self, flag: u32) -> &mut Self {
        self.flags |= flag;
        self
    }

    pub fn clear_flag(&mut self, flag: u32) -> &mut Self {
        self.flags &= !flag;
        self
    }

    /// Pad transmitted frames with `content`.
    pub fn set_tx_padding(&mut self, content: u8) -> &mut Self {
        self.tx_pad_content = content;
        self.set_flag(flags::TX_PADDING)
    }

    /// Expect received frames padded with `content`.
    pub fn set_rx_padding(&mut self, content: u8) -> &mut Self {
        self.rx_pad_content = content;
        self.set_flag(flags::RX_PADDING)
    }

    /// Use extended addressing with `address` as the first payload byte.
    pub fn set_extended_address(&mut self, address: u8) -> &mut Self {
        self.ext_address = address;
        self.set_flag(flags::EXTEND_ADDR)
    }

    /// Use a separate extended address on the receive path.
    pub fn set_extended_rx_address(&mut self, address: u8) -> &mut Self {
        self.rx_ext_address = address;
        self.set_flag(flags::RX_EXT_ADDR)
    }

    /// Frame spacing in nanoseconds. `Duration::ZERO` requests back-to-back
    /// frames; longer gaps saturate just below the zero sentinel.
    pub fn set_frame_txtime(&mut self, txtime: Duration) -> &mut Self {
        self.frame_txtime = if txtime.is_zero() {
            FRAME_TXTIME_ZERO
        } else {
            let max = u128::from(FRAME_TXTIME_ZERO - 1);
            txtime.as_nanos().min(max) as u32
        };
        self
    }

    pub fn with_flag(mut self, flag: u32) -> Self {
        self.set_flag(flag);
        self
    }

    pub fn with_tx_padding(mut self, content: u8) -> Self {
        self.set_tx_padding(content);
        self
    }

    pub fn with_rx_padding(mut self, content: u8) -> Self {
        self.set_rx_padding(content);
        self
    }

    pub fn with_extended_address(mut self, address: u8) -> Self {
        self.set_extended_address(address);
        self
    }

    pub fn with_extended_rx_address(mut self, address: u8) -> Self {
        self.set_extended_rx_address(address);
        self
    }

    pub fn with_frame_txtime(mut self, txtime: Duration) -> Self {
        self.set_frame_txtime(txtime);
        self
    }

    /// Encode as the kernel's `struct can_isotp_options`.
    pub fn to_bytes(&self) -> [u8; ISOTP_OPTIONS_LEN] {
        let mut out = [0u8; ISOTP_OPTIONS_LEN];
        out[0..4].copy_from_slice(&self.flags.to_ne_bytes());
        out[4..8].copy_from_slice(&self.frame_txtime.to_ne_bytes());
        out[8] = self.ext_address;
        out[9] = self.tx_pad_content;
        out[10] = self.rx_pad_content;
        out[11] = self.rx_ext_address;
        out
    }
}

/// Flow control parameters the kernel advertises in FC frames it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControlOptions {
    /// Block size (0 = unlimited).
    pub block_size: u8,
    /// STmin raw encoding as defined by ISO-TP.
    pub st_min: u8,
    /// Maximum number of wait frames.
    pub wft_max: u8,
}

impl Default for FlowControlOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_RECV_BS,
            st_min: DEFAULT_RECV_STMIN,
            wft_max: DEFAULT_RECV_WFTMAX,
        }
    }
}

impl FlowControlOptions {
    pub fn new(block_size: u8, st_min: u8, wft_max: u8) -> Self {
        Self {
            block_size,
            st_min,
            wft_max,
        }
    }

    /// Encode as the kernel's `struct can_isotp_fc_options`.
    pub fn to_bytes(&self) -> [u8; FC_OPTIONS_LEN] {
        [self.block_size, self.st_min, self.wft_max]
    }
}

/// Everything applied to a socket between creation and bind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialOptions {
    pub isotp: IsoTpOptions,
    pub flow_control: Option<FlowControlOptions>,
}

impl DialOptions {
    pub fn with_flow_control(mut self, fc: FlowControlOptions) -> Self {
        self.flow_control = Some(fc);
        self
    }
}

impl From<IsoTpOptions> for DialOptions {
    fn from(isotp: IsoTpOptions) -> Self {
        Self {
            isotp,
            flow_control: None,
        }
    }
}
