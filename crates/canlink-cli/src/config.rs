//! Tool configuration, loadable from TOML.
//!
//! Every field is optional; command-line flags override whatever the file
//! provides.

use serde::Deserialize;
use std::path::Path;

use canlink_isotp::{DialOptions, FlowControlOptions, IsoTpOptions, flags};

/// Top-level configuration shared by `isotp-rx` and `isotp-tx`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// CAN interface name.
    #[serde(default = "default_interface")]
    pub interface: String,
    /// CAN ID to receive on.
    #[serde(default)]
    pub rx_addr: Option<u32>,
    /// CAN ID to transmit to.
    #[serde(default)]
    pub tx_addr: Option<u32>,
    /// Treat both IDs as 29-bit identifiers.
    #[serde(default)]
    pub extended_ids: bool,
    /// I/O deadline in milliseconds. 0 or absent waits forever.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Kernel ISO-TP socket options.
    #[serde(default)]
    pub options: OptionsConfig,
    /// Flow control advertised to senders. Kernel defaults when absent.
    #[serde(default)]
    pub flow_control: Option<FlowControlConfig>,
}

pub fn default_interface() -> String {
    "vcan0".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            rx_addr: None,
            tx_addr: None,
            extended_ids: false,
            timeout_ms: None,
            options: OptionsConfig::default(),
            flow_control: None,
        }
    }
}

impl ToolConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn dial_options(&self) -> DialOptions {
        DialOptions {
            isotp: self.options.to_options(),
            flow_control: self.flow_control.as_ref().map(FlowControlConfig::to_options),
        }
    }
}

/// `[options]` section. Unset fields keep the kernel defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub tx_padding: Option<u8>,
    #[serde(default)]
    pub rx_padding: Option<u8>,
    #[serde(default)]
    pub ext_address: Option<u8>,
    #[serde(default)]
    pub rx_ext_address: Option<u8>,
    #[serde(default)]
    pub frame_txtime_ns: Option<u32>,
    #[serde(default)]
    pub listen_mode: bool,
    #[serde(default)]
    pub half_duplex: bool,
    /// Raw flag bits OR-ed in last.
    #[serde(default)]
    pub extra_flags: u32,
}

impl OptionsConfig {
    pub fn to_options(&self) -> IsoTpOptions {
        let mut opts = IsoTpOptions::default();
        if let Some(content) = self.tx_padding {
            opts.set_tx_padding(content);
        }
        if let Some(content) = self.rx_padding {
            opts.set_rx_padding(content);
        }
        if let Some(address) = self.ext_address {
            opts.set_extended_address(address);
        }
        if let Some(address) = self.rx_ext_address {
            opts.set_extended_rx_address(address);
        }
        if let Some(ns) = self.frame_txtime_ns {
            opts.set_frame_txtime(std::time::Duration::from_nanos(ns.into()));
        }
        if self.listen_mode {
            opts.set_flag(flags::LISTEN_MODE);
        }
        if self.half_duplex {
            opts.set_flag(flags::HALF_DUPLEX);
        }
        opts.set_flag(self.extra_flags);
        opts
    }
}

/// `[flow_control]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowControlConfig {
    #[serde(default)]
    pub block_size: u8,
    #[serde(default)]
    pub st_min: u8,
    #[serde(default)]
    pub wft_max: u8,
}

impl FlowControlConfig {
    pub fn to_options(&self) -> FlowControlOptions {
        FlowControlOptions::new(self.block_size, self.st_min, self.wft_max)
    }
}
