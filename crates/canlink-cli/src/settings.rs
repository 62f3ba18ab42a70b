//! Effective tool settings: config file first, then command-line overrides.

use anyhow::Context;
use std::time::{Duration, Instant};

use canlink_isotp::{DialOptions, IsoTpAddr};

use crate::args::CommonArgs;
use crate::config::ToolConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub interface: String,
    pub addr: IsoTpAddr,
    pub timeout: Option<Duration>,
    pub options: DialOptions,
}

impl Settings {
    /// Load the config file named by `--config`, if any, and apply flags.
    pub fn resolve(args: &CommonArgs) -> anyhow::Result<Self> {
        let config = match &args.config {
            Some(path) => ToolConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ToolConfig::default(),
        };
        Ok(Self::merge(config, args))
    }

    pub fn merge(config: ToolConfig, args: &CommonArgs) -> Self {
        let rx_id = args.rxaddr.or(config.rx_addr).unwrap_or(0);
        let tx_id = args.txaddr.or(config.tx_addr).unwrap_or(0);
        let addr = if args.extended || config.extended_ids {
            IsoTpAddr::extended(rx_id, tx_id)
        } else {
            IsoTpAddr::new(rx_id, tx_id)
        };
        let timeout = args
            .timeout_ms
            .or(config.timeout_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Self {
            options: config.dial_options(),
            interface: args.interface.clone().unwrap_or(config.interface),
            addr,
            timeout,
        }
    }

    /// Deadline for the next operation, measured from now.
    pub fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| Instant::now() + t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canlink_isotp::{CAN_EFF_FLAG, FlowControlOptions};
    use clap::Parser;

    fn common(argv: &[&str]) -> CommonArgs {
        let mut full = vec!["isotp-rx"];
        full.extend_from_slice(argv);
        crate::args::RxArgs::parse_from(full).common
    }

    #[test]
    fn defaults_without_config() {
        let settings = Settings::merge(ToolConfig::default(), &common(&[]));
        assert_eq!(settings.interface, "vcan0");
        assert_eq!(settings.addr, IsoTpAddr::new(0, 0));
        assert!(settings.timeout.is_none());
        assert!(settings.deadline().is_none());
        assert_eq!(settings.options, DialOptions::default());
    }

    #[test]
    fn flags_override_config() {
        let config: ToolConfig = toml::from_str(
            r#"
interface = "can1"
rx_addr = 0x7E8
tx_addr = 0x7E0
timeout_ms = 1000

[flow_control]
block_size = 4
"#,
        )
        .unwrap();
        let args = common(&["--rxaddr", "2", "--interface", "vcan0", "--timeout-ms", "250"]);
        let settings = Settings::merge(config, &args);

        assert_eq!(settings.interface, "vcan0");
        assert_eq!(settings.addr, IsoTpAddr::new(2, 0x7E0));
        assert_eq!(settings.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            settings.options.flow_control,
            Some(FlowControlOptions::new(4, 0, 0))
        );
    }

    #[test]
    fn zero_timeout_means_no_deadline() {
        let settings = Settings::merge(ToolConfig::default(), &common(&["--timeout-ms", "0"]));
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn extended_flag_marks_both_ids() {
        let args = common(&["--rxaddr", "0x18DAF110", "--txaddr", "0x18DA10F1", "--extended"]);
        let settings = Settings::merge(ToolConfig::default(), &args);
        assert!(settings.addr.is_extended());
        assert_eq!(settings.addr.local(), 0x18DA_F110 | CAN_EFF_FLAG);
        assert_eq!(settings.addr.peer(), 0x18DA_10F1 | CAN_EFF_FLAG);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = common(&["--config", "/nonexistent/isotp.toml"]);
        let err = Settings::resolve(&args).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
        let io_err = err.root_cause().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
    }
}
