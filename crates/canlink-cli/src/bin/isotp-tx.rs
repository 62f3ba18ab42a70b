//! isotp-tx: send one ISO-TP message.

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use canlink_cli::args::{TxArgs, parse_hex};
    use canlink_cli::settings::Settings;
    use clap::Parser;

    canlink_cli::init_tracing();
    let args = TxArgs::parse();

    let result: anyhow::Result<usize> = async {
        let payload = parse_hex(&args.data)
            .map_err(anyhow::Error::msg)
            .context("invalid --data")?;
        let settings = Settings::resolve(&args.common)?;
        canlink_cli::run::send(&settings, &payload).await
    }
    .await;

    if let Err(e) = &result {
        tracing::error!("isotp-tx failed: {e:#}");
    }
    result.map(|_| ())
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("isotp-tx requires Linux kernel ISO-TP sockets")
}
