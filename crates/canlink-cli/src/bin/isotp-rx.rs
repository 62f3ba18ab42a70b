//! isotp-rx: receive one ISO-TP message and print it as hex.

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use canlink_cli::args::{RxArgs, to_hex};
    use canlink_cli::settings::Settings;
    use clap::Parser;

    canlink_cli::init_tracing();
    let args = RxArgs::parse();

    let result: anyhow::Result<Vec<u8>> = async {
        let settings = Settings::resolve(&args.common)?;
        canlink_cli::run::receive(&settings, args.size).await
    }
    .await;

    match result {
        Ok(payload) => {
            println!("Received: {}", to_hex(&payload));
            Ok(())
        }
        Err(e) => {
            tracing::error!("isotp-rx failed: {e:#}");
            Err(e)
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("isotp-rx requires Linux kernel ISO-TP sockets")
}
