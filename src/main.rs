use std::io;

use anyhow::Context;
use env_logger::Env;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use grpcoin_client::{connect, Config, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let client = connect(&config).context("failed to build channel")?;

    // Ctrl-C abandons the call in flight, or ends the quote stream
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupted, closing stream");
                on_signal.cancel();
            }
            Err(err) => warn!("cannot listen for Ctrl-C: {err}"),
        }
    });

    let mut stdout = io::stdout();
    Session::new(client).run(&mut stdout, cancel).await?;
    Ok(())
}
