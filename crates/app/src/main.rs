//! Entry point for the model viewer.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = cli::Cli::parse().into_config();
    log::info!(
        "Starting ModelViewer. Backend: {:?}, window_size={}x{}, msaa={}, model={:?}",
        config.backend,
        config.width,
        config.height,
        config.msaa_samples,
        config.asset_path
    );

    match platform::run(config) {
        Ok(()) => {
            log::info!("Graceful shutdown. Bye!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
