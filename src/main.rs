mod cli;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod tray;
    }
}

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use ollama_tray::{TrayConfig, exec, signals};

fn main() {
    // Initialize logger with the same line format as the rest of our tools
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let _args = cli::Args::parse();

    if let Err(e) = real_main() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cfg = TrayConfig::default();
    let title = cfg.title.clone();
    preflight(&cfg);
    signals::install_handlers()?;

    run_tray(cfg)?;
    info!("{title} system tray exiting...");
    Ok(())
}

/// Warn about external tools that are not on PATH. Nothing changes at runtime:
/// a missing tool just makes its operation fail when used.
fn preflight(cfg: &TrayConfig) {
    for tool in cfg.external_tools() {
        match exec::locate(tool) {
            Some(path) => log::debug!("using {}", path.display()),
            None => warn!("`{tool}` not found on PATH; related tray actions will fail"),
        }
    }
}

#[cfg(target_os = "linux")]
fn run_tray(cfg: TrayConfig) -> Result<()> {
    use anyhow::Context;
    use crossbeam_channel::unbounded;
    use ollama_tray::{Reactor, SystemRunner};

    let (event_tx, event_rx) = unbounded();
    let (command_tx, command_rx) = unbounded();

    // The tray surface must exist before anything else runs; failing here aborts startup.
    let frontend = tray::TrayFrontend::build(&cfg, event_tx)?;

    let sink = tray::ChannelSink::new(command_tx, &cfg);
    let reactor = Reactor::new(SystemRunner, sink, cfg);
    let worker = std::thread::Builder::new()
        .name("reactor".into())
        .spawn(move || reactor.run(event_rx))
        .context("Failed to spawn reactor thread")?;

    frontend.run(command_rx);

    let last = worker
        .join()
        .map_err(|_| anyhow::anyhow!("reactor thread panicked"))?;
    info!("last observed state: {last}");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run_tray(_cfg: TrayConfig) -> Result<()> {
    anyhow::bail!("the tray front end is only available on Linux")
}
