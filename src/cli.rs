use clap::Parser;

/// The tray takes no options; the parser only provides `--help` and `--version`.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "System tray manager for the local Ollama service",
    long_about = "Shows whether `ollama serve` is running and offers start, stop and \
                  restart through `pkexec systemctl`. Set RUST_LOG to change verbosity."
)]
pub struct Args {}
