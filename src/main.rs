use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clipwatch::app::App;
use clipwatch::clipboard::{BackendKind, Clipboard, Format, create_backend};
use clipwatch::convert::Converter;
use clipwatch::logging;
use clipwatch::notification;
use clipwatch::storage::{Config, ConfigStorage, TomlConfigStorage, ensure_directories, expand_home};
use clipwatch::watch::CancellationToken;

#[derive(Parser)]
#[command(name = "clipwatch")]
#[command(about = "Clipboard watcher with double-copy timestamp conversion", long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/clipwatch/clipwatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Clipboard backend: native or memory
    #[arg(short, long, global = true, default_value = "native")]
    backend: BackendKind,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert copied timestamps and dates (default)
    Run {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Print the clipboard content
    Read {
        /// Content format: text or image
        #[arg(short, long, default_value = "text")]
        format: Format,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy stdin to the clipboard
    Write {
        /// Content format: text or image
        #[arg(short, long, default_value = "text")]
        format: Format,

        /// Block until something else overwrites the clipboard
        #[arg(short, long)]
        wait: bool,
    },

    /// Print clipboard changes as they happen
    Watch {
        /// Content format: text or image
        #[arg(short, long, default_value = "text")]
        format: Format,

        /// Report every change instead of only double copies
        #[arg(short, long)]
        raw: bool,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Print the clipboard change counter
    Count,

    /// Convert a timestamp or date without touching the clipboard
    Convert {
        /// A Unix timestamp in seconds or milliseconds, or a date
        text: String,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => expand_home(path),
        None => {
            let (_, config_dir) = ensure_directories()?;
            config_dir.join("clipwatch.toml")
        }
    };
    let config_storage = TomlConfigStorage::new(config_path);
    let config = config_storage.load()?;

    init_logging(&config)?;

    match cli.command.unwrap_or(Commands::Run { duration: None }) {
        Commands::Run { duration } => cmd_run(&config, cli.backend, duration),
        Commands::Read { format, output } => cmd_read(&config, cli.backend, format, output),
        Commands::Write { format, wait } => cmd_write(&config, cli.backend, format, wait),
        Commands::Watch {
            format,
            raw,
            duration,
        } => cmd_watch(&config, cli.backend, format, raw, duration),
        Commands::Count => cmd_count(&config, cli.backend),
        Commands::Convert { text } => cmd_convert(&config, &text),
        Commands::Config => cmd_config(&config_storage, &config),
    }
}

/// Log to the configured file, or to stderr when none is set
fn init_logging(config: &Config) -> Result<()> {
    match &config.log.file {
        Some(path) => logging::init_logger(&expand_home(path.clone()), &config.log.level)
            .context("Failed to initialize logging"),
        None => {
            logging::init_stderr_logger(&config.log.level);
            Ok(())
        }
    }
}

fn open_clipboard(config: &Config, kind: BackendKind) -> Result<Clipboard> {
    let backend = create_backend(kind).context("Failed to open clipboard")?;
    Ok(Clipboard::with_options(backend, config.watch.to_options()))
}

/// Cancel `cancel` after `duration` seconds, if given
fn cancel_after(cancel: &CancellationToken, duration: Option<u64>) {
    if let Some(secs) = duration {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            cancel.cancel();
        });
    }
}

/// Run the conversion daemon
fn cmd_run(config: &Config, kind: BackendKind, duration: Option<u64>) -> Result<()> {
    let clipboard = open_clipboard(config, kind)?;
    let app = App::new(clipboard, config, notification::from_config(&config.notification));

    let cancel = CancellationToken::new();
    cancel_after(&cancel, duration);
    app.run(&cancel);

    Ok(())
}

fn cmd_read(config: &Config, kind: BackendKind, format: Format, output: Option<PathBuf>) -> Result<()> {
    let clipboard = open_clipboard(config, kind)?;
    let data = clipboard
        .read(format)
        .with_context(|| format!("Failed to read {} from clipboard", format))?;

    match output {
        Some(path) => {
            fs::write(&path, &data).with_context(|| format!("Failed to write {:?}", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&data).context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn cmd_write(config: &Config, kind: BackendKind, format: Format, wait: bool) -> Result<()> {
    let clipboard = open_clipboard(config, kind)?;

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let signal = clipboard
        .write(format, &buffer)
        .with_context(|| format!("Failed to write {} to clipboard", format))?;
    log::info!("Copied {} bytes of {}", buffer.len(), format);

    if wait {
        if signal.wait() {
            println!("Clipboard overwritten");
        } else {
            println!("Stopped waiting before the clipboard was overwritten");
        }
    }

    Ok(())
}

fn cmd_watch(
    config: &Config,
    kind: BackendKind,
    format: Format,
    raw: bool,
    duration: Option<u64>,
) -> Result<()> {
    let clipboard = open_clipboard(config, kind)?;
    let cancel = CancellationToken::new();
    cancel_after(&cancel, duration);

    let events = if raw {
        clipboard.watch_raw(&cancel, format)
    } else {
        clipboard.watch(&cancel, format)
    };

    let mut stdout = io::stdout().lock();
    for payload in events {
        match format {
            Format::Text => writeln!(stdout, "{}", String::from_utf8_lossy(&payload))?,
            Format::Image => writeln!(stdout, "image: {} bytes", payload.len())?,
        }
        stdout.flush()?;
    }

    Ok(())
}

fn cmd_count(config: &Config, kind: BackendKind) -> Result<()> {
    let clipboard = open_clipboard(config, kind)?;
    println!("{}", clipboard.change_count());
    Ok(())
}

fn cmd_convert(config: &Config, text: &str) -> Result<()> {
    let conversion = Converter::new(config.convert.clone())
        .convert(text)
        .with_context(|| format!("Cannot convert {:?}", text))?;
    println!("{}", conversion.display());
    Ok(())
}

fn cmd_config(storage: &TomlConfigStorage, config: &Config) -> Result<()> {
    println!("# {}", storage.path().display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize configuration")?
    );
    Ok(())
}
