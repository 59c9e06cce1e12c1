use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use linkwire_session::{LinkSession, SessionSnapshot, SessionState, DEFAULT_PORT};

use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_snapshot, OutputFormat};

pub mod addresses;
pub mod hash;
pub mod host;
pub mod join;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host a link session and wait for a peer.
    Host(HostArgs),
    /// Join a hosted link session.
    Join(JoinArgs),
    /// Print the game hash of a file.
    Hash(HashArgs),
    /// Print local addresses a peer can try.
    Addresses(AddressesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::Join(args) => join::run(args, format),
        Command::Hash(args) => hash::run(args, format),
        Command::Addresses(args) => addresses::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Game image both players must share.
    pub rom: PathBuf,
    /// Port to listen on (0 picks an ephemeral port).
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// How long to wait for a joiner (e.g. 300s, 500ms).
    #[arg(long, default_value = "300s", conflicts_with = "no_timeout")]
    pub timeout: String,
    /// Wait for a joiner indefinitely.
    #[arg(long)]
    pub no_timeout: bool,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Host name or address to connect to.
    pub host: String,
    /// Game image both players must share.
    pub rom: PathBuf,
    /// Port the host is listening on.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub rom: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct AddressesArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Print snapshots until the link closes. Ctrl-C tears the session
/// down cleanly and the loop exits on the final snapshot.
pub(crate) fn watch(
    session: &LinkSession,
    events: &Receiver<SessionSnapshot>,
    format: OutputFormat,
) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut interrupted = false;
    loop {
        if !interrupted && !running.load(Ordering::SeqCst) {
            interrupted = true;
            session.disconnect();
        }

        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(snapshot) => {
                print_snapshot(&snapshot, format);
                if snapshot.state == SessionState::Disconnected {
                    return match snapshot.last_error {
                        Some(reason) if !interrupted => Err(CliError::new(FAILURE, reason)),
                        _ => Ok(SUCCESS),
                    };
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::new(INTERNAL, "session driver stopped unexpectedly"));
            }
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
