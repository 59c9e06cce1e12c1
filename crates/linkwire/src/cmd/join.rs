use linkwire_session::{hash_file, LinkSession};
use tracing::info;

use crate::cmd::{watch, JoinArgs};
use crate::exit::{io_error, session_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: JoinArgs, format: OutputFormat) -> CliResult<i32> {
    let game_hash = hash_file(&args.rom)
        .map_err(|err| io_error(&format!("failed hashing {}", args.rom.display()), err))?;

    let (session, events) =
        LinkSession::spawn().map_err(|err| session_error("session setup failed", err))?;
    session
        .join(args.host.as_str(), args.port, game_hash)
        .map_err(|err| session_error("join failed", err))?;

    info!(host = %args.host, port = args.port, "connected, handshake in flight");

    watch(&session, &events, format)
}
