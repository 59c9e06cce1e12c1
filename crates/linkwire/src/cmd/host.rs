use linkwire_session::{hash_file, LinkSession};
use tracing::info;

use crate::cmd::{parse_duration, watch, HostArgs};
use crate::exit::{io_error, session_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let game_hash = hash_file(&args.rom)
        .map_err(|err| io_error(&format!("failed hashing {}", args.rom.display()), err))?;

    let timeout = if args.no_timeout {
        None
    } else {
        Some(parse_duration(&args.timeout)?)
    };

    let (session, events) =
        LinkSession::spawn().map_err(|err| session_error("session setup failed", err))?;
    let room_code = session
        .host(game_hash, args.port, timeout)
        .map_err(|err| session_error("host failed", err))?;

    let hash_hex = format!("{game_hash:#010x}");
    info!(room_code = %room_code, game_hash = %hash_hex, "waiting for a peer");
    for address in LinkSession::local_addresses() {
        info!(address = %address, "reachable at");
    }

    watch(&session, &events, format)
}
