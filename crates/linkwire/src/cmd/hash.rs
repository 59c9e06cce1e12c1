use linkwire_session::hash_file;

use crate::cmd::HashArgs;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_hash, HashOutput, OutputFormat};

pub fn run(args: HashArgs, format: OutputFormat) -> CliResult<i32> {
    let hash = hash_file(&args.rom)
        .map_err(|err| io_error(&format!("failed hashing {}", args.rom.display()), err))?;

    print_hash(
        &HashOutput {
            file: args.rom.display().to_string(),
            hash: format!("{hash:#010x}"),
        },
        format,
    );

    Ok(SUCCESS)
}
