use linkwire_session::LinkSession;

use crate::cmd::AddressesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_addresses, AddressesOutput, OutputFormat};

pub fn run(_args: AddressesArgs, format: OutputFormat) -> CliResult<i32> {
    print_addresses(
        &AddressesOutput {
            addresses: LinkSession::local_addresses(),
        },
        format,
    );

    Ok(SUCCESS)
}
