use std::io::IsTerminal;

use clap::ValueEnum;
use linkwire_session::SessionSnapshot;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

pub fn print_snapshot(snapshot: &SessionSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(snapshot),
        OutputFormat::Pretty => {
            let mut line = format!("state={}", snapshot.state);
            if let Some(code) = &snapshot.room_code {
                line.push_str(&format!(" room={code}"));
            }
            if let Some(peer) = &snapshot.peer_address {
                line.push_str(&format!(" peer={peer}"));
            }
            if let Some(ms) = snapshot.latency_ms {
                line.push_str(&format!(" latency={ms}ms"));
            }
            if let Some(err) = &snapshot.last_error {
                line.push_str(&format!(" error={err:?}"));
            }
            println!("{line}");
        }
    }
}

#[derive(Serialize)]
pub struct HashOutput {
    pub file: String,
    pub hash: String,
}

pub fn print_hash(out: &HashOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Pretty => println!("{}  {}", out.hash, out.file),
    }
}

#[derive(Serialize)]
pub struct AddressesOutput {
    pub addresses: Vec<String>,
}

pub fn print_addresses(out: &AddressesOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Pretty => {
            for address in &out.addresses {
                println!("{address}");
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
