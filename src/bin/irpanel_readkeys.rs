//! Learn the infrared codes of a remote control and print them as a key table.
//!
//! Key names are read from stdin, one per line. For each name the tool waits for a
//! button press and prints a `"name",address,command` row, so the output can be
//! redirected straight into `keys.csv`. With `--raw` it just prints every code seen.

use anyhow::{bail, Context, Result};
use clap::Parser;
use irpanel::config::{LoggingConfig, PanelTarget};
use irpanel::init_logging;
use irpanel::keymap::format_row;
use irpanel::protocol::{split_code, Packet};
use irpanel::transport::connect;
use std::io::{self, BufRead, BufReader, Lines, Write};

#[derive(Debug, Parser)]
#[command(about = "Record IR remote codes for an irpanel key table", author, version)]
struct ReadKeysConfig {
    /// Unix socket path or HOST:PORT of the panel daemon
    #[arg(value_name = "SOCKET|HOST:PORT")]
    target: String,

    /// Print ADDRESS,COMMAND for every press instead of asking for key names
    #[arg(short, long)]
    raw: bool,

    #[command(flatten)]
    logging: LoggingConfig,
}

enum Reading {
    Code(u32, u32),
    Invalid(String),
    Closed,
}

fn main() -> Result<()> {
    let config = ReadKeysConfig::parse();
    config.logging.validate()?;
    init_logging(&config.logging)?;
    let target = PanelTarget::parse(&config.target)?;
    let connection = connect(&target)?;
    tracing::info!(peer = %connection.peer, "connected to panel");

    // No termination handlers: Ctrl+C keeps its default action.
    let mut packets = BufReader::new(connection.reader).lines();
    if config.raw {
        print_raw(&mut packets)
    } else {
        learn_keys(&mut packets, io::stdin().lock())
    }
}

fn print_raw<B: BufRead>(packets: &mut Lines<B>) -> Result<()> {
    let mut stdout = io::stdout().lock();
    loop {
        match next_reading(packets)? {
            Reading::Code(address, command) => {
                writeln!(stdout, "{address},{command}")?;
                stdout.flush()?;
            }
            Reading::Invalid(line) => tracing::warn!("ignoring {line:?}"),
            Reading::Closed => return Ok(()),
        }
    }
}

fn learn_keys<B: BufRead, S: BufRead>(packets: &mut Lines<B>, names: S) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for name in names.lines() {
        let name = name.context("reading key names from stdin")?;
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        eprint!("Press {name}: ");
        loop {
            match next_reading(packets)? {
                Reading::Code(address, command) => {
                    eprintln!("{address}:{command}");
                    writeln!(stdout, "{}", format_row(name, address, command))?;
                    stdout.flush()?;
                    break;
                }
                Reading::Invalid(_) => eprint!("Try again... "),
                Reading::Closed => bail!("panel closed the connection"),
            }
        }
    }
    Ok(())
}

/// Wait for the next infrared packet, skipping anything else the panel sends.
fn next_reading<B: BufRead>(packets: &mut Lines<B>) -> Result<Reading> {
    for line in packets.by_ref() {
        let line = line.context("reading from panel")?;
        match Packet::parse(line.trim_end_matches('\r')) {
            Ok(Packet::Infrared { code }) => {
                return Ok(match split_code(&code) {
                    Some((address, command)) => Reading::Code(address, command),
                    None => Reading::Invalid(code),
                });
            }
            Ok(Packet::Other { tag, .. }) => tracing::debug!(tag = %tag, "skipping packet"),
            Err(err) => return Ok(Reading::Invalid(err.line)),
        }
    }
    Ok(Reading::Closed)
}
