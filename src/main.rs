use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sensorpack::logging::{LogTarget, init_logging};
use sensorpack::packet::ElementType;
use sensorpack::{decoder, encode, reader};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::info;

#[derive(Parser)]
#[command(name = "sensorpack", version, about = "Build and inspect sensor telemetry packets")]
struct Cli {
    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    #[arg(long, global = true, default_value = "sensorpack.log")]
    log_file: PathBuf,

    /// Default level; RUST_LOG overrides it
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a packet from values and print it as hex
    Encode {
        #[arg(short, long)]
        address: u8,

        #[arg(short = 't', long = "type", value_enum)]
        element_type: TypeArg,

        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,
    },
    /// Decode hex-encoded packets
    Decode {
        #[arg(required = true)]
        packets: Vec<String>,
    },
    /// Decode a capture file of concatenated packets
    Read {
        path: PathBuf,

        /// The file holds one hex packet per line
        #[arg(long)]
        hex: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    Int8,
    Float32,
    Float64,
}

impl From<TypeArg> for ElementType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Int8 => ElementType::Int8,
            TypeArg::Float32 => ElementType::Float32,
            TypeArg::Float64 => ElementType::Float64,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let target = if cli.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::File(cli.log_file.clone())
    };
    let _guard = init_logging(&target, cli.log_level)?;

    match cli.command {
        Command::Encode {
            address,
            element_type,
            values,
        } => {
            let bytes = encode_packet(address, element_type.into(), &values)?;
            println!("{}", hex::encode_upper(bytes));
        }
        Command::Decode { packets } => {
            for text in &packets {
                let packet = decoder::depacketize_hex(text)
                    .with_context(|| format!("Failed to decode {text:?}"))?;
                println!("{packet}\n");
            }
        }
        Command::Read { path, hex } => {
            if hex {
                for packet in reader::read_hex_lines(&path)? {
                    println!("{packet}\n");
                }
            } else {
                let summary = reader::read_capture(&path, |progress| {
                    tracing::trace!(progress, "Capture read progress");
                })?;
                for packet in &summary.packets {
                    println!("{packet}\n");
                }
                println!(
                    "{} packets, {} skipped bytes, {} trailing bytes",
                    summary.packets.len(),
                    summary.skipped_bytes,
                    summary.trailing_bytes
                );
            }
        }
    }

    Ok(())
}

fn encode_packet(address: u8, element_type: ElementType, values: &[String]) -> Result<Vec<u8>> {
    let packet = encode::build_packet(address, element_type, values)?;
    let bytes = packet.serialize()?;
    info!(
        address,
        element_type = %element_type,
        count = values.len(),
        len = bytes.len(),
        "Encoded packet"
    );
    Ok(bytes)
}
