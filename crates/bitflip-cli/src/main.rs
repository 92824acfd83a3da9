//! Bitflip Command-Line Interface
//!
//! Runs the 3-qubit bit-flip code on the local simulator: encoding,
//! error injection, correction, statevector inspection and batch runs.
//!
//! ```text
//!   q0: ──●────●──   |ψ⟩ → α|000⟩ + β|111⟩
//!   q1: ──⊕────┼──
//!   q2: ───────⊕──
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use bitflip_qec::{CorrectionMode, ErrorSelection, InitialState};
use commands::common::OutputFormat;
use commands::{batch, compare, correct, encode, error, majority, pipeline, statevector};

/// Bitflip - 3-qubit bit-flip error correction on a local simulator
#[derive(Parser, Debug)]
#[command(name = "bitflip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Logical state and shot count shared by the circuit commands.
#[derive(Args, Debug, Clone)]
struct StateArgs {
    /// Initial logical state: 0, 1, + or -
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    state: InitialState,

    /// Number of shots
    #[arg(long, default_value_t = 1000, env = "BITFLIP_SHOTS")]
    shots: u32,

    /// Do not print the circuit drawing
    #[arg(long)]
    no_circuit: bool,
}

/// Where the bit-flip lands.
#[derive(Args, Debug, Clone)]
struct ErrorArgs {
    /// Qubit to flip (0-2)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..3))]
    qubit: u8,

    /// Flip a uniformly random qubit instead
    #[arg(long, conflicts_with = "qubit")]
    random: bool,
}

impl ErrorArgs {
    fn selection(&self) -> ErrorSelection {
        if self.random {
            ErrorSelection::Random
        } else {
            ErrorSelection::Fixed(usize::from(self.qubit))
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a logical state into three qubits
    Encode {
        #[command(flatten)]
        state: StateArgs,
    },

    /// Encode and inject a bit-flip error
    Error {
        #[command(flatten)]
        state: StateArgs,

        #[command(flatten)]
        error: ErrorArgs,
    },

    /// Encode, inject an error and correct it
    Correct {
        #[command(flatten)]
        state: StateArgs,

        #[command(flatten)]
        error: ErrorArgs,

        /// Correction strategy
        #[arg(short, long, default_value = "mirror")]
        mode: CorrectionMode,
    },

    /// Run the full encode → error → correct → measure pipeline
    Pipeline {
        #[command(flatten)]
        state: StateArgs,

        #[command(flatten)]
        error: ErrorArgs,

        /// Correction strategy
        #[arg(short, long, default_value = "mirror")]
        mode: CorrectionMode,

        /// Decode back onto qubit 0 before measuring
        #[arg(long)]
        decode: bool,

        /// Only print the results
        #[arg(long)]
        quiet: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the statevector after each stage
    Statevector {
        /// Initial logical state: 0, 1, + or -
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        state: InitialState,

        /// Qubit to flip (0-2)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..3))]
        qubit: u8,
    },

    /// Majority-vote decode 3-bit readouts
    Majority {
        /// Readouts such as 010 or 110
        #[arg(required = true)]
        bits: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run randomized pipelines and summarize success rates
    Batch {
        /// Number of trials
        #[arg(short = 'n', long, default_value_t = 20)]
        trials: usize,

        /// Shots per trial
        #[arg(long, default_value_t = bitflip_qec::BATCH_SHOTS)]
        shots: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Compare outcomes with and without correction
    Compare {
        /// Initial logical state: 0, 1, + or -
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        state: InitialState,

        /// Qubit to flip (0-2)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..3))]
        qubit: u8,

        /// Number of shots
        #[arg(long, default_value_t = 1000, env = "BITFLIP_SHOTS")]
        shots: u32,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Encode { state } => {
            encode::execute(state.state, state.shots, !state.no_circuit).await
        }
        Commands::Error { state, error } => {
            error::execute(state.state, error.selection(), state.shots, !state.no_circuit).await
        }
        Commands::Correct { state, error, mode } => {
            correct::execute(
                state.state,
                error.selection(),
                mode,
                state.shots,
                !state.no_circuit,
            )
            .await
        }
        Commands::Pipeline {
            state,
            error,
            mode,
            decode,
            quiet,
            format,
        } => {
            pipeline::execute(pipeline::PipelineOptions {
                state: state.state,
                error: error.selection(),
                mode,
                decode,
                shots: state.shots,
                quiet: quiet || state.no_circuit,
                format,
            })
            .await
        }
        Commands::Statevector { state, qubit } => {
            statevector::execute(state, usize::from(qubit)).await
        }
        Commands::Majority { bits, format } => majority::execute(&bits, format),
        Commands::Batch {
            trials,
            shots,
            format,
        } => batch::execute(trials, shots, format).await,
        Commands::Compare {
            state,
            qubit,
            shots,
        } => compare::execute(state, usize::from(qubit), shots).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("bitflip").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pipeline_defaults() {
        let cli = parse(&["pipeline"]).unwrap();
        match cli.command {
            Commands::Pipeline {
                state,
                error,
                mode,
                decode,
                quiet,
                format,
            } => {
                assert_eq!(state.state, InitialState::Zero);
                assert_eq!(error.selection(), ErrorSelection::Fixed(1));
                assert_eq!(mode, CorrectionMode::Mirror);
                assert!(!decode);
                assert!(!quiet);
                assert_eq!(format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_minus_state_is_accepted() {
        let cli = parse(&["encode", "--state", "-"]).unwrap();
        match cli.command {
            Commands::Encode { state } => assert_eq!(state.state, InitialState::Minus),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_qubit_out_of_range_rejected() {
        assert!(parse(&["error", "--qubit", "3"]).is_err());
        assert!(parse(&["error", "--qubit", "2"]).is_ok());
    }

    #[test]
    fn test_random_conflicts_with_qubit() {
        assert!(parse(&["correct", "--random", "--qubit", "0"]).is_err());

        let cli = parse(&["correct", "--random"]).unwrap();
        match cli.command {
            Commands::Correct { error, .. } => {
                assert_eq!(error.selection(), ErrorSelection::Random);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_syndrome_mode_parses() {
        let cli = parse(&["correct", "--mode", "Syndrome"]).unwrap();
        match cli.command {
            Commands::Correct { mode, .. } => assert_eq!(mode, CorrectionMode::Syndrome),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_state_rejected() {
        assert!(parse(&["encode", "--state", "2"]).is_err());
    }

    #[test]
    fn test_majority_requires_bits() {
        assert!(parse(&["majority"]).is_err());
        let cli = parse(&["majority", "010", "111", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Majority { bits, format } => {
                assert_eq!(bits, vec!["010", "111"]);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = parse(&["batch", "-vv", "-n", "5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Batch { trials, shots, .. } => {
                assert_eq!(trials, 5);
                assert_eq!(shots, 500);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
