//! # race-ledger
//!
//! Command-line front end for running a heat-race event.
//!
//! ## Usage
//!
//! ```bash
//! # Show the plan generated from a roster
//! race-ledger --roster roster.json plan
//!
//! # Record raw timer counts against race 3 and accept them
//! race-ledger --roster roster.json --ledger race_log.csv record --race 3 --accept 6000 6210 0 6455
//!
//! # Revise race 3 to the attempt written under ledger entry 12
//! race-ledger --roster roster.json revise --race 3 12
//!
//! # Write standings
//! race-ledger --roster roster.json report standings.txt
//! ```
//!
//! Every invocation replays the ledger before doing anything, so the roster
//! document only needs saving when the roster itself changes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use race_ledger::config::{DEFAULT_CLOCK_RATE_HZ, DEFAULT_LANES, EventConfig, LedgerMode};
use race_ledger::event::{Event, EventError};
use race_ledger::persistence::try_load_document;
use race_ledger::report::{format_plan, format_standings, format_status};
use race_ledger::types::LedgerSeq;

/// Lane-rotation scheduling and results ledger for heat races
#[derive(Parser, Debug)]
#[command(name = "race-ledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Roster document (JSON)
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Ledger file, appended to and replayed on start
    #[arg(long, global = true, default_value = "race_log.csv")]
    ledger: PathBuf,

    /// Run without a ledger; results are lost on exit
    #[arg(long, global = true, conflicts_with = "ledger")]
    no_ledger: bool,

    /// Number of lanes on the track
    #[arg(long, global = true, default_value_t = DEFAULT_LANES)]
    lanes: usize,

    /// Timer counts per second
    #[arg(long, global = true, default_value_t = DEFAULT_CLOCK_RATE_HZ)]
    clock_rate: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List every race with its lane occupants and state
    Plan,
    /// Summarize roster and progress
    Status,
    /// Write standings to a file, or print them
    Report {
        /// Destination path; prints to stdout when omitted
        output: Option<PathBuf>,
    },
    /// Record raw timer counts, one per lane, against a race
    Record {
        /// Plan index (1-based); defaults to the current race as the last ledger entry left it
        #[arg(long)]
        race: Option<usize>,
        /// Accept the trial as the official result
        #[arg(long)]
        accept: bool,
        /// Raw counts in lane order; 0 marks a non-finisher
        #[arg(required = true)]
        counts: Vec<i64>,
    },
    /// Accept an earlier attempt of a race by its position
    Accept {
        /// Plan index (1-based)
        #[arg(long)]
        race: usize,
        /// Attempt number within the race (1-based)
        attempt: usize,
    },
    /// Accept the attempt written under a ledger entry
    Revise {
        /// Plan index (1-based)
        #[arg(long)]
        race: usize,
        /// Ledger sequence number
        seq: u64,
    },
    /// Save roster and plan back to the roster document
    Save,
}

impl Cli {
    fn event_config(&self) -> EventConfig {
        let config = EventConfig::new(self.ledger.clone())
            .with_lanes(self.lanes)
            .with_clock_rate(self.clock_rate);
        if self.no_ledger {
            EventConfig {
                ledger: LedgerMode::Disabled,
                ..config
            }
        } else {
            config
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "race_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!(error = %e, "race-ledger failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), EventError> {
    let document = match &cli.roster {
        Some(path) => try_load_document(path)?,
        None => None,
    };
    let mut event = Event::open(cli.event_config(), document)?;

    match cli.command {
        Commands::Plan => print!("{}", format_plan(event.book())),
        Commands::Status => print!("{}", format_status(event.book())),
        Commands::Report { output: Some(path) } => event.write_report(&path)?,
        Commands::Report { output: None } => print!("{}", format_standings(&event.standings())),
        Commands::Record {
            race,
            accept,
            counts,
        } => {
            if let Some(race) = race {
                event.goto(race.saturating_sub(1));
            }
            let times: Vec<f64> = counts
                .iter()
                .map(|c| event.config().count_to_seconds(*c))
                .collect();
            let attempt = event.record_result(&times, &counts, accept)?;
            println!("recorded attempt {}", attempt + 1);
        }
        Commands::Accept { race, attempt } => {
            event.accept_attempt_at(race.saturating_sub(1), attempt.saturating_sub(1))?;
            println!("accepted attempt {attempt} of race {race}");
        }
        Commands::Revise { race, seq } => {
            event.goto(race.saturating_sub(1));
            event.accept_ledger_entry(LedgerSeq(seq))?;
            println!("race {race} now uses ledger entry {seq}");
        }
        Commands::Save => match &cli.roster {
            Some(path) => event.save_document(path)?,
            None => eprintln!("Nothing saved: no --roster path given"),
        },
    }
    Ok(())
}
