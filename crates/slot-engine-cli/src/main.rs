//! `slotfind` CLI: generate, offer, and draft meeting slots from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Generate candidates from constraints JSON (stdin → stdout)
//! echo '{"durationMinutes":30,"startDate":"2026-03-21","timeOfDay":"morning"}' | slotfind generate
//!
//! # Pin the clock and batch size for reproducible output
//! slotfind generate -i constraints.json --now 2026-03-16T08:00:00Z --count 5
//!
//! # Prefer real free/busy data, falling back to generated candidates
//! slotfind offer -i constraints.json --busy busy.json \
//!     --organizer alex@example.com --attendee jason@example.com
//!
//! # Turn a chosen slot into an event draft
//! slotfind draft -i slot.json --organizer alex@example.com --attendee jason@example.com
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG` (default `warn`).

use std::collections::HashMap;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use slot_engine::booking::EventDraft;
use slot_engine::freebusy::BusyInterval;
use slot_engine::{
    CalendarSession, Constraints, EngineConfig, FreeBusyAvailability, MeetingDetails,
    Participant, Slot, SlotFinder, SlotPipeline,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slotfind",
    version,
    about = "Find and rank meeting slots for two people"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ranked candidate slots from constraints JSON
    Generate {
        /// Constraints file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Current time as RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
        /// Slots per batch (3-5)
        #[arg(long, conflicts_with = "seed")]
        count: Option<usize>,
        /// Seed for a pseudo-random spread (draws its own batch size)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Offer slots from real free/busy data, falling back to generated ones
    Offer {
        /// Constraints file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Busy calendars: a JSON object of email → [{start, end}]
        #[arg(long)]
        busy: Option<String>,
        /// Organizer email
        #[arg(long)]
        organizer: String,
        /// Attendee email
        #[arg(long)]
        attendee: String,
        /// Current time as RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
    },
    /// Build an event draft for a chosen slot
    Draft {
        /// Slot JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Organizer email
        #[arg(long)]
        organizer: String,
        /// Attendee email
        #[arg(long)]
        attendee: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Generate {
            input,
            now,
            count,
            seed,
        } => {
            if let Some(count) = count {
                config.finder.slot_count = count;
            }
            if seed.is_some() {
                config.finder.seed = seed;
            }
            let finder = SlotFinder::new(config.finder).context("Invalid finder settings")?;
            let constraints = read_constraints(input.as_deref())?;
            let now = parse_now(now.as_deref())?;

            let slots = finder
                .generate(&constraints, now)
                .context("Failed to generate slots")?;
            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
        Commands::Offer {
            input,
            busy,
            organizer,
            attendee,
            now,
        } => {
            let finder = SlotFinder::new(config.finder).context("Invalid finder settings")?;
            let constraints = read_constraints(input.as_deref())?;
            let now = parse_now(now.as_deref())?;

            let mut session = CalendarSession::new(participant(&organizer));
            let mut pipeline = SlotPipeline::new(finder.clone());
            if let Some(path) = busy.as_deref() {
                let calendars = read_busy(path)?;
                debug!(path, calendars = calendars.len(), "loaded busy calendars");
                let mut source = FreeBusyAvailability::new(finder, config.availability)
                    .context("Invalid availability settings")?;
                for (email, intervals) in calendars {
                    source = source.with_calendar(email, intervals);
                }
                pipeline = pipeline.with_real_source(source);
                // Local busy files need no provider credentials.
                session.open("local");
            }

            let offer = pipeline
                .offer(&session, &participant(&attendee), &constraints, now)
                .context("Failed to offer slots")?;
            println!("{}", serde_json::to_string_pretty(&offer)?);
        }
        Commands::Draft {
            input,
            organizer,
            attendee,
            title,
            description,
            location,
        } => {
            let tz = config.finder.tz().context("Invalid finder settings")?;
            let raw = read_input(input.as_deref())?;
            let slot: Slot = serde_json::from_str(&raw).context("Failed to parse slot JSON")?;

            let organizer = participant(&organizer);
            let attendee = participant(&attendee);
            let mut details = MeetingDetails::fallback(&organizer, &attendee);
            if let Some(title) = title {
                details.title = title;
            }
            if let Some(description) = description {
                details.description = description;
            }
            if let Some(location) = location {
                details.location = location;
            }

            let draft = EventDraft::new(&slot, &details, &[organizer, attendee], tz);
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
    }

    Ok(())
}

/// A participant known only by email.
fn participant(email: &str) -> Participant {
    Participant::new(email, email, email, "")
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("Invalid --now timestamp: {}", s)),
        None => Ok(Utc::now()),
    }
}

fn read_constraints(path: Option<&str>) -> Result<Constraints> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse constraints JSON")
}

fn read_busy(path: &str) -> Result<HashMap<String, Vec<BusyInterval>>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse busy calendars: {}", path))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
