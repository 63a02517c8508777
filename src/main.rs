use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use secret_santa::application::service::{AssignmentRecord, NewParticipant, SantaService};
use secret_santa::config::EngineConfig;
use secret_santa::domain::game::GameId;
use secret_santa::domain::participant::ParticipantId;
use secret_santa::domain::ports::GameStoreBox;
use secret_santa::infrastructure::ids::UuidGenerator;
use secret_santa::infrastructure::in_memory::InMemoryGameStore;
use secret_santa::infrastructure::notifier::LogNotifier;
#[cfg(feature = "storage-rocksdb")]
use secret_santa::infrastructure::rocksdb::RocksDbGameStore;
use secret_santa::interfaces::csv::assignment_writer::AssignmentWriter;
use secret_santa::interfaces::csv::participant_reader::ParticipantReader;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Seed for the random source, for reproducible draws.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Shuffles tried by a partial mass reassignment before regenerating everything.
    #[arg(long, global = true, default_value_t = EngineConfig::DEFAULT_REASSIGN_ATTEMPTS)]
    reassign_attempts: usize,

    /// Retries after a concurrent update of the same game.
    #[arg(long, global = true, default_value_t = EngineConfig::DEFAULT_CONFLICT_RETRIES)]
    conflict_retries: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a game from a `name,email` CSV file and print its assignments.
    Draw {
        input: PathBuf,
        #[arg(long, default_value = "Secret Santa")]
        name: String,
        #[arg(long)]
        allow_reassignment: bool,
    },
    /// Print the assignments of a game (organizer).
    Export {
        game: String,
        #[arg(long)]
        token: String,
    },
    /// Add a participant and redraw (organizer).
    Add {
        game: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove a participant and redraw (organizer).
    Remove {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
    /// Reassign everyone who has not confirmed (organizer).
    ReassignAll {
        game: String,
        #[arg(long)]
        token: String,
    },
    /// List pending reassignment requests (organizer).
    Requests {
        game: String,
        #[arg(long)]
        token: String,
    },
    /// Grant a pending reassignment request (organizer).
    Approve {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
    /// Show who a participant gives to.
    Show {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
    /// Confirm a participant's assignment.
    Confirm {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
    /// Set or clear a participant's wish.
    Wish {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
        wish: Option<String>,
    },
    /// Ask for a different receiver.
    Request {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
    /// Withdraw a pending reassignment request.
    Cancel {
        game: String,
        participant: String,
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = open_store(cli.db_path)?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let config = EngineConfig {
        reassign_attempts: cli.reassign_attempts,
        conflict_retries: cli.conflict_retries,
    };
    let service = SantaService::new(store, Box::new(LogNotifier), Box::new(UuidGenerator))
        .with_rng(rng)
        .with_config(config);

    match cli.command {
        Command::Draw {
            input,
            name,
            allow_reassignment,
        } => {
            let file = File::open(input).into_diagnostic()?;
            let participants = ParticipantReader::new(file)
                .participants()
                .collect::<secret_santa::error::Result<Vec<NewParticipant>>>()
                .into_diagnostic()?;

            let game = service
                .create_game(&name, participants, allow_reassignment)
                .await
                .into_diagnostic()?;
            eprintln!("Game: {}", game.id);
            eprintln!("Organizer token: {}", game.organizer_token);

            let records = service
                .export_assignments(&game.id, &game.organizer_token)
                .await
                .into_diagnostic()?;
            write_records(records)?;
        }
        Command::Export { game, token } => {
            let records = service
                .export_assignments(&GameId::new(game), &token)
                .await
                .into_diagnostic()?;
            write_records(records)?;
        }
        Command::Add {
            game,
            token,
            name,
            email,
        } => {
            let game = GameId::new(game);
            service
                .add_participant(&game, &token, NewParticipant::new(name, email.as_deref()))
                .await
                .into_diagnostic()?;
            write_records(service.export_assignments(&game, &token).await.into_diagnostic()?)?;
        }
        Command::Remove {
            game,
            participant,
            token,
        } => {
            let game = GameId::new(game);
            service
                .remove_participant(&game, &token, &ParticipantId::new(participant))
                .await
                .into_diagnostic()?;
            write_records(service.export_assignments(&game, &token).await.into_diagnostic()?)?;
        }
        Command::ReassignAll { game, token } => {
            let game = GameId::new(game);
            service.reassign_all(&game, &token).await.into_diagnostic()?;
            write_records(service.export_assignments(&game, &token).await.into_diagnostic()?)?;
        }
        Command::Requests { game, token } => {
            let requests = service
                .pending_requests(&GameId::new(game), &token)
                .await
                .into_diagnostic()?;
            for request in requests {
                println!(
                    "{},{},{}",
                    request.participant_id,
                    request.participant_name,
                    request.requested_at.to_rfc3339()
                );
            }
        }
        Command::Approve {
            game,
            participant,
            token,
        } => {
            let game = GameId::new(game);
            service
                .approve_reassignment(&game, &token, &ParticipantId::new(participant))
                .await
                .into_diagnostic()?;
            write_records(service.export_assignments(&game, &token).await.into_diagnostic()?)?;
        }
        Command::Show {
            game,
            participant,
            token,
        } => {
            let view = service
                .view_assignment(&GameId::new(game), &ParticipantId::new(participant), &token)
                .await
                .into_diagnostic()?;
            println!("Receiver: {}", view.receiver_name);
            if let Some(wish) = view.receiver_wish {
                println!("Wish: {}", wish);
            }
        }
        Command::Confirm {
            game,
            participant,
            token,
        } => {
            service
                .confirm_assignment(&GameId::new(game), &ParticipantId::new(participant), &token)
                .await
                .into_diagnostic()?;
            println!("Assignment confirmed");
        }
        Command::Wish {
            game,
            participant,
            token,
            wish,
        } => {
            service
                .set_wish(
                    &GameId::new(game),
                    &ParticipantId::new(participant),
                    &token,
                    wish.as_deref(),
                )
                .await
                .into_diagnostic()?;
            println!("Wish saved");
        }
        Command::Request {
            game,
            participant,
            token,
        } => {
            service
                .request_reassignment(&GameId::new(game), &ParticipantId::new(participant), &token)
                .await
                .into_diagnostic()?;
            println!("Reassignment requested");
        }
        Command::Cancel {
            game,
            participant,
            token,
        } => {
            service
                .cancel_reassignment_request(
                    &GameId::new(game),
                    &ParticipantId::new(participant),
                    &token,
                )
                .await
                .into_diagnostic()?;
            println!("Reassignment request cancelled");
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn open_store(db_path: Option<PathBuf>) -> Result<GameStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDbGameStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryGameStore::new()))
        }
        None => Ok(Box::new(InMemoryGameStore::new())),
    }
}

fn write_records(records: Vec<AssignmentRecord>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = AssignmentWriter::new(stdout.lock());
    writer.write_assignments(records).into_diagnostic()
}
