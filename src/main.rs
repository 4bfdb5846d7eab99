use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use photex_cohort::certificate::TextCertificateIssuer;
use photex_cohort::clock::CohortClock;
use photex_cohort::commands::{Academy, Caller, Command};
use photex_cohort::config::Config;
use photex_cohort::curriculum;
use photex_cohort::db::{self, PgStore};
use photex_cohort::notify::LogNotifier;
use photex_cohort::store::{MemoryStore, Store};

#[derive(Parser)]
#[command(name = "photex-cohort")]
#[command(about = "Cohort administration for the Photex Media Academy", long_about = None)]
struct Cli {
    /// Run against an empty in-memory store instead of Postgres
    #[arg(long, global = true)]
    memory: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the lesson catalog and the initial cohort day
    Seed,
    /// Run one bot command on behalf of a chat id
    Exec {
        /// Chat id of the caller; the role is resolved from ADMIN_IDS and TRAINER_IDS
        #[arg(long)]
        caller: i64,
        /// Reference to the file attached to the message, if any
        #[arg(long)]
        attachment: Option<String>,
        /// Print the outcome as a JSON object
        #[arg(long)]
        json: bool,
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photex_cohort=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store: Box<dyn Store> = if cli.memory {
        let store = MemoryStore::new();
        store.seed_lessons(&curriculum::lessons()).await?;
        Box::new(store)
    } else {
        let database_url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set unless running with --memory")?;
        let pool = db::connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        if let Commands::InitDb = cli.command {
            db::init_db(&pool).await?;
            println!("Schema ready.");
            return Ok(());
        }
        Box::new(PgStore::new(pool))
    };

    let clock = CohortClock::default();
    clock.ensure_default(store.as_ref()).await?;

    match cli.command {
        Commands::InitDb => {
            println!("In-memory store needs no schema.");
        }
        Commands::Seed => {
            let seeded = store.seed_lessons(&curriculum::lessons()).await?;
            let day = clock.current(store.as_ref()).await?;
            println!("Seeded {seeded} lessons. Cohort day is {day}.");
        }
        Commands::Exec {
            caller,
            attachment,
            json,
            name,
            args,
        } => {
            let notifier = LogNotifier::new(config.group_id);
            let certificates = TextCertificateIssuer::new(config.certificate_dir.clone());
            let academy = Academy {
                store: store.as_ref(),
                notifier: &notifier,
                certificates: &certificates,
                clock,
                dm_advanced_to_approved: config.dm_advanced_to_approved,
            };
            let caller = Caller {
                chat_id: caller,
                role: config.roles.role_of(caller),
            };

            let outcome = match Command::parse(&name, &args) {
                Ok(command) => {
                    academy
                        .handle(caller, command, attachment.as_deref(), Utc::now())
                        .await
                }
                Err(err) => Err(err),
            };

            match (outcome, json) {
                (Ok(reply), false) => println!("{reply}"),
                (Ok(reply), true) => {
                    println!("{}", serde_json::json!({ "ok": true, "reply": reply }));
                }
                (Err(err), false) => {
                    tracing::debug!(error = ?err, "command failed");
                    println!("⛔ {err}");
                }
                (Err(err), true) => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "ok": false,
                            "kind": err.kind(),
                            "error": err.to_string(),
                        })
                    );
                }
            }
        }
    }

    Ok(())
}
