use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use contabia_core::{Competence, DocumentKind, Money, TaxRegime};
use contabia_storage::SqliteStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{AppConfig, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "contabia")]
#[command(version)]
#[command(about = "Bookkeeping for small Brazilian companies: bank reconciliation, tax apportionment, reports")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a client company
    AddClient {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// CNPJ or CPF
        #[arg(long)]
        tax_id: String,
        /// MEI, Simples, Presumido or Real
        #[arg(long)]
        regime: TaxRegime,
    },
    /// Post a journal entry read from a JSON file
    Post { file: PathBuf },
    /// Import a bank statement CSV and reconcile it against the ledger
    Import {
        file: PathBuf,
        #[arg(long)]
        client: String,
        #[arg(long)]
        account: Option<String>,
        /// Assign each ledger entry to at most one statement row
        #[arg(long)]
        exclusive: bool,
    },
    /// Compute the month's taxes for a client
    Apportion {
        #[arg(long)]
        client: String,
        /// YYYY-MM
        #[arg(long)]
        competence: Competence,
        /// Store the result as the client's tax period
        #[arg(long)]
        save: bool,
    },
    /// Confirm payment of a tax item
    Pay {
        #[arg(long)]
        period: String,
        #[arg(long)]
        item: String,
    },
    /// Attach a payment guide or receipt to a tax item
    LinkGuide {
        #[arg(long)]
        period: String,
        #[arg(long)]
        item: String,
        #[arg(long)]
        document: String,
    },
    /// Flag late periods and list taxes due soon
    Deadlines {
        /// Defaults to the current date
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        window: Option<i64>,
    },
    /// Income statement or trial balance for a competence
    Report {
        kind: ReportKind,
        #[arg(long)]
        competence: Competence,
        #[arg(long)]
        client: Option<String>,
    },
    /// File a supporting document (invoice, guide, statement)
    AddDocument {
        file: PathBuf,
        #[arg(long)]
        client: String,
        /// nf-entrada, nf-saida, extrato, boleto, guia, contrato or outro
        #[arg(long)]
        kind: DocumentKind,
        #[arg(long)]
        competence: Competence,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "0")]
        value: Money,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Register an accessory obligation due for a competence
    AddObligation {
        #[arg(long)]
        client: String,
        /// DCTFWeb, EFD-Reinf, DEFIS...
        #[arg(long)]
        name: String,
        #[arg(long)]
        competence: Competence,
        #[arg(long)]
        due: NaiveDate,
    },
    /// Mark an obligation as sent
    SubmitObligation { id: String },
    /// Month-close checklist
    CloseCheck {
        #[arg(long)]
        client: String,
        #[arg(long)]
        competence: Competence,
    },
    /// Audit log size and hash chain integrity
    Audit,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    Income,
    Trial,
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating {}", data_dir.display()))?;
    let db_path = config.database_path()?;
    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("opening database {}", db_path.display()))?;
    tracing::debug!(db = %db_path.display(), "database ready");

    match cli.command {
        Command::AddClient { id, name, tax_id, regime } => {
            print(&commands::add_client(&store, &id, &name, &tax_id, regime).await?)
        }
        Command::Post { file } => {
            let raw = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let input = serde_json::from_str(&raw).context("invalid entry JSON")?;
            print(&commands::post(&store, input).await?)
        }
        Command::Import {
            file,
            client,
            account,
            exclusive,
        } => print(&commands::import(&store, &config, &file, &client, account.as_deref(), exclusive).await?),
        Command::Apportion { client, competence, save } => {
            print(&commands::apportion(&store, &client, competence, save).await?)
        }
        Command::Pay { period, item } => print(&commands::pay(&store, &period, &item).await?),
        Command::LinkGuide { period, item, document } => {
            print(&commands::link_guide(&store, &period, &item, &document).await?)
        }
        Command::Deadlines { today, window } => {
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            let window = window.unwrap_or(config.deadlines.window_days);
            print(&commands::deadlines(&store, today, window).await?)
        }
        Command::Report {
            kind: ReportKind::Income,
            competence,
            client,
        } => print(&commands::income(&store, competence, client.as_deref()).await?),
        Command::Report {
            kind: ReportKind::Trial,
            competence,
            client,
        } => print(&commands::trial(&store, competence, client.as_deref()).await?),
        Command::AddDocument {
            file,
            client,
            kind,
            competence,
            date,
            value,
            description,
        } => {
            let input = commands::DocumentInput {
                client_id: &client,
                kind,
                competence,
                date,
                value,
                description: &description,
            };
            print(&commands::add_document(&store, &file, input).await?)
        }
        Command::AddObligation {
            client,
            name,
            competence,
            due,
        } => print(&commands::add_obligation(&store, &client, &name, competence, due).await?),
        Command::SubmitObligation { id } => print(&commands::submit(&store, &id).await?),
        Command::CloseCheck { client, competence } => {
            print(&commands::close_check(&store, &client, competence).await?)
        }
        Command::Audit => print(&commands::audit_status(&store).await?),
    }
}
