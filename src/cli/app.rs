//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{self, Context};
use civic_ledger::core::models::{ContributionStatus, IssueKind, User};
use civic_ledger::core::services::ReviewAction;
use civic_ledger::output::OutputMode;

/// civic-ledger - contribution and moderation for council financial data
#[derive(Parser, Debug)]
#[command(
    name = "civic-ledger",
    version,
    about = "Contribution and moderation engine for council financial data",
    long_about = "Propose corrections to council figures, review them, and find gaps.\n\n\
                  Open fields are applied immediately; moderated and restricted fields\n\
                  are queued for a reviewer. An approval only applies if the record is\n\
                  unchanged since the proposal was made."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to $CIVIC_LEDGER_CONFIG, then ./civic-ledger.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub identity: Identity,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Who is acting
#[derive(Args, Debug)]
pub struct Identity {
    /// User id recorded in the ledger and audit log
    #[arg(long, global = true, default_value = "local")]
    pub user: String,

    /// Permission tier
    #[arg(long, global = true, default_value_t = 1)]
    pub tier: u8,

    /// Act as a superuser
    #[arg(long, global = true)]
    pub superuser: bool,
}

impl Identity {
    fn user(&self) -> User {
        User {
            superuser: self.superuser,
            ..User::new(&self.user, self.tier)
        }
    }
}

/// A record address; the year defaults to the configured current year
#[derive(Args, Debug, Clone)]
pub struct TripleArgs {
    /// Council slug
    pub council: String,

    /// Field slug
    pub field: String,

    /// Financial year (defaults to `current_year`)
    #[arg(short, long)]
    pub year: Option<String>,
}

/// Page selection
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Items per page
    #[arg(long, default_value_t = 50)]
    pub per_page: usize,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create civic-ledger.toml and the .civic-ledger/ state directory
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Propose a value for a record
    Submit {
        #[command(flatten)]
        triple: TripleArgs,

        /// The value (numbers may use thousands separators)
        value: String,

        /// Where the value comes from (e.g. a link to the accounts)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Approve, reject or delete a pending contribution
    Review {
        /// Contribution id
        id: u64,

        /// approve, reject or delete
        action: ReviewAction,
    },

    /// List contributions (pending unless --status is given)
    Pending {
        /// Filter by council
        #[arg(long)]
        council: Option<String>,

        /// Filter by field
        #[arg(long)]
        field: Option<String>,

        /// Filter by year
        #[arg(long)]
        year: Option<String>,

        /// pending, approved, applied, rejected, superseded
        #[arg(long)]
        status: Option<ContributionStatus>,

        /// Filter by submitter
        #[arg(long)]
        submitted_by: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List current issues, hiding invalidated ones
    Issues {
        /// missing or suspicious
        #[arg(long)]
        kind: Option<IssueKind>,

        /// Filter by council
        #[arg(long)]
        council: Option<String>,

        /// Filter by field
        #[arg(long)]
        field: Option<String>,

        /// Filter by year
        #[arg(long)]
        year: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Stream a raw scan, stopping after --limit issues
    Scan {
        /// Restrict to these councils
        #[arg(long)]
        council: Vec<String>,

        /// Restrict to these fields
        #[arg(long)]
        field: Vec<String>,

        /// Restrict to these years
        #[arg(long)]
        year: Vec<String>,

        /// Stop after this many issues
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the current value of a record
    Show {
        #[command(flatten)]
        triple: TripleArgs,
    },

    /// Show the audit trail of a record
    History {
        #[command(flatten)]
        triple: TripleArgs,
    },

    /// Mark a detected issue as not a real problem (superuser only)
    Invalidate {
        #[command(flatten)]
        triple: TripleArgs,

        /// missing or suspicious
        #[arg(short, long)]
        kind: IssueKind,

        /// Why the issue is not real
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Serve the JSON API over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8420)]
        port: u16,

        /// Worker threads handling requests
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },

    /// Show version
    Version,
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let ctx = Context {
        root: PathBuf::from("."),
        config: cli.config.clone(),
        user: cli.identity.user(),
        mode: output_mode,
    };

    match cli.command {
        Some(Command::Init { force }) => commands::init(&ctx, force),
        Some(Command::Submit {
            triple,
            value,
            source,
        }) => commands::submit(&ctx, &triple, &value, source),
        Some(Command::Review { id, action }) => commands::review(&ctx, id, action),
        Some(Command::Pending {
            council,
            field,
            year,
            status,
            submitted_by,
            page,
        }) => commands::pending(
            &ctx,
            civic_ledger::core::ports::LedgerFilter {
                council,
                field,
                year,
                status,
                submitted_by,
            },
            page,
        ),
        Some(Command::Issues {
            kind,
            council,
            field,
            year,
            page,
        }) => commands::issues(
            &ctx,
            civic_ledger::core::services::IssueFilter {
                kind,
                council,
                field,
                year,
            },
            page,
        ),
        Some(Command::Scan {
            council,
            field,
            year,
            limit,
        }) => commands::scan(
            &ctx,
            civic_ledger::core::services::ScanScope {
                councils: council,
                fields: field,
                years: year,
            },
            limit,
        ),
        Some(Command::Show { triple }) => commands::show(&ctx, &triple),
        Some(Command::History { triple }) => commands::history(&ctx, &triple),
        Some(Command::Invalidate { triple, kind, note }) => {
            commands::invalidate(&ctx, &triple, kind, note)
        },
        #[cfg(feature = "server")]
        Some(Command::Serve { port, workers }) => commands::serve(&ctx, port, workers),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": civic_ledger::VERSION
                    })
                );
            } else {
                println!("civic-ledger v{}", civic_ledger::VERSION);
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": civic_ledger::VERSION,
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("civic-ledger v{}", civic_ledger::VERSION);
                println!("\nRun 'civic-ledger --help' for usage");
                println!("Run 'civic-ledger init' to get started");
            }
            Ok(())
        },
    }
}
