//! Command implementations

mod init;
mod invalidate;
mod issues;
mod pending;
mod records;
mod review;
mod scan;
#[cfg(feature = "server")]
mod serve;
mod submit;

use std::path::PathBuf;

use anyhow::Context as _;

use civic_ledger::Workspace;
use civic_ledger::core::models::{Triple, User};
use civic_ledger::output::OutputMode;

use super::app::TripleArgs;

pub use init::init;
pub use invalidate::invalidate;
pub use issues::issues;
pub use pending::pending;
pub use records::{history, show};
pub use review::review;
pub use scan::scan;
#[cfg(feature = "server")]
pub use serve::serve;
pub use submit::submit;

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    /// Project directory
    pub root: PathBuf,
    /// Explicit config path
    pub config: Option<PathBuf>,
    /// Acting user
    pub user: User,
    /// Output mode
    pub mode: OutputMode,
}

impl Context {
    /// Open the project workspace
    pub fn open(&self) -> anyhow::Result<Workspace> {
        Workspace::open(&self.root, self.config.as_deref())
    }
}

/// Build a triple, defaulting the year to the configured current year
fn resolve_triple(ws: &Workspace, args: &TripleArgs) -> anyhow::Result<Triple> {
    let year = match &args.year {
        Some(year) => year.clone(),
        None => ws
            .config()
            .current_year
            .clone()
            .context("No --year given and no current_year configured")?,
    };
    Ok(Triple::new(&args.council, &args.field, year))
}
