//! Show and history commands

use civic_ledger::output::{HistoryReport, RecordReport};

use super::{Context, resolve_triple};
use crate::cli::app::TripleArgs;

/// Print the current value of a record
pub fn show(ctx: &Context, args: &TripleArgs) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let triple = resolve_triple(&ws, args)?;
    let record = ws.engine().get_record(&triple)?;
    RecordReport { triple, record }.render(ctx.mode);
    Ok(())
}

/// Print the audit trail of a record
pub fn history(ctx: &Context, args: &TripleArgs) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let triple = resolve_triple(&ws, args)?;
    let entries = ws.engine().get_history(&triple)?.collect();
    HistoryReport { triple, entries }.render(ctx.mode);
    Ok(())
}
