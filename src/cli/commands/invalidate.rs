//! Invalidate command - dismiss a detected issue

use civic_ledger::core::models::IssueKind;
use civic_ledger::output::InvalidationReport;

use super::{Context, resolve_triple};
use crate::cli::app::TripleArgs;

/// Mark the issue of `kind` on the record as not a real problem
pub fn invalidate(
    ctx: &Context,
    args: &TripleArgs,
    kind: IssueKind,
    note: Option<String>,
) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let triple = resolve_triple(&ws, args)?;
    let entry = ws.engine().invalidate_issue(&triple, kind, note, &ctx.user)?;
    ws.save()?;

    InvalidationReport { entry }.render(ctx.mode);
    Ok(())
}
