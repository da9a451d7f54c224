//! Submit command - propose a value for a record

use civic_ledger::core::models::{FieldKind, FieldValue};
use civic_ledger::output::SubmitReport;

use super::{Context, resolve_triple};
use crate::cli::app::TripleArgs;

/// Propose `raw` for the record, applying or queueing it
pub fn submit(
    ctx: &Context,
    args: &TripleArgs,
    raw: &str,
    source: Option<String>,
) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let triple = resolve_triple(&ws, args)?;

    // Unknown fields are reported by the engine; parse as a number meanwhile.
    let kind = ws
        .engine()
        .catalog()
        .field(&triple.field)
        .map_or(FieldKind::Number, |f| f.kind);
    let value = FieldValue::parse_as(raw, kind).map_err(anyhow::Error::msg)?;

    let outcome = ws.engine().submit(&triple, value, source, &ctx.user)?;
    ws.save()?;

    SubmitReport { triple, outcome }.render(ctx.mode);
    Ok(())
}
