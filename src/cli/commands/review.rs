//! Review command - resolve a pending contribution

use civic_ledger::core::models::ContributionId;
use civic_ledger::core::services::ReviewAction;
use civic_ledger::output::ReviewReport;

use super::Context;

/// Approve, reject or delete contribution `id`
pub fn review(ctx: &Context, id: ContributionId, action: ReviewAction) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let outcome = ws.engine().review(id, action, &ctx.user)?;
    ws.save()?;

    ReviewReport { outcome }.render(ctx.mode);
    Ok(())
}
