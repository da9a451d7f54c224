//! Pending command - list ledger entries

use civic_ledger::core::models::PageRequest;
use civic_ledger::core::ports::LedgerFilter;
use civic_ledger::output::PendingReport;

use super::Context;
use crate::cli::app::PageArgs;

/// List contributions matching `filter`
pub fn pending(ctx: &Context, filter: LedgerFilter, page: PageArgs) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let page = ws
        .engine()
        .list_pending(&filter, PageRequest::new(page.page, page.per_page))?;
    PendingReport { page }.render(ctx.mode);
    Ok(())
}
