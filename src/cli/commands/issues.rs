//! Issues command - list current issues

use civic_ledger::core::models::PageRequest;
use civic_ledger::core::services::IssueFilter;
use civic_ledger::output::IssueReport;

use super::Context;
use crate::cli::app::PageArgs;

/// List issues matching `filter`
pub fn issues(ctx: &Context, filter: IssueFilter, page: PageArgs) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let page = ws
        .engine()
        .list_issues(&filter, PageRequest::new(page.page, page.per_page))?;
    IssueReport { page }.render(ctx.mode);
    Ok(())
}
