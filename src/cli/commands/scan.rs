//! Scan command - stream issues as they are found

use civic_ledger::core::services::ScanScope;
use civic_ledger::output::{self, OutputMode};

use super::Context;

/// Run a raw scan, stopping early once `limit` issues have been seen
///
/// Unlike `issues`, invalidated issues are included. Human output is printed
/// as the scan advances; dropping the iterator at the limit ends the scan.
pub fn scan(ctx: &Context, scope: ScanScope, limit: Option<usize>) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    let scan = ws.engine().scan(&scope).take(limit.unwrap_or(usize::MAX));

    match ctx.mode {
        OutputMode::Human => {
            let mut found = 0;
            for issue in scan {
                output::print_issue_line(&issue?);
                found += 1;
            }
            println!("\n{found} issue(s)");
        },
        OutputMode::Json => {
            let issues = scan.collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&issues)?);
        },
    }
    Ok(())
}
