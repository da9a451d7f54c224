//! Initialize civic-ledger in a directory

use std::fs;

use civic_ledger::config::DEFAULT_CONFIG;
use civic_ledger::output::{OperationResult, OutputMode};
use civic_ledger::paths;

use super::Context;

/// Write a starter config and create the state directory
pub fn init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let config_path = ctx.config.clone().unwrap_or_else(|| paths::config_file(&ctx.root));

    if config_path.exists() && !force {
        OperationResult {
            success: false,
            message: format!(
                "Already initialized ({} exists). Use --force to reinitialize.",
                config_path.display()
            ),
        }
        .render(ctx.mode);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::create_dir_all(paths::data_dir(&ctx.root))?;
    log::debug!("wrote {}", config_path.display());

    if ctx.mode == OutputMode::Human {
        println!("Initializing civic-ledger...\n");
        println!("  Created {}", config_path.display());
        println!("  Created {}/", paths::DATA_DIR);
        println!("\nNext steps:");
        println!("  Edit {} to list your councils, fields and years", paths::CONFIG_FILE);
        println!("  civic-ledger submit <council> <field> <value>");
        println!("  civic-ledger issues");
    } else {
        OperationResult {
            success: true,
            message: format!("Created {}", config_path.display()),
        }
        .render(ctx.mode);
    }
    Ok(())
}
