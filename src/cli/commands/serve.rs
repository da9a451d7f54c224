//! Serve command - run the HTTP API

use super::Context;
use crate::server;

/// Serve the API until interrupted
pub fn serve(ctx: &Context, port: u16, workers: usize) -> anyhow::Result<()> {
    let ws = ctx.open()?;
    println!("Serving civic-ledger API on http://localhost:{port}/api");
    println!("Config: {}", ws.config_path().display());
    println!("\nPress Ctrl+C to stop");
    server::tiny_http::run(ws, port, workers)
}
