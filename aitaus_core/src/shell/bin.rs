// Binary entry point for aitaus_mcp
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    aitaus_core::shell::run().await
}
