use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing is configured from the loaded file, so the runtime sets it up.
    // The CLI parses user commands and then calls into the appropriate logic
    pipeline_input::cli::cli::run().await
}
