use anyhow::Result;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    mcqeval::app::main().await
}
