use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{usage, Cli};
use crate::evaluate::{ensure_model_loaded, evaluate_file, EvalSummary};
use crate::openai::real::RealOpenAIClient;
use crate::EvalConfig;

pub async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries prompts and model output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(cli) = Cli::from_args(std::env::args_os()) else {
        println!("{}", usage());
        return Ok(ExitCode::FAILURE);
    };

    run_app(cli, EvalConfig::default()).await?;
    Ok(ExitCode::SUCCESS)
}

pub async fn run_app(cli: Cli, config: EvalConfig) -> Result<EvalSummary> {
    info!("Connecting to model server at {}", config.api_base);
    let client = RealOpenAIClient::for_local_server(&config.api_base);
    ensure_model_loaded(&client, &config.model).await?;

    let progress = progress_bar()?;
    let summary =
        evaluate_file(&client, &config, &cli.input, &cli.output, &progress)
            .await?;

    println!(
        "Done: {} answered, {} fallbacks, {} skipped. Results saved to {}",
        summary.evaluated - summary.fallbacks,
        summary.fallbacks,
        summary.skipped,
        cli.output.display()
    );
    Ok(summary)
}

fn progress_bar() -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map_err(|e| anyhow::anyhow!("Invalid progress template: {}", e))?
        .progress_chars("=>-");
    Ok(ProgressBar::new(0).with_style(style))
}
