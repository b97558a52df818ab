//! ollamapipe - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use futures_util::StreamExt;
use ollamapipe::cli::{Args, Commands, GenerateArgs, Verbosity};
use ollamapipe::streaming::Aggregator;
use ollamapipe::{ClientError, GenerationResult, OllamaClient};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.client_config()?;

    if let Commands::Config = args.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let client = OllamaClient::with_config(config)?;

    let outcome = match &args.command {
        Commands::Models => list_models(&client).await,
        Commands::Health => health(&client).await,
        Commands::Generate(generate) => run_generate(&client, generate, verbosity).await,
        Commands::Config => Ok(()),
    };
    client.close();

    if let Err(e) = outcome {
        report_error(&e);
        std::process::exit(1);
    }
    Ok(())
}

async fn list_models(client: &OllamaClient) -> ollamapipe::Result<()> {
    let listing = client.list_models().await?;
    println!("{}", listing.summary());
    Ok(())
}

async fn health(client: &OllamaClient) -> ollamapipe::Result<()> {
    let url = client.config().normalized_base_url().to_string();
    if client.health_check().await {
        println!("{} Ollama is reachable at {}", "✓".green(), url);
        Ok(())
    } else {
        Err(ClientError::connection(format!("Ollama is not reachable at {}", url)))
    }
}

async fn run_generate(
    client: &OllamaClient,
    generate: &GenerateArgs,
    verbosity: Verbosity,
) -> ollamapipe::Result<()> {
    let parameters = generate.parameters()?;
    let model = generate.model.as_deref().unwrap_or("");

    let result = if generate.no_stream {
        let result = client
            .generate_complete(model, &generate.prompt, Some(&parameters))
            .await?;
        println!("{}", result.text);
        result
    } else {
        let mut stream = client
            .generate_stream(model, &generate.prompt, Some(&parameters))
            .await?;
        let mut aggregator = Aggregator::new();
        let mut stdout = std::io::stdout();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            print!("{}", chunk.fragment());
            let _ = stdout.flush();
            aggregator.push(chunk);
        }
        println!();
        aggregator.finish()?
    };

    if verbosity.show_stats() {
        print_stats(&result);
    }
    Ok(())
}

fn print_stats(result: &GenerationResult) {
    let mut parts = vec![format!("model: {}", result.model)];

    if let Some(count) = result.timings.eval_count {
        parts.push(format!("tokens: {}", count));
    }
    if let Some(rate) = result.tokens_per_second() {
        parts.push(format!("{:.2} tok/s", rate));
    }
    if let Some(total) = result.timings.total_duration {
        parts.push(format!("total: {:.2}s", total as f64 / ollamapipe::metrics::NANOS_PER_SECOND));
    }

    eprintln!("{}", parts.join(" | ").dimmed());
}

fn report_error(err: &ClientError) {
    let kind = match err {
        ClientError::Timeout { .. } => "timeout",
        ClientError::ConnectionFailed { .. } => "connection",
        ClientError::RequestFailed { .. } => "request",
        ClientError::InvalidResponse { .. } => "response",
        ClientError::Validation { .. } => "parameters",
        ClientError::Config(_) => "config",
    };
    eprintln!("{} [{}] {}", "Error:".red().bold(), kind, err);

    if let Some(status) = err.status_code() {
        eprintln!("  Status code: {}", status);
    }
    if matches!(err, ClientError::ConnectionFailed { .. }) {
        eprintln!("  Start the server with: {}", "ollama serve".cyan());
    }
}
