//! Command-line argument parsing for the ollamapipe demo binary
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::types::GenerationParameters;
use crate::validation::validate_parameters;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// ollamapipe - talk to a local Ollama server
#[derive(Parser, Debug)]
#[command(name = "ollamapipe")]
#[command(version)]
#[command(about = "Stream or aggregate text generation from a local Ollama server", long_about = None)]
pub struct Args {
    /// Ollama base URL (overrides configuration)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (warnings), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed models
    Models,

    /// Check whether the server is reachable
    Health,

    /// Generate text from a prompt
    Generate(GenerateArgs),

    /// Display effective configuration
    Config,
}

/// Arguments of `generate`
#[derive(ClapArgs, Debug, Default)]
pub struct GenerateArgs {
    /// Prompt text
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    /// Model to use (falls back to default_model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Wait for the complete answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Sampling temperature (0-2)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Nucleus sampling threshold (0-1)
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Top-k sampling (>= 1)
    #[arg(long)]
    pub top_k: Option<i64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<i64>,

    /// Extra parameter as KEY=VALUE; VALUE is read as JSON when it parses
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Configuration file (or defaults) with command-line overrides applied
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

impl GenerateArgs {
    /// Collect flags into validated generation parameters
    pub fn parameters(&self) -> Result<GenerationParameters> {
        let mut raw = Map::new();

        for param in &self.params {
            let (key, value) = param.split_once('=').ok_or_else(|| {
                ClientError::validation(param.as_str(), "expected KEY=VALUE")
            })?;
            let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
            raw.insert(key.trim().to_string(), value);
        }

        if let Some(temperature) = self.temperature {
            raw.insert("temperature".to_string(), Value::from(temperature));
        }
        if let Some(top_p) = self.top_p {
            raw.insert("top_p".to_string(), Value::from(top_p));
        }
        if let Some(top_k) = self.top_k {
            raw.insert("top_k".to_string(), Value::from(top_k));
        }
        if let Some(max_tokens) = self.max_tokens {
            raw.insert("num_predict".to_string(), Value::from(max_tokens));
        }

        validate_parameters(&raw)
    }
}

impl Verbosity {
    /// Default tracing filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "ollamapipe=debug",
            Verbosity::VeryVerbose => "ollamapipe=trace",
        }
    }

    /// Check if should show generation statistics
    pub fn show_stats(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamValue;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["ollamapipe", "-q", "health"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["ollamapipe", "health"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["ollamapipe", "-v", "health"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["ollamapipe", "health", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_generate_args() {
        let args = parse(&[
            "ollamapipe", "generate", "Hello", "-m", "llama2", "--no-stream",
            "--temperature", "0.7", "--top-k", "40", "--param", "seed=42", "--param", "system=be brief",
        ]);

        let generate = match args.command {
            Commands::Generate(generate) => generate,
            other => panic!("unexpected command: {:?}", other),
        };
        assert_eq!(generate.prompt, "Hello");
        assert_eq!(generate.model.as_deref(), Some("llama2"));
        assert!(generate.no_stream);

        let params = generate.parameters().unwrap();
        assert_eq!(params.temperature(), Some(0.7));
        assert_eq!(params.top_k(), Some(40));
        assert_eq!(params.get("seed"), Some(&ParamValue::Int(42)));
        assert_eq!(params.get("system"), Some(&ParamValue::Str("be brief".into())));
    }

    #[test]
    fn test_generate_args_rejects_out_of_range() {
        let generate = GenerateArgs {
            prompt: "x".to_string(),
            top_p: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(generate.parameters(), Err(ClientError::Validation { .. })));
    }

    #[test]
    fn test_generate_args_rejects_malformed_param() {
        let generate = GenerateArgs {
            prompt: "x".to_string(),
            params: vec!["seed".to_string()],
            ..Default::default()
        };
        assert!(generate.parameters().is_err());
    }

    #[test]
    fn test_url_override() {
        let path = std::env::temp_dir().join(format!("ollamapipe-args-{}.toml", std::process::id()));
        ClientConfig::new()
            .with_base_url("http://from-file:11434")
            .with_retry_attempts(1)
            .save(&path)
            .unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let args = parse(&["ollamapipe", "--url", "http://gpu-box:11434", "-c", &path_arg, "models"]);
        let config = args.client_config().unwrap();

        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.retry_attempts, 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(Verbosity::Quiet.log_filter(), "error");
        assert_eq!(Verbosity::Normal.log_filter(), "warn");
        assert!(!Verbosity::Quiet.show_stats());
        assert!(Verbosity::Normal.show_stats());
    }
}
