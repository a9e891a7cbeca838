use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use codeloom::{ApiClient, Config, GeneratorConfig, Materializer, OutputHandler, Session};

#[derive(Parser)]
#[command(name = "codeloom")]
#[command(about = "Generate multi-file projects with a language model, one round at a time", long_about = None)]
struct Cli {
    /// Directory to write generated files into
    #[arg(long)]
    output_dir: Option<String>,

    /// Model identifier to request
    #[arg(long)]
    model: Option<String>,

    /// Provider name (anthropic, openai, or custom)
    #[arg(long)]
    provider: Option<String>,

    /// API base URL, overriding the provider default
    #[arg(long)]
    api_url: Option<String>,

    /// API key (falls back to the provider's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum output tokens per request
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Initial prompt describing the project
    #[arg(long)]
    prompt: Option<String>,

    /// File containing the initial prompt
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Show directory creation and extra diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut out = OutputHandler::new().with_verbose(cli.verbose);
    out.print_banner()?;

    let mut config = Config::load_or_default()?;
    if let Some(provider) = &cli.provider {
        if cli.api_url.is_none() {
            if let Some(endpoint) = GeneratorConfig::default_endpoint(provider) {
                config.generator.api_url = endpoint.to_string();
            }
        }
        config.generator.provider = provider.clone();
    }
    if let Some(api_url) = cli.api_url {
        config.generator.api_url = api_url;
    }
    if let Some(model) = cli.model {
        config.generator.model = model;
    }
    if let Some(api_key) = cli.api_key {
        config.generator.api_key = api_key;
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.generator.max_tokens = max_tokens;
    }
    if let Some(temperature) = cli.temperature {
        config.generator.temperature = temperature;
    }
    if let Some(output_dir) = cli.output_dir {
        config.generator.output_dir = output_dir;
    }

    let Some(api_key) = config.generator.resolve_api_key() else {
        out.print_error(&format!(
            "An API key is required. Pass --api-key or set {}.",
            config.generator.credential_env()
        ))?;
        std::process::exit(1);
    };

    let initial_prompt = match (&cli.prompt, &cli.prompt_file) {
        (Some(prompt), _) => prompt.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("could not read prompt file {}", path.display()))?,
        (None, None) => read_multiline_prompt()?,
    };
    if initial_prompt.trim().is_empty() {
        out.print_error("The initial prompt must not be empty.")?;
        std::process::exit(1);
    }

    let generator = &config.generator;
    let client = ApiClient::new(
        &generator.provider,
        &generator.api_url,
        &api_key,
        &generator.model,
        generator.temperature,
        generator.max_tokens,
    );
    let materializer = Materializer::new(&generator.output_dir);
    materializer
        .ensure_output_dir()
        .with_context(|| format!("could not create output directory {}", generator.output_dir))?;
    out.print_system(&format!(
        "Writing generated files to {} using {}",
        generator.output_dir, generator.model
    ))?;

    let mut session = Session::new(client, materializer);
    let mut prompt = initial_prompt;

    loop {
        out.print_round_header(session.rounds_completed() + 1)?;
        let spinner = spinner(format!("Waiting for {}...", session.model()));
        let result = session.run_round(&prompt).await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                out.print_report(&outcome.report)?;
                out.print_usage(outcome.usage.as_ref())?;
            }
            Err(err) => {
                out.print_error(&err.to_string())?;
                let answer = prompt_line("Retry this round? (yes/no):")?;
                if matches!(answer.to_lowercase().as_str(), "yes" | "y") {
                    continue;
                }
                break;
            }
        }

        let proposed = session.next_prompt();
        out.print_prompt_preview(&proposed)?;
        let answer = prompt_line("Continue with this prompt? (yes/edit/no):")?;
        match answer.to_lowercase().as_str() {
            "no" | "n" | "quit" | "q" => break,
            "edit" | "e" | "modify" | "m" => {
                prompt = prompt_line("Enter custom prompt:")?;
            }
            _ => prompt = proposed,
        }
    }

    out.print_summary(session.registry().len(), session.rounds_completed())?;
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner());
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn prompt_line(question: &str) -> io::Result<String> {
    print!("{question} ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_multiline_prompt() -> io::Result<String> {
    println!("Enter the initial prompt describing the project.");
    println!("(Type END on its own line when finished)");
    let mut buffer = String::new();
    loop {
        let mut line = String::new();
        let read = io::stdin().read_line(&mut line)?;
        if read == 0 || line.trim() == "END" {
            break;
        }
        buffer.push_str(&line);
    }
    Ok(buffer)
}
