mod app;
mod events;
mod line;
mod logging;
mod markdown;
mod startup;
mod strings;
mod terminal;
mod theme;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use olla_providers::{OllamaClient, OllamaConfig};
use terminal::TerminalGuard;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "olla", version, about = "Chat with a local Ollama server from the terminal")]
struct Cli {
    /// Ollama server address (overrides OLLAMA_BASE_URL and the config file)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Model to select when it is installed
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Send one prompt, stream the reply to stdout and exit
    #[arg(long, value_name = "TEXT", conflicts_with = "list_models")]
    prompt: Option<String>,

    /// Print installed models, one per line, and exit
    #[arg(long)]
    list_models: bool,

    /// Debug-level logging unless OLLA_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let full_screen = cli.prompt.is_none() && !cli.list_models;
    let sink = if full_screen {
        logging::Sink::File
    } else {
        logging::Sink::Stderr
    };
    let _guard = logging::init(cli.verbose, sink);

    let cfg = OllamaConfig::from_env_and_file()?
        .with_overrides(cli.base_url, cli.model)
        .context("applying command-line options")?;
    info!(target: "tui", "base_url={} preferred_model={:?}", cfg.base_url, cfg.model);
    let preferred = cfg.model.clone();
    let client = OllamaClient::new(cfg).context("building HTTP client")?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let startup = match rt.block_on(startup::run(&client, preferred.as_deref())) {
        Ok(s) => s,
        Err(diags) => {
            for d in diags {
                eprintln!("{}", d);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.list_models {
        let mut sink = line::LineSink::new(std::io::stdout(), std::io::stderr());
        return Ok(if line::list_models(&startup, &mut sink) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if let Some(prompt) = cli.prompt {
        let mut sink = line::LineSink::new(std::io::stdout(), std::io::stderr());
        let produced = rt.block_on(line::run(&client, startup, &prompt, &mut sink));
        return Ok(if produced {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let mut app = app::App::new(client, rt.handle().clone(), startup);
    let mut term = TerminalGuard::new()?;
    events::run(&mut term.terminal, &mut app)?;
    Ok(ExitCode::SUCCESS)
}
