use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lingua_relay::config::Config;
use lingua_relay::orchestrator::{TranslationJob, TranslationOrchestrator, DEFAULT_CALLER_ADDRESS};
use lingua_relay::provider::create_provider;
use lingua_relay::record::{JsonlRecordSink, MemoryRecordSink, RecordSink};
use lingua_relay::server;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "lingua-relay")]
#[command(version, about = "Word-parallel translation relay")]
#[command(long_about = "Translate text word by word through a third-party translation API, \
recording every request.")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Append translation records to this file (overrides config)
        #[arg(short, long)]
        records: Option<PathBuf>,
    },

    /// Translate a single text and print the result
    Translate {
        /// Text to translate
        text: String,

        /// Source language code (e.g., en)
        #[arg(short, long)]
        from: String,

        /// Target language code (e.g., ru)
        #[arg(short, long)]
        to: String,

        /// Caller address stored with the record
        #[arg(long, default_value = DEFAULT_CALLER_ADDRESS)]
        caller: String,
    },

    /// List the languages the provider supports
    Languages,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

async fn build_orchestrator(config: &Config) -> Result<Arc<TranslationOrchestrator>> {
    let provider = create_provider(config).context("Failed to create translation provider")?;

    let sink: Arc<dyn RecordSink> = match &config.records_path {
        Some(path) => Arc::new(
            JsonlRecordSink::open(path)
                .await
                .with_context(|| format!("Failed to open record file {}", path.display()))?,
        ),
        None => {
            info!("No record file configured, keeping records in memory");
            Arc::new(MemoryRecordSink::new())
        }
    };

    Ok(Arc::new(TranslationOrchestrator::from_config(
        config,
        Arc::from(provider),
        sink,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Command::Serve { bind, records } = &cli.command {
        if let Some(bind) = bind {
            config.bind = bind.clone();
        }
        if let Some(records) = records {
            config.records_path = Some(records.clone());
        }
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let orchestrator = build_orchestrator(&config).await?;

    match cli.command {
        Command::Serve { .. } => {
            let listener = tokio::net::TcpListener::bind(&config.bind)
                .await
                .with_context(|| format!("Failed to bind {}", config.bind))?;
            server::serve(listener, orchestrator, shutdown_signal()).await?;
        }
        Command::Translate {
            text,
            from,
            to,
            caller,
        } => {
            let job = TranslationJob::new(text, from, to).with_caller(caller);
            let translated = orchestrator.translate(&job).await?;
            println!("{}", translated);
            orchestrator.shutdown();
        }
        Command::Languages => {
            let mut languages: Vec<_> = orchestrator
                .supported_languages()
                .await?
                .into_iter()
                .collect();
            languages.sort_by(|a, b| a.code.cmp(&b.code));
            for language in languages {
                println!("{}\t{}", language.code, language.display_name);
            }
            orchestrator.shutdown();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translate_command() {
        let cli = Cli::try_parse_from([
            "lingua-relay",
            "translate",
            "Hello world",
            "--from",
            "en",
            "--to",
            "ru",
        ])
        .unwrap();

        match cli.command {
            Command::Translate {
                text,
                from,
                to,
                caller,
            } => {
                assert_eq!(text, "Hello world");
                assert_eq!(from, "en");
                assert_eq!(to, "ru");
                assert_eq!(caller, "127.0.0.1");
            }
            _ => panic!("expected translate command"),
        }
    }

    #[test]
    fn test_parse_serve_with_global_verbose() {
        let cli = Cli::try_parse_from(["lingua-relay", "serve", "-v", "--bind", "0.0.0.0:9000"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Serve { bind: Some(ref b), records: None } if b == "0.0.0.0:9000"
        ));
    }
}
