use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ClientEvent, HttpPredictionService, Ignored, PredictionController, SessionState,
    SubmitOutcome,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};

mod config;
mod render;

use config::load_settings;
use render::render_state;

#[derive(Parser, Debug)]
#[command(name = "predictor", about = "Predict the genre of a song from its lyrics")]
struct Cli {
    /// Config file; defaults to ./predictor.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict once from --lyrics, --file, or stdin.
    Predict {
        #[arg(long, conflicts_with = "file")]
        lyrics: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Type lyrics line by line; an empty line predicts, `:reset` clears,
    /// `:quit` exits.
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter()?)
        .with_writer(std::io::stderr)
        .init();

    let server_url = settings.server_url()?;
    let service = HttpPredictionService::new(&server_url, settings.request_timeout())?;
    info!(endpoint = %service.endpoint(), "using prediction service");
    let controller = PredictionController::new(Arc::new(service));

    match cli.command {
        Command::Predict { lyrics, file } => predict_once(&controller, lyrics, file).await,
        Command::Interactive => interactive(&controller).await,
    }
}

async fn read_lyrics(lyrics: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(lyrics) = lyrics {
        return Ok(lyrics);
    }
    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read lyrics from '{}'", path.display()));
    }

    let mut lyrics = String::new();
    tokio::io::stdin()
        .read_to_string(&mut lyrics)
        .await
        .context("failed to read lyrics from stdin")?;
    Ok(lyrics)
}

async fn predict_once(
    controller: &Arc<PredictionController>,
    lyrics: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let lyrics = read_lyrics(lyrics, file).await?;

    match controller.submit(lyrics).await {
        SubmitOutcome::Settled(SessionState::Failed { message }) => {
            Err(anyhow!("prediction failed: {message}"))
        }
        SubmitOutcome::Settled(state) => {
            println!("{}", render_state(&state));
            Ok(())
        }
        SubmitOutcome::Ignored(Ignored::BlankLyrics) => {
            bail!("no lyrics given; pass --lyrics, --file, or pipe text on stdin")
        }
        SubmitOutcome::Ignored(Ignored::AlreadySubmitting) => {
            bail!("a prediction is already running")
        }
        SubmitOutcome::Discarded => bail!("prediction was discarded before it completed"),
    }
}

async fn interactive(controller: &Arc<PredictionController>) -> Result<()> {
    let mut events = controller.subscribe_events();
    let notices = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Notification(notice)) => eprintln!("! {}", notice.message()),
                Ok(ClientEvent::StateChanged(state @ SessionState::Submitting)) => {
                    println!("{}", render_state(&state))
                }
                Ok(ClientEvent::StateChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped session events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", render_state(&controller.state().await));
    println!("Empty line predicts, :reset clears, :quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from stdin")?
    {
        match line.trim() {
            ":quit" | ":q" => break,
            ":reset" => {
                controller.reset().await;
                println!("{}", render_state(&controller.state().await));
            }
            "" => match controller.submit_current().await {
                SubmitOutcome::Settled(state) => println!("{}", render_state(&state)),
                SubmitOutcome::Ignored(Ignored::BlankLyrics) => {
                    println!("Type some lyrics first.")
                }
                SubmitOutcome::Ignored(Ignored::AlreadySubmitting) => {
                    println!("Still analyzing the previous lyrics.")
                }
                SubmitOutcome::Discarded => {}
            },
            _ => {
                let mut lyrics = controller.lyrics().await;
                if !lyrics.is_empty() {
                    lyrics.push('\n');
                }
                lyrics.push_str(&line);
                controller.set_lyrics(lyrics).await;
            }
        }
    }

    notices.abort();
    Ok(())
}
