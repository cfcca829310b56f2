/// API сервер и обучение моделей

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use health_ml::{api, AppConfig, DatasetKind};

#[derive(Parser)]
#[command(name = "health-ml", version, about = "Heart disease and diabetes risk models")]
struct Cli {
    /// Путь к TOML-конфигу
    #[arg(long, global = true, env = "HEALTH_ML_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Запустить HTTP сервер (по умолчанию)
    Serve,
    /// Обучить модели и сохранить артефакты
    Train {
        #[arg(long, value_enum, default_value_t = ModelChoice::All)]
        model: ModelChoice,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelChoice {
    HeartDisease,
    Diabetes,
    All,
}

impl ModelChoice {
    fn kinds(self) -> Vec<DatasetKind> {
        match self {
            ModelChoice::HeartDisease => vec![DatasetKind::HeartDisease],
            ModelChoice::Diabetes => vec![DatasetKind::Diabetes],
            ModelChoice::All => DatasetKind::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let state = api::AppState::from_config(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, state).await,
        Command::Train { model } => {
            for summary in train(&state, model.kinds()).await? {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
    }
}

async fn train(
    state: &api::AppState,
    kinds: Vec<DatasetKind>,
) -> anyhow::Result<Vec<health_ml::TrainingSummary>> {
    let mut summaries = Vec::new();
    for kind in kinds {
        let pipeline = state.pipeline(kind);
        let summary = tokio::task::spawn_blocking(move || pipeline.train())
            .await?
            .with_context(|| format!("Training {kind} model failed"))?;
        summaries.push(summary);
    }
    Ok(summaries)
}

async fn serve(config: &AppConfig, state: api::AppState) -> anyhow::Result<()> {
    if config.server.train_on_startup {
        train(&state, DatasetKind::ALL.to_vec()).await?;
    }

    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
