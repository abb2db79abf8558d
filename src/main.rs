use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use robot_scenario::{
    create_router, AppState, Config, DialogueController, DialogueService, Pipeline, RelayClient,
    ScenarioRobot, SimulatedRobot,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "robot-scenario", about = "Creative-use dialogue harness for a social robot")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/robot-scenario")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dialogue relay (STT → reply → TTS)
    Serve,
    /// Run the scenario against the simulated robot
    Run {
        /// Relay base URL (defaults to services.relay_url)
        #[arg(long, conflicts_with = "in_process")]
        relay: Option<String>,
        /// Call the speech and language services directly instead of a relay
        #[arg(long)]
        in_process: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Run { relay, in_process } => run(cfg, relay, in_process).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let state = AppState::new(Arc::new(Pipeline::from_config(&cfg)));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Dialogue relay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run(cfg: Config, relay: Option<String>, in_process: bool) -> Result<()> {
    let robot = Arc::new(SimulatedRobot::new(
        &cfg.robot.device_dir,
        cfg.robot.sample_rate,
        cfg.robot.microphones,
    )?);

    let dialogue: Arc<dyn DialogueService> = if in_process {
        Arc::new(Pipeline::from_config(&cfg))
    } else {
        let url = relay.unwrap_or_else(|| cfg.services.relay_url.clone());
        Arc::new(RelayClient::new(&url))
    };

    let controller = DialogueController::new(&cfg, ScenarioRobot::from_shared(robot), dialogue)?;
    let outcomes = controller.run().await;

    for outcome in &outcomes {
        info!(
            "{}: {} turns, {} replies, {} idle prompts, {} fillers",
            outcome.object,
            outcome.turns,
            outcome.responses_played,
            outcome.idle_prompts,
            outcome.fillers
        );
    }

    Ok(())
}
