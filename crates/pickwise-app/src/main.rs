// Pickwise entry point.
//
// Startup sequence:
// 1. Load .env, initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load projections into the catalog
// 4. Build the draft session and completion client
// 5. Run the draft loop on stdin/stdout

use std::path::PathBuf;

use anyhow::Context;
use directories::ProjectDirs;
use tracing::info;

use pickwise_app::console::StdConsole;
use pickwise_app::draft_loop::DraftLoop;
use pickwise_core::config;
use pickwise_core::draft::roster::Roster;
use pickwise_core::draft::DraftSession;
use pickwise_core::projections;
use pickwise_llm::LlmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and tracing
    let dotenv_path = dotenvy::dotenv().ok();
    let log_path = init_tracing()?;
    info!("Pickwise starting up");
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} projection sources",
        config.league.name,
        config.league.num_teams,
        config.data_sources.len()
    );

    // 3. Load projections
    let catalog = projections::load_all(&config).context("failed to load projections")?;
    info!("Catalog holds {} projection rows", catalog.len());

    // 4. Session and completion client
    let roster = Roster::new(&config.league.roster);
    let session = DraftSession::new(catalog, roster);

    let llm_client = LlmClient::from_config(&config);
    if llm_client.is_active() {
        info!("Completion client ready (model {})", config.llm.model);
    } else {
        info!("Completion client disabled (no API key)");
    }

    // 5. Run
    println!(
        "Pickwise draft advisor: {} ({} teams). Logging to {}",
        config.league.name,
        config.league.num_teams,
        log_path.display()
    );
    let draft_loop = DraftLoop::new(
        session,
        StdConsole::new(),
        llm_client,
        config.league.clone(),
        &config.advisor,
    );
    let session = draft_loop.run().await?;

    info!(
        "Pickwise shut down cleanly after {} picks",
        session.picks().len()
    );
    Ok(())
}

/// Directory for log files: the platform data-local dir, or `./logs`.
fn log_dir() -> anyhow::Result<PathBuf> {
    match ProjectDirs::from("", "", "pickwise") {
        Some(dirs) => Ok(dirs.data_local_dir().join("logs")),
        None => Ok(std::env::current_dir()?.join("logs")),
    }
}

/// Initialize tracing to log to a file (the terminal is the interactive surface).
/// Returns the log file path.
fn init_tracing() -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("pickwise.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pickwise_app=info,pickwise_core=info,pickwise_llm=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
