use chatrelay::config::Config;
use chatrelay::{logging, runtime};
use tracing::{info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_path = Config::resolve_env_path();
    let config = Config::load_from(&env_path)?;

    if let Err(e) = logging::init_logging(&config.log_dir()) {
        logging::init_console_logging();
        warn!("File logging unavailable, logging to console only: {e:#}");
    }
    info!(
        "Starting chatrelay v{VERSION} (config: {})",
        env_path.display()
    );

    runtime::run(config).await
}
