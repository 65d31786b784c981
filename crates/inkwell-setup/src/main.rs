mod config;

use inkwell_db::Database;
use tracing::info;

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkwell_setup=debug,inkwell_db=debug".into()),
        )
        .init();

    let config = Config::from_env();

    // Opening runs the schema bootstrap
    let db = Database::open(&config.db_path)?;

    let users = db.find_all_users()?.len();
    info!(
        "Inkwell database ready at {} ({} users listed)",
        config.db_path.display(),
        users
    );

    Ok(())
}
