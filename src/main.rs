//! mongo-save
//!
//! Back up a MongoDB database to a directory of per-document files, and
//! restore it.
//!
//! # Usage
//!
//! ```bash
//! mongo-save backup --uri mongodb://localhost:27017/shop --out ./shop
//! mongo-save restore --uri mongodb://localhost:27017 --in ./shop --drop
//! ```

use mongo_save::cli::CliInterface;
use mongo_save::config;
use mongo_save::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Load `.env`
/// 2. Parse command-line arguments and load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
async fn run() -> Result<()> {
    config::load_dotenv();

    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    cli.execute().await
}

/// Initialize logging from the resolved log level
///
/// Logs go to stderr so completion messages on stdout stay clean.
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
