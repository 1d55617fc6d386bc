//! opensky-impala - query historical OpenSky data through the Impala shell.

mod cli;

use cli::Cli;
use opensky_impala::config::Config;
use opensky_impala::error::Result;
use opensky_impala::logging;
use opensky_impala::output;
use opensky_impala::query::{QueryEngine, QueryOutcome, QueryPlan};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Pick up OPENSKY_* variables from a local .env, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let params = cli.to_query_params()?;
    let format = cli.output_format()?;

    if cli.dry_run {
        let plan = QueryPlan::build(&params)?;
        if params.count_first {
            println!("{}", plan.count_command());
        }
        println!("{}", plan.select_command());
        return Ok(());
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load(&config_path)?;

    let mut engine = QueryEngine::ssh(&config)?;
    info!("Server: {}", engine.connection().display_target());

    let outcome = engine.query(&params).await;
    if let Err(e) = engine.close().await {
        warn!("Failed to close session: {e}");
    }

    match outcome? {
        QueryOutcome::NoData => println!("No record found."),
        QueryOutcome::Records(records) => {
            print!("{}", output::render(&records, format)?);
        }
    }

    Ok(())
}
