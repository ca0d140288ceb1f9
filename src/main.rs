use anyhow::Result;
use colored::Colorize;
use tracing::error;

use delta_options::commands::HarvestCommands;
use delta_options::config::{self, RunConfig};
use delta_options::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_logging(config::LOG_DIR)?;

    let cfg = RunConfig::from_env();

    if let Err(e) = HarvestCommands::run(&cfg).await {
        error!(error = %format!("{:#}", e), "harvest run failed");
        println!("{} Run aborted: {:#}", "✗".red(), e);
        return Err(e);
    }

    println!("{}", "Done!".green().bold());
    Ok(())
}
