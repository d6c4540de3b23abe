use anyhow::{Context, Result};
use log::{debug, error};

use batch_converter::load_or_default;
use commandline_tool::commands::{
    apply_convert_overrides, run_check_endpoint, run_convert, run_preview,
};
use commandline_tool::logging::init_logging;
use commandline_tool::{Commands, parse_args};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.debug);

    let mut cfg = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!("Configuration: {:?}", cfg);

    let result = match cli.command {
        Commands::Convert {
            root,
            pattern,
            jobs,
            dry_run,
        } => {
            apply_convert_overrides(&mut cfg, root, pattern, jobs);
            run_convert(cfg, dry_run).await
        }
        Commands::Preview { file, full } => run_preview(&file, &cfg, full),
        Commands::CheckEndpoint {
            base_url,
            model,
            api_key,
        } => run_check_endpoint(&cfg, base_url, model, api_key).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
