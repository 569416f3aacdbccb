use clap::Parser;
use selector_helper::cli::commands::{
    CaptureRequest, cmd_candidates, cmd_capture, cmd_clear, cmd_format, cmd_history, open_store,
    resolve_framework,
};
use selector_helper::cli::config::{Cli, Commands, load_config};
use selector_helper::logging::init_logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    // Resolve shared settings: CLI > config > defaults
    let framework = resolve_framework(cli.framework.as_deref(), &config)?;
    let store_path = cli.store.as_deref().or(config.store_path.as_deref());

    let output = match cli.command {
        Commands::Candidates { dom, target, json } => {
            cmd_candidates(&dom, &target, framework, json, &config)?
        }
        Commands::Format { kind, value } => cmd_format(&kind, &value, framework)?,
        Commands::Capture {
            dom,
            target,
            select,
            trace,
        } => {
            let request = CaptureRequest {
                dom_path: &dom,
                target: &target,
                select,
                trace_path: trace.as_deref(),
                framework,
            };
            cmd_capture(&request, open_store(store_path)?, &config)?
        }
        Commands::History { json } => cmd_history(&open_store(store_path)?, framework, json)?,
        Commands::Clear { history } => cmd_clear(&open_store(store_path)?, history)?,
    };

    print!("{}", output);
    Ok(())
}
