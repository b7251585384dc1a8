use clap::Parser;
use apk_controller::cli::commands::{cmd_expected, cmd_run, cmd_validate};
use apk_controller::cli::config::{Cli, Commands, load_config, resolve_run};
use apk_controller::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            script,
            serial,
            host,
            port,
            overwrite,
            export_dir,
            trace,
            report,
            no_await_launch,
        } => {
            // Resolve device and run settings: CLI > config > defaults
            let settings = resolve_run(
                &config,
                serial.as_deref(),
                host.as_deref(),
                port,
                overwrite,
                export_dir.as_deref(),
                trace.as_deref(),
                no_await_launch,
            );
            let done = cmd_run(&script, &settings, report.as_deref())?;
            if !done {
                std::process::exit(1);
            }
        }
        Commands::Validate { script } => cmd_validate(&script)?,
        Commands::Expected {
            script,
            screen,
            action,
        } => cmd_expected(&script, screen, action)?,
    }

    Ok(())
}
