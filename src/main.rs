//! VesselHarbor command-line client
//!
//! Resolves the layered configuration once at startup, installs it as the
//! process configuration and dispatches to the requested command.

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use std::path::PathBuf;
use tracing::{debug, info};
use vesselharbor_config::app::{self, LOCAL_CONFIG_FILE};
use vesselharbor_config::cli::{Cli, Command, config};
use vesselharbor_config::config::{CliOverrides, ConfigLoader, EnvSnapshot};
use vesselharbor_config::error::{ConfigError, ExitStatus};
use vesselharbor_config::logging::{self, LogTarget};
use vesselharbor_config::paths::{AppPaths, ExecutionMode};

fn main() {
    let status = match run() {
        Ok(()) => ExitStatus::Success,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<ConfigError>() {
                Some(config_err) => config_err.exit_status(),
                None => ExitStatus::Internal,
            }
        }
    };
    std::process::exit(status.code());
}

fn run() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let overrides = CliOverrides::from_matches(&matches);

    if cli.version {
        print!("{}", Cli::command().render_version());
        return Ok(());
    }

    let mode = ExecutionMode::detect(cli.development);
    let paths = AppPaths::for_mode(mode);

    let mut env = EnvSnapshot::capture();
    let mut dotenv_status = None;
    if mode.loads_dotenv()
        && let Some(dotenv) = &paths.dotenv_file
    {
        // A missing dotenv file only means there is nothing to add.
        dotenv_status = Some(env.load_dotenv(dotenv).map_err(|e| e.to_string()));
    }

    let modules = app::modules();
    let (schema, bindings) = app::build(&modules);
    let mut settings = ConfigLoader::new(schema, bindings)
        .with_paths(paths.config_paths(cli.conf.clone()))
        .with_environment(env)
        .with_cli(overrides)
        .load()?;

    let verbose = cli.verbose || settings.get_as::<bool>("application.verbose")?;
    logging::init(&LogTarget::parse(&cli.log), verbose)?;
    info!(%mode, "Starting {}", app::SOFTWARE);
    match dotenv_status {
        Some(Ok(added)) => debug!(added, "Loaded dotenv entries"),
        Some(Err(reason)) => debug!(%reason, "No dotenv entries loaded"),
        None => {}
    }
    if let Some(target) = settings.write_target() {
        debug!(path = %target.display(), "Configuration write target");
    }

    if cli.write || cli.write_conf.is_some() {
        let target = cli
            .write_conf
            .clone()
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
        settings.write_to(&target, false)?;
        println!("Configuration written to {}", target.display());
        return Ok(());
    }

    // Config editing works on its own copy; everything else reads the
    // installed process configuration.
    if let Some(Command::Config(args)) = &cli.command {
        return config::run(&mut settings, args, &mut std::io::stdout().lock());
    }

    let settings = settings.install()?;
    debug!(base_url = %app::base_url(settings)?, "Resolved API endpoint");
    Cli::command().print_help()?;
    println!();
    Ok(())
}
