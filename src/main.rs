use gocbox::build::CancellationToken;
use gocbox::cli::commands::{CliArgs, Commands};
use gocbox::cli::handlers::{handle_build, handle_list, handle_run, EXIT_FAILURE};
use gocbox::util::logging::{init_logging, parse_level, LoggingConfig};
use gocbox::{GocboxConfig, VERSION};

use clap::Parser;
use tracing::{debug, error, info, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config = GocboxConfig::default();
    init_logging_from_args(&args, &config);

    debug!("gocbox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_FAILURE);
    }
    debug!("{}", config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            on_interrupt.cancel();
        }
    });

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, &config, &cancel).await,
        Commands::Run(run_args) => handle_run(run_args, &config, &cancel).await,
        Commands::List(list_args) => handle_list(list_args, &config, &cancel).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &GocboxConfig) {
    let mut logging = if args.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };

    logging.level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };
    logging.use_json = config.log_json;

    init_logging(logging);
}
