//! Entrypoint of the copystd binary
#![warn(
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

use dotenvy::dotenv;
use trogging::{
    TroggingGuard,
    cli::LoggingConfigBuilderExt,
    tracing_subscriber::{Registry, prelude::*},
};

mod commands {
    pub(crate) mod common;
    pub(crate) mod copy;
    pub(crate) mod plan;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "copystd",
    version,
    disable_help_flag = true,
    arg(
        clap::Arg::new("help")
            .short('h')
            .long("help")
            .help("Print help information")
            .action(clap::ArgAction::Help)
            .global(true)
    ),
    about = "Copy internal packages of the Go standard library into a public module",
    long_about = r#"Copy internal packages of the Go standard library into a public module

Restricted packages (such as `internal/...` and `cmd/internal/...`) cannot be imported from
outside the Go tree. copystd copies each requested package, together with every restricted
package it depends on, into a module of your own and rewrites their imports to match.

Examples:
    # Copy internal/trace and its restricted dependencies into the current module
    copystd copy --packages internal/trace --module example.com/x

    # Show where each package would go, without writing anything
    copystd plan --packages internal/trace,cmd/internal/objabi --module example.com/x

    # Copy with debug logging and without goimports
    copystd copy -v --formatter none --packages internal/trace --module example.com/x --dst ./x
"#
)]
struct Config {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Copy packages and their restricted dependencies into the destination module
    Copy(commands::copy::Config),

    /// List the packages a copy would relocate and where they would go
    Plan(commands::plan::Config),
}

fn main() {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();

    fn handle_init_logs(r: Result<TroggingGuard, trogging::Error>) -> TroggingGuard {
        match r {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Initializing logs failed: {e}");
                std::process::exit(ReturnCode::Failure as _);
            }
        }
    }

    match config.command {
        None => println!("command required, -h/--help for help"),
        Some(Command::Copy(config)) => {
            let _tracing_guard = handle_init_logs(init_logs_and_tracing(&config.logging_config));
            if let Err(e) = commands::copy::command(config) {
                eprintln!("Copy command failed: {e}");
                std::process::exit(ReturnCode::Failure as _)
            }
        }
        Some(Command::Plan(config)) => {
            let _tracing_guard = handle_init_logs(init_logs_and_tracing(&config.logging_config));
            if let Err(e) = commands::plan::command(config) {
                eprintln!("Plan command failed: {e}");
                std::process::exit(ReturnCode::Failure as _)
            }
        }
    }
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // a missing env file is not an error
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(ReturnCode::Failure as _);
        }
    };
}

fn init_logs_and_tracing(
    config: &trogging::cli::LoggingConfig,
) -> Result<TroggingGuard, trogging::Error> {
    let log_layer = trogging::Builder::new()
        .with_default_log_filter("info")
        .with_logging_config(config)
        .build()?;

    let subscriber = Registry::default().with(log_layer);
    trogging::install_global(subscriber)
}
