use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use roftpd::{config, Args, Config, Server};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            // clap's own `Error::exit` uses code 2 for usage errors; spec.md
            // §6 calls for exit 1 on an unknown or malformed flag, reserving
            // 0 only for `-h`/`--help` and `--version`.
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    std::process::ExitCode::SUCCESS
                }
                _ => std::process::ExitCode::from(1),
            };
        }
    };
    init_logging(args.verbose);

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            roftpd::server::report_startup_error(&err);
            return std::process::ExitCode::FAILURE;
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(err) => {
            roftpd::server::report_startup_error(&err);
            return std::process::ExitCode::FAILURE;
        }
    };

    server.serve().await;
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::log_level_for(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
