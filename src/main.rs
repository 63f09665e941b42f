//! tether - shell-protocol core
//!
//! Entry point for the tether binary. The shell core has no transport of
//! its own, so the binary drives it from a script:
//! - **test**: replay a JSON-lines script and print emitted events
//! - **check-config**: parse a config file and report problems
//!
//! Run without arguments to see available modes and options.

use std::io::BufReader;
use std::path::PathBuf;

use tether::config::Config;

static POSSIBLE_MODES: &[&str] = &[
    "--test SCRIPT : Replay a JSON-lines script, '-' reads stdin.",
    "                Options: --config FILE (shell configuration)",
    "--check-config FILE : Parse a configuration file and exit.",
];

#[cfg(feature = "profile-with-tracy-mem")]
#[global_allocator]
static GLOBAL: profiling::tracy_client::ProfiledAllocator<std::alloc::System> =
    profiling::tracy_client::ProfiledAllocator::new(std::alloc::System, 10);

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match Config::load_from_file(path) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::error!("Failed to load config {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn main() {
    // events go to stdout, so logs go to stderr
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(feature = "profile-with-tracy")]
    profiling::tracy_client::Client::start();

    profiling::register_thread!("Main Thread");

    #[cfg(feature = "profile-with-puffin")]
    let _server =
        match puffin_http::Server::new(&format!("0.0.0.0:{}", puffin_http::DEFAULT_PORT)) {
            Ok(server) => Some(server),
            Err(e) => {
                tracing::warn!("Failed to start puffin profiling server: {e}");
                None
            }
        };
    #[cfg(feature = "profile-with-puffin")]
    profiling::puffin::set_scopes_on(true);

    let args: Vec<String> = ::std::env::args().collect();
    match args.get(1).map(|s| &s[..]) {
        Some("--test") => {
            let Some(script) = args.get(2) else {
                tracing::error!("--test needs a script path");
                std::process::exit(2);
            };

            let mut config_file = None;
            let mut i = 3;
            while i < args.len() {
                if args[i] == "--config" && i + 1 < args.len() {
                    config_file = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    tracing::warn!("Ignoring argument {}", args[i]);
                    i += 1;
                }
            }
            let config = load_config(config_file.as_ref());

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let result = if script == "-" {
                tether::test_mode::run_test_mode(config, std::io::stdin().lock(), &mut out)
            } else {
                match std::fs::File::open(script) {
                    Ok(file) => {
                        tether::test_mode::run_test_mode(config, BufReader::new(file), &mut out)
                    }
                    Err(e) => Err(e.into()),
                }
            };
            if let Err(e) = result {
                tracing::error!("Test mode failed: {e}");
                std::process::exit(1);
            }
        }
        Some("--check-config") => {
            let Some(path) = args.get(2).map(PathBuf::from) else {
                tracing::error!("--check-config needs a file");
                std::process::exit(2);
            };
            let config = load_config(Some(&path));
            if let Err(e) = config.validate() {
                tracing::error!("{e}");
                std::process::exit(1);
            }
            tracing::info!(
                "Config ok: {} seats, {} outputs",
                config.seat_names().len(),
                config.outputs.len()
            );
        }
        Some(other) => {
            tracing::error!("Unknown mode: {other}");
            std::process::exit(2);
        }
        None => {
            #[allow(clippy::disallowed_macros)]
            {
                eprintln!("USAGE: tether --mode");
                eprintln!();
                eprintln!("Possible modes are:");
                for m in POSSIBLE_MODES {
                    eprintln!("\t{m}");
                }
            }
        }
    }
}
