//! Config validation CLI tool
//!
//! Validates a PassPilot configuration file and reports any errors.

use passpilot_config::{ConfigError, RepeatPolicy, CURRENT_CONFIG_VERSION};
use passpilot_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1).map(String::as_str) {
        Some("-h") | Some("--help") => {
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a PassPilot configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_config_path().display());
            return ExitCode::from(2);
        }
        Some(path) => PathBuf::from(path),
        None => default_config_path(),
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match passpilot_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  API: {}", settings.api.base_url);
            match settings.scope() {
                Some(scope) => println!("  School: {}", scope),
                None => println!("  School: (none, monitoring disabled)"),
            }
            println!(
                "  Polling: active passes every {}s, expiry check every {}s, school every {}s",
                settings.polling.active_passes.as_secs(),
                settings.polling.expiry_check.as_secs(),
                settings.polling.school.as_secs()
            );
            let repeat = match settings.notifications.repeat {
                RepeatPolicy::EveryCycle => "every cycle".to_string(),
                RepeatPolicy::Once => "once per pass".to_string(),
                RepeatPolicy::Throttle { interval } => {
                    format!("at most every {}s", interval.as_secs())
                }
            };
            println!(
                "  Notifications: {}s window, repeat {}",
                settings.notifications.window.as_secs(),
                repeat
            );

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
