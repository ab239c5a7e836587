use clap::{Arg, Command};
use log::LevelFilter;
use outbound_guard::message_file::MessageFile;
use outbound_guard::registry::ProjectDomainRegistry;
use outbound_guard::{
    pre_send, Clock, ComplianceEvaluator, Config, ConfirmPrompt, FixedClock, SendDecision,
    SystemClock, Verdict,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    let matches = Command::new("outbound-guard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pre-send attachment compliance checker for outgoing mail")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/outbound-guard.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-message")
                .long("test-message")
                .value_name("FILE")
                .help("Evaluate a YAML message description")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("date")
                .long("date")
                .value_name("YYYY-MM-DD")
                .help("Evaluate as if today were this date")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the verdict as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .help("Ask for confirmation on stdin when warnings are raised")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging of every check")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let env_filter = std::env::var("RUST_LOG").ok();
    let config_may_set_level = init_logging(verbose, env_filter.as_deref());

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/outbound-guard.yaml");

    let config = match Config::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };
    if config_may_set_level && !verbose {
        apply_configured_level(config.logging.as_ref().map(|l| l.level.as_str()));
    }

    if matches.get_flag("test-config") {
        println!("Testing configuration...");
        match config.validate() {
            Ok(()) => {
                println!("Projects in registry: {}", config.projects.len());
                for (project, domains) in &config.projects {
                    println!("  {project}: {}", domains.join(", "));
                }
                println!("Configuration is valid.");
            }
            Err(e) => {
                println!("Configuration validation failed:");
                println!("Error: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    let Some(message_path) = matches.get_one::<String>("test-message") else {
        eprintln!("Nothing to do: pass --test-message FILE, --test-config or --generate-config");
        process::exit(1);
    };

    let clock: Arc<dyn Clock> = match matches.get_one::<String>("date") {
        Some(date) => match parse_date(date) {
            Some(clock) => Arc::new(clock),
            None => {
                eprintln!("Invalid --date '{date}', expected YYYY-MM-DD");
                process::exit(1);
            }
        },
        None => Arc::new(SystemClock),
    };

    let registry = Arc::new(ProjectDomainRegistry::from_config(&config.projects));
    let evaluator = match ComplianceEvaluator::new(&config, registry, clock) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            eprintln!("Error creating evaluator: {e:#}");
            process::exit(1);
        }
    };

    let message = match load_message(message_path) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("Error loading message: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("interactive") {
        match pre_send(&evaluator, &message, &StdinPrompt) {
            Ok((SendDecision::Send, _)) => println!("SEND"),
            Ok((SendDecision::Cancel, _)) => println!("CANCEL"),
            Err(e) => {
                eprintln!("Evaluation failed: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let verdict = match evaluator.evaluate(&message) {
        Ok(verdict) => verdict,
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&verdict) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize verdict: {e}");
                process::exit(1);
            }
        }
    } else {
        print_verdict(evaluator.title(), &verdict);
    }

    if verdict.has_issues {
        process::exit(2);
    }
}

/// Level the command line imposes, or `None` when `RUST_LOG` is in charge.
fn startup_level(verbose: bool, env_filter: Option<&str>) -> Option<LevelFilter> {
    match env_filter {
        Some(filter) if !filter.trim().is_empty() => None,
        _ if verbose => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Info),
    }
}

/// Returns whether the global level may still be changed by the config.
fn init_logging(verbose: bool, env_filter: Option<&str>) -> bool {
    let mut builder = env_logger::Builder::from_default_env();
    match startup_level(verbose, env_filter) {
        Some(level) => {
            // The global max level is the effective filter so the config can
            // lower or raise it after loading.
            builder.filter_level(LevelFilter::Trace).init();
            log::set_max_level(level);
            true
        }
        None => {
            builder.init();
            false
        }
    }
}

fn apply_configured_level(configured: Option<&str>) {
    if let Some(level) = configured {
        match level.parse::<LevelFilter>() {
            Ok(level) => log::set_max_level(level),
            Err(_) => log::warn!("Unknown logging level '{level}' in configuration"),
        }
    }
}

fn parse_date(date: &str) -> Option<FixedClock> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(FixedClock)
}

fn load_message(path: &str) -> anyhow::Result<outbound_guard::Message> {
    let base_dir = Path::new(path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    MessageFile::from_file(path)?.into_message(&base_dir)
}

fn print_verdict(title: &str, verdict: &Verdict) {
    if !verdict.has_issues {
        println!("No issues found.");
        return;
    }
    println!("[{title}]");
    println!("{}", verdict.message);
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the project registry to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, title: &str, message: &str) -> bool {
        println!("[{title}]");
        println!("{message}");
        print!("[y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                log::warn!("Failed to read confirmation: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_takes_precedence() {
        assert_eq!(startup_level(true, Some("outbound_guard=trace")), None);
        assert_eq!(startup_level(false, Some("warn")), None);
    }

    #[test]
    fn test_flag_levels_without_rust_log() {
        assert_eq!(startup_level(false, None), Some(LevelFilter::Info));
        assert_eq!(startup_level(true, None), Some(LevelFilter::Debug));
        assert_eq!(startup_level(true, Some("  ")), Some(LevelFilter::Debug));
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2020-04-09").is_some());
        assert!(parse_date("04/09/2020").is_none());
    }
}
