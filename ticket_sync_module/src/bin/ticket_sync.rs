//! Command-line host for the ticket sync engine.
//!
//! Stands in for the mail client: reads message records from JSON files and
//! feeds them to the orchestrator, one thread per message.

use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;

use tracing::{error, info};

use ticket_sync_module::config::SyncConfig;
use ticket_sync_module::logging::init_tracing;
use ticket_sync_module::message::{MessageDirection, MessageRecord};
use ticket_sync_module::new_issue::new_issue_url;
use ticket_sync_module::SyncOrchestrator;

fn print_usage() {
    eprintln!(
        r##"Usage: ticket-sync [--config=<path>] <command> [arguments]

Commands:
  sync [--direction=received|sent] <message.json>...
                                     Record each message as a note on the ticket named in its subject
  new-issue-url <message.json>       Print a prefilled "new ticket" URL for a message

Message files hold one JSON object:
  {{"subject": "...", "body": "...", "sent_on": "2024-03-01T09:30:00",
   "sender": "Name <a@example.com>", "recipients": ["b@example.com"]}}

Environment Variables:
  TRACKER_URL                - Tracker base URL (required)
  TRACKER_API_KEY            - API key sent as X-Redmine-API-Key (required)
  TICKET_ID_PREFIX           - Pattern in front of the ticket number (default "id:")
  REPLY_DELIMITER_1..4       - Patterns marking the start of quoted history
  NOTE_TRANSPORT             - native or curl (default native)
  SYNC_MAX_ATTEMPTS          - Write attempts per message (default 5)
  SYNC_RETRY_BASE_DELAY_MS   - Linear backoff step (default 1000)
  TRACKER_USE_PROXY          - Set to 0 to bypass system proxies
  TRACKER_TIMEOUT_SECS       - Request timeout (default 30)
  CURL_PROGRAM               - curl executable for the curl transport
  TICKET_SYNC_LOG_FILE       - Append logs to this file instead of stderr
  TICKET_SYNC_CONFIG_PATH    - TOML file with the same settings (env wins)
"##
    );
}

fn parse_arg(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{}=", flag);
    args.iter()
        .find_map(|arg| arg.strip_prefix(&prefix).map(str::to_string))
}

fn positional(args: &[String]) -> Vec<&String> {
    args.iter().filter(|arg| !arg.starts_with("--")).collect()
}

fn read_record(path: &Path) -> Result<MessageRecord, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&content)
        .map_err(|err| format!("invalid message record in {}: {}", path.display(), err))
}

/// Reads every file up front so a bad file fails the run before any sync
/// thread has started.
fn read_records(files: &[&String]) -> Result<Vec<(String, MessageRecord)>, String> {
    files
        .iter()
        .map(|file| -> Result<(String, MessageRecord), String> {
            Ok((file.to_string(), read_record(Path::new(file.as_str()))?))
        })
        .collect()
}

fn load_config(args: &[String]) -> Result<SyncConfig, String> {
    let config_path = parse_arg(args, "--config").map(PathBuf::from);
    SyncConfig::load(config_path.as_deref()).map_err(|err| err.to_string())
}

fn cmd_sync(args: &[String], files: &[&String]) -> Result<bool, String> {
    let direction = match parse_arg(args, "--direction") {
        Some(raw) => MessageDirection::parse(&raw)
            .ok_or_else(|| format!("unknown direction: {} (expected received or sent)", raw))?,
        None => MessageDirection::Received,
    };
    let records = read_records(files)?;
    let config = load_config(args)?;
    init_tracing(config.log_file.as_deref())
        .map_err(|err| format!("failed to open log file: {}", err))?;

    let orchestrator = Arc::new(SyncOrchestrator::new(config).map_err(|err| err.to_string())?);
    let handles: Vec<_> = records
        .into_iter()
        .map(|(file, record)| (file, orchestrator.on_new_message(record, direction)))
        .collect();

    let mut all_ok = true;
    for (file, handle) in handles {
        match handle.join() {
            Ok(Ok(outcome)) => info!("{}: {:?}", file, outcome),
            Ok(Err(err)) => {
                error!("{}: {}", file, err);
                all_ok = false;
            }
            Err(_) => {
                error!("{}: sync thread panicked", file);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn cmd_new_issue_url(args: &[String], file: &str) -> Result<bool, String> {
    let config = load_config(args)?;
    let record = read_record(Path::new(file))?;
    println!("{}", new_issue_url(&config.tracker_url, &record));
    Ok(true)
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let positional = positional(&args);

    let Some(command) = positional.first() else {
        print_usage();
        exit(1);
    };

    let result = match command.as_str() {
        "sync" => {
            if positional.len() < 2 {
                eprintln!("Error: at least one message file required");
                print_usage();
                exit(1);
            }
            cmd_sync(&args, &positional[1..])
        }
        "new-issue-url" => {
            if positional.len() != 2 {
                eprintln!("Error: exactly one message file required");
                print_usage();
                exit(1);
            }
            cmd_new_issue_url(&args, positional[1])
        }
        "help" | "-h" => {
            print_usage();
            return;
        }
        other => {
            eprintln!("Error: unknown command: {}", other);
            print_usage();
            exit(1);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(err) => {
            eprintln!("Error: {}", err);
            exit(1);
        }
    }
}
