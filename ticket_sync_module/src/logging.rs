//! Tracing setup for the `ticket-sync` binary.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

/// Installs the global fmt subscriber. With a log file the output is
/// appended there without ANSI colors; otherwise it goes to stderr.
///
/// A subscriber installed earlier (tests, embedding hosts) is left in place.
pub fn init_tracing(log_file: Option<&Path>) -> io::Result<()> {
    let builder = tracing_subscriber::fmt().with_target(false);
    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(err) = installed {
        debug!("keeping existing tracing subscriber: {}", err);
    }
    Ok(())
}
