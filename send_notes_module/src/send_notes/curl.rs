use std::io;
use std::time::Duration;

use tracing::debug;

use super::errors::TransportError;
use super::shell::ShellFlavor;
use super::types::{NoteRequest, NoteTransport, TransportOptions, API_KEY_HEADER, JSON_CONTENT_TYPE};
use super::utils::tail_string;

/// Sends notes by shelling out to a curl-compatible program.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: String,
    shell: ShellFlavor,
    use_proxy: bool,
    timeout: Duration,
}

impl CurlTransport {
    pub fn new(options: &TransportOptions) -> Self {
        Self {
            program: options.curl_program.clone(),
            shell: options.shell,
            use_proxy: options.use_proxy,
            timeout: options.timeout,
        }
    }

    /// Program arguments, unquoted, with the program itself first.
    pub fn command_args(&self, request: &NoteRequest) -> Result<Vec<String>, TransportError> {
        let body = serde_json::to_string(&request.payload)?;
        let mut args = vec![
            self.program.clone(),
            "-sS".to_string(),
            "--fail".to_string(),
            "-X".to_string(),
            "PUT".to_string(),
            "-H".to_string(),
            format!("{}: {}", API_KEY_HEADER, request.api_key),
            "-H".to_string(),
            format!("Content-Type: {}", JSON_CONTENT_TYPE),
            "--data-binary".to_string(),
            body,
            "--max-time".to_string(),
            self.timeout.as_secs().max(1).to_string(),
        ];
        if !self.use_proxy {
            args.push("--noproxy".to_string());
            args.push("*".to_string());
        }
        args.push(request.url.clone());
        Ok(args)
    }

    pub fn command_line(&self, request: &NoteRequest) -> Result<String, TransportError> {
        Ok(self.shell.join(&self.command_args(request)?))
    }
}

impl NoteTransport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn send(&self, request: &NoteRequest) -> Result<(), TransportError> {
        let line = self.command_line(request)?;
        debug!("PUT {} via {} ({} shell)", request.url, self.program, self.shell.program());

        // output() drains stdout and stderr before waiting on the exit status.
        let output = match self.shell.command(&line).output() {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TransportError::CommandNotFound {
                    program: self.shell.program().to_string(),
                })
            }
            Err(err) => return Err(TransportError::Io(err)),
        };

        if output.status.success() {
            return Ok(());
        }
        if output.status.code() == Some(self.shell.not_found_status()) {
            return Err(TransportError::CommandNotFound {
                program: self.program.clone(),
            });
        }
        Err(TransportError::CommandFailed {
            status: output.status.code(),
            stderr: tail_string(&String::from_utf8_lossy(&output.stderr), 2000),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(use_proxy: bool) -> TransportOptions {
        TransportOptions {
            use_proxy,
            timeout: Duration::from_secs(15),
            curl_program: "curl".to_string(),
            shell: ShellFlavor::Posix,
        }
    }

    fn request() -> NoteRequest {
        NoteRequest::new(
            "https://tracker.example.com/issues/42.json",
            "secret",
            json!({"issue": {"notes": "it's 100% done"}}),
        )
    }

    #[test]
    fn command_args_carry_header_body_and_url() {
        let transport = CurlTransport::new(&options(true));
        let args = transport.command_args(&request()).unwrap();
        assert_eq!(args[0], "curl");
        assert!(args.contains(&"X-Redmine-API-Key: secret".to_string()));
        assert!(args.contains(&"Content-Type: application/json".to_string()));
        assert!(args.contains(&r#"{"issue":{"notes":"it's 100% done"}}"#.to_string()));
        assert_eq!(args.last().unwrap(), "https://tracker.example.com/issues/42.json");
        assert!(!args.contains(&"--noproxy".to_string()));
    }

    #[test]
    fn command_args_disable_proxy_when_requested() {
        let transport = CurlTransport::new(&options(false));
        let args = transport.command_args(&request()).unwrap();
        let position = args.iter().position(|arg| arg == "--noproxy").unwrap();
        assert_eq!(args[position + 1], "*");
    }

    #[cfg(unix)]
    #[test]
    fn missing_program_is_reported_as_not_found() {
        let transport = CurlTransport::new(&TransportOptions {
            curl_program: "/nonexistent/curl-xyz".to_string(),
            ..options(true)
        });
        match transport.send(&request()) {
            Err(TransportError::CommandNotFound { program }) => {
                assert_eq!(program, "/nonexistent/curl-xyz");
            }
            other => panic!("expected command not found, got {:?}", other),
        }
    }

    #[test]
    fn not_found_status_matches_shell() {
        assert_eq!(ShellFlavor::Posix.not_found_status(), 127);
        assert_eq!(ShellFlavor::Cmd.not_found_status(), 9009);
    }

    #[test]
    fn command_line_quotes_body_for_posix_shell() {
        let transport = CurlTransport::new(&options(true));
        let line = transport.command_line(&request()).unwrap();
        assert!(line.contains(r#"'{"issue":{"notes":"it'\''s 100% done"}}'"#));
        assert!(line.starts_with("'curl' '-sS' '--fail' '-X' 'PUT'"));
    }
}
