use mockito::{Matcher, Server};
use send_notes_module::{
    build_transport, NoteRequest, ShellFlavor, TransportError, TransportKind, TransportOptions,
};
use serde_json::json;
use std::time::Duration;

fn native_options() -> TransportOptions {
    TransportOptions {
        use_proxy: false,
        timeout: Duration::from_secs(5),
        ..TransportOptions::default()
    }
}

#[test]
fn native_transport_puts_note_with_api_key() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Server::new();
    let payload = json!({"issue": {"notes": "SentOn: 2024-03-01 09:30\nSubject: hi"}});

    let put_mock = server
        .mock("PUT", "/issues/42.json")
        .match_header("x-redmine-api-key", "test-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(payload.clone()))
        .with_status(204)
        .expect(1)
        .create();

    let transport = build_transport(TransportKind::Native, &native_options())?;
    let request = NoteRequest::new(format!("{}/issues/42.json", server.url()), "test-key", payload);
    transport.send(&request)?;

    put_mock.assert();
    assert_eq!(transport.name(), "native");
    Ok(())
}

#[test]
fn native_transport_returns_response_body_on_rejection() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Server::new();
    let _put_mock = server
        .mock("PUT", "/issues/7.json")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":["Notes is invalid"]}"#)
        .expect(1)
        .create();

    let transport = build_transport(TransportKind::Native, &native_options())?;
    let request = NoteRequest::new(
        format!("{}/issues/7.json", server.url()),
        "test-key",
        json!({"issue": {"notes": "x"}}),
    );
    match transport.send(&request) {
        Err(TransportError::Rejected { status, body }) => {
            assert_eq!(status, 422);
            assert!(body.contains("Notes is invalid"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    Ok(())
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, contents: &str) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, contents)?;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions)
}

// Success and failure share one test so no other test in this binary forks
// while a freshly written script is being executed.
#[cfg(unix)]
#[test]
fn curl_transport_passes_arguments_through_shell_and_reports_stderr(
) -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::TempDir::new()?;
    let args_path = temp.path().join("args.txt");
    let ok_script = temp.path().join("fake-curl");
    write_script(
        &ok_script,
        &format!(
            "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\"; done > '{}'\n",
            args_path.display()
        ),
    )?;

    let payload = json!({"issue": {"notes": "it's \"quoted\" 100% $HOME `id`"}});
    let options = TransportOptions {
        use_proxy: true,
        timeout: Duration::from_secs(5),
        curl_program: ok_script.to_string_lossy().into_owned(),
        shell: ShellFlavor::Posix,
    };
    let transport = build_transport(TransportKind::Curl, &options)?;
    let request = NoteRequest::new(
        "https://tracker.example.com/issues/42.json",
        "test-key",
        payload.clone(),
    );
    transport.send(&request)?;

    let recorded = std::fs::read_to_string(&args_path)?;
    let lines: Vec<&str> = recorded.lines().collect();
    assert!(lines.contains(&"X-Redmine-API-Key: test-key"));
    assert!(lines.contains(&serde_json::to_string(&payload)?.as_str()));
    assert_eq!(lines.last(), Some(&"https://tracker.example.com/issues/42.json"));
    assert_eq!(transport.name(), "curl");

    let failing_script = temp.path().join("failing-curl");
    write_script(
        &failing_script,
        "#!/bin/sh\necho 'curl: (22) The requested URL returned error: 500' >&2\nexit 22\n",
    )?;
    let options = TransportOptions {
        curl_program: failing_script.to_string_lossy().into_owned(),
        ..options
    };
    let transport = build_transport(TransportKind::Curl, &options)?;
    match transport.send(&request) {
        Err(TransportError::CommandFailed { status, stderr }) => {
            assert_eq!(status, Some(22));
            assert!(stderr.contains("returned error: 500"));
        }
        other => panic!("expected command failure, got {:?}", other),
    }
    Ok(())
}
