use std::process::Command;

/// Shell used to launch the external HTTP tool, and therefore the quoting
/// rules its command line must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh -c`
    Posix,
    /// `cmd /C`
    Cmd,
}

impl ShellFlavor {
    pub fn native() -> Self {
        if cfg!(windows) {
            ShellFlavor::Cmd
        } else {
            ShellFlavor::Posix
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            ShellFlavor::Posix => "sh",
            ShellFlavor::Cmd => "cmd",
        }
    }

    /// Exit status the shell reports when it cannot find the program.
    pub fn not_found_status(self) -> i32 {
        match self {
            ShellFlavor::Posix => 127,
            ShellFlavor::Cmd => 9009,
        }
    }

    /// Quotes one argument so the shell hands it to the program verbatim.
    pub fn quote(self, arg: &str) -> String {
        match self {
            ShellFlavor::Posix => quote_posix(arg),
            ShellFlavor::Cmd => quote_cmd(arg),
        }
    }

    pub fn join(self, args: &[String]) -> String {
        args.iter()
            .map(|arg| self.quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(super) fn command(self, line: &str) -> Command {
        let mut cmd = Command::new(self.program());
        match self {
            ShellFlavor::Posix => {
                cmd.arg("-c").arg(line);
            }
            ShellFlavor::Cmd => {
                cmd.arg("/C");
                push_raw_arg(&mut cmd, line);
            }
        }
        cmd
    }
}

#[cfg(windows)]
fn push_raw_arg(cmd: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(line);
}

#[cfg(not(windows))]
fn push_raw_arg(cmd: &mut Command, line: &str) {
    cmd.arg(line);
}

fn quote_posix(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for ch in arg.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

// Two parsers read the result: cmd.exe (toggles its quote state on every `"`
// and expands `%`), then the program's C runtime (backslash-escaped quotes).
// `cmd_quoted` tracks cmd.exe's view so metacharacters it would see unquoted
// get a caret, and `%` is always emitted outside cmd.exe quotes as `^%`.
fn quote_cmd(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    let mut cmd_quoted = false;
    let mut backslashes = 0usize;

    push_quote(&mut out, &mut cmd_quoted);
    for ch in arg.chars() {
        match ch {
            '\\' => {
                backslashes += 1;
                continue;
            }
            '"' => {
                push_backslashes(&mut out, backslashes * 2 + 1);
                push_quote(&mut out, &mut cmd_quoted);
            }
            '%' => {
                push_backslashes(&mut out, backslashes);
                if cmd_quoted {
                    push_quote(&mut out, &mut cmd_quoted);
                    out.push_str("^%");
                    push_quote(&mut out, &mut cmd_quoted);
                } else {
                    out.push_str("^%");
                }
            }
            '&' | '|' | '<' | '>' | '^' | '(' | ')' if !cmd_quoted => {
                push_backslashes(&mut out, backslashes);
                out.push('^');
                out.push(ch);
            }
            _ => {
                push_backslashes(&mut out, backslashes);
                out.push(ch);
            }
        }
        backslashes = 0;
    }
    push_backslashes(&mut out, backslashes * 2);
    push_quote(&mut out, &mut cmd_quoted);
    out
}

fn push_quote(out: &mut String, cmd_quoted: &mut bool) {
    out.push('"');
    *cmd_quoted = !*cmd_quoted;
}

fn push_backslashes(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push('\\');
    }
}

#[cfg(test)]
mod tests {
    use super::ShellFlavor;

    #[test]
    fn posix_quote_wraps_and_escapes_single_quotes() {
        assert_eq!(ShellFlavor::Posix.quote("plain"), "'plain'");
        assert_eq!(ShellFlavor::Posix.quote("it's"), "'it'\\''s'");
        assert_eq!(ShellFlavor::Posix.quote("$HOME 100%"), "'$HOME 100%'");
    }

    #[test]
    fn posix_join_separates_arguments() {
        let args = vec!["curl".to_string(), "-H".to_string(), "A: b".to_string()];
        assert_eq!(ShellFlavor::Posix.join(&args), "'curl' '-H' 'A: b'");
    }

    #[test]
    fn cmd_quote_escapes_embedded_double_quotes() {
        assert_eq!(ShellFlavor::Cmd.quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn cmd_quote_moves_percent_outside_cmd_quotes() {
        assert_eq!(ShellFlavor::Cmd.quote("50%"), "\"50\"^%\"\"");
    }

    #[test]
    fn cmd_quote_carets_metacharacters_after_escaped_quote() {
        assert_eq!(ShellFlavor::Cmd.quote("a\"&b"), "\"a\\\"^&b\"");
    }

    #[test]
    fn cmd_quote_doubles_backslashes_before_quotes() {
        assert_eq!(ShellFlavor::Cmd.quote("a\\\"b"), "\"a\\\\\\\"b\"");
        assert_eq!(ShellFlavor::Cmd.quote("dir\\"), "\"dir\\\\\"");
        assert_eq!(ShellFlavor::Cmd.quote("a\\b"), "\"a\\b\"");
    }

    #[test]
    fn cmd_quote_handles_json_with_escaped_quotes() {
        let json = r#"{"notes":"a \"b\""}"#;
        let quoted = ShellFlavor::Cmd.quote(json);
        assert!(quoted.starts_with('"') && quoted.ends_with('"'));
        assert!(!quoted.contains('%'));
        assert!(quoted.contains("\\\"notes\\\""));
    }
}
