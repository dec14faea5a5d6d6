//! Exec action dispatch
//!
//! Command templates use `${VAR}` placeholders over a closed vocabulary
//! (ID, NAME, ARN plus resource-specific variables). Every value that a
//! template actually references is scanned for shell metacharacters
//! before substitution; a hit fails closed so an unusual resource name
//! can never smuggle shell syntax into the subprocess. Unknown
//! placeholders are left untouched as literal text.

use super::error::{Error, Result};
use super::resource::Resource;
use anyhow::Context;
use std::process::{Command, Stdio};

/// Characters that end, chain, or substitute shell commands.
pub const UNSAFE_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '(', ')', '{', '}', '<', '>', '\n', '\r',
];

fn resolve_var(resource: &dyn Resource, var: &str) -> Option<String> {
    match var {
        "ID" => Some(resource.id().to_string()),
        "NAME" => Some(resource.name().to_string()),
        "ARN" => Some(resource.arn().to_string()),
        _ => resource.template_var(var),
    }
}

/// Expand `${VAR}` placeholders in a command template.
///
/// Fails with [`Error::UnsafeValue`] when a referenced value contains a
/// shell metacharacter; values the template does not reference are
/// never checked.
pub fn expand_variables(template: &str, resource: &dyn Resource) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated placeholder, keep as literal text.
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let var = &after[..end];
        match resolve_var(resource, var) {
            Some(value) => {
                if value.contains(|c| UNSAFE_CHARS.contains(&c)) {
                    return Err(Error::UnsafeValue {
                        var: var.to_string(),
                    });
                }
                out.push_str(&value);
            }
            // Unknown variable: not an error, leave the placeholder.
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Result of a shell operation
#[derive(Debug)]
pub enum ShellResult {
    Success,
    Failed(i32),
    Error(String),
}

/// Run an expanded command through a POSIX shell, inheriting stdio.
///
/// The AWS environment (credentials, region, profile) is set explicitly
/// from the resolved session rather than inherited, so the subprocess
/// matches the profile the UI is browsing. `skip_aws_env` opts out for
/// commands that must touch the ambient credential files themselves.
pub fn run_command(
    command: &str,
    aws_env: &[(String, String)],
    skip_aws_env: bool,
) -> ShellResult {
    tracing::info!("Executing: {}", command);

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if !skip_aws_env {
        for (key, value) in aws_env {
            cmd.env(key, value);
        }
    }

    match cmd.spawn() {
        Ok(mut child) => match child.wait() {
            Ok(status) => {
                if status.success() {
                    ShellResult::Success
                } else {
                    ShellResult::Failed(status.code().unwrap_or(-1))
                }
            }
            Err(e) => ShellResult::Error(format!("Failed to wait for process: {}", e)),
        },
        Err(e) => ShellResult::Error(format!("Failed to execute shell: {}", e)),
    }
}

/// Terminal preparation for shell execution
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Prepare terminal for an external command
    pub fn prepare() -> anyhow::Result<Self> {
        crossterm::terminal::disable_raw_mode().context("Failed to disable raw mode")?;

        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        )
        .context("Failed to leave alternate screen")?;

        Ok(Self { _private: () })
    }

    /// Restore terminal after the command completes
    pub fn restore(self) -> anyhow::Result<()> {
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )
        .context("Failed to enter alternate screen")?;

        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")?;

        Ok(())
    }
}

/// Suspend the TUI, run a shell operation, wait for Enter, restore.
pub fn execute_with_terminal_handling<F>(f: F) -> anyhow::Result<ShellResult>
where
    F: FnOnce() -> ShellResult,
{
    let guard = TerminalGuard::prepare()?;

    print!("\x1B[2J\x1B[H");
    std::io::Write::flush(&mut std::io::stdout())?;

    let result = f();

    if matches!(result, ShellResult::Success | ShellResult::Failed(_)) {
        println!("\nPress Enter to return...");
        let mut input = String::new();
        let _ = std::io::stdin().read_line(&mut input);
    }

    guard.restore()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::resource::Resource;
    use serde_json::Value;

    #[derive(Debug)]
    struct FakeResource {
        id: String,
        name: String,
        raw: Value,
        private_ip: Option<String>,
    }

    impl FakeResource {
        fn new(id: &str, name: &str) -> Self {
            Self {
                id: id.to_string(),
                name: name.to_string(),
                raw: Value::Null,
                private_ip: None,
            }
        }

        fn with_private_ip(mut self, ip: &str) -> Self {
            self.private_ip = Some(ip.to_string());
            self
        }
    }

    impl Resource for FakeResource {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn raw(&self) -> &Value {
            &self.raw
        }

        fn template_var(&self, name: &str) -> Option<String> {
            match name {
                "PRIVATE_IP" => self.private_ip.clone(),
                _ => None,
            }
        }
    }

    #[test]
    fn substitutes_identity_variables() {
        let r = FakeResource::new("i-abc123", "web-1");
        let out = expand_variables("ssh ${NAME} # ${ID}", &r).unwrap();
        assert_eq!(out, "ssh web-1 # i-abc123");
    }

    #[test]
    fn unsafe_referenced_value_fails_closed() {
        let r = FakeResource::new("test; rm -rf /", "safe");
        let err = expand_variables("echo ${ID}", &r).unwrap_err();
        assert!(matches!(err, Error::UnsafeValue { var } if var == "ID"));
    }

    #[test]
    fn unsafe_unreferenced_value_is_tolerated() {
        let r = FakeResource::new("test; rm -rf /", "safe");
        let out = expand_variables("echo ${NAME}", &r).unwrap();
        assert_eq!(out, "echo safe");
    }

    #[test]
    fn unknown_variables_stay_literal() {
        let r = FakeResource::new("i-abc", "web");
        let out = expand_variables("echo ${WHATEVER} ${ID}", &r).unwrap();
        assert_eq!(out, "echo ${WHATEVER} i-abc");
    }

    #[test]
    fn optional_variables_resolve_through_the_capability_hook() {
        let r = FakeResource::new("i-abc", "web").with_private_ip("10.0.0.7");
        let out = expand_variables("ssh ec2-user@${PRIVATE_IP}", &r).unwrap();
        assert_eq!(out, "ssh ec2-user@10.0.0.7");

        let bare = FakeResource::new("i-abc", "web");
        let out = expand_variables("ssh ec2-user@${PRIVATE_IP}", &bare).unwrap();
        assert_eq!(out, "ssh ec2-user@${PRIVATE_IP}");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let r = FakeResource::new("i-abc", "web");
        let out = expand_variables("echo ${ID", &r).unwrap();
        assert_eq!(out, "echo ${ID");
    }

    #[test]
    fn every_metacharacter_is_rejected() {
        for c in UNSAFE_CHARS {
            let r = FakeResource::new(&format!("id{}tail", c), "safe");
            assert!(
                expand_variables("echo ${ID}", &r).is_err(),
                "expected {:?} to be rejected",
                c
            );
        }
    }
}
