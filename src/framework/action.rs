//! Action descriptors and confirmation rules
//!
//! Actions are declarative: a name, a keyboard shortcut, a kind (shell
//! command or API operation), and a confirmation level. They are
//! registered once at startup and never mutated per-request.

use super::error::{Error, ErrorKind};

/// What confirmation UX precedes an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmLevel {
    #[default]
    None,
    /// Generic yes/no prompt.
    Simple,
    /// The user must type a token derived from the resource id.
    Dangerous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Invoke a registered executor for this API operation.
    Api { operation: String },
    /// Run a shell command template through `/bin/sh`.
    Exec { command: String, skip_aws_env: bool },
}

#[derive(Debug, Clone)]
pub struct Action {
    pub name: String,
    pub shortcut: char,
    pub kind: ActionKind,
    pub confirm: ConfirmLevel,
}

impl Action {
    pub fn api(name: &str, shortcut: char, operation: &str) -> Self {
        Self {
            name: name.to_string(),
            shortcut,
            kind: ActionKind::Api {
                operation: operation.to_string(),
            },
            confirm: ConfirmLevel::None,
        }
    }

    pub fn exec(name: &str, shortcut: char, command: &str) -> Self {
        Self {
            name: name.to_string(),
            shortcut,
            kind: ActionKind::Exec {
                command: command.to_string(),
                skip_aws_env: false,
            },
            confirm: ConfirmLevel::None,
        }
    }

    pub fn confirm(mut self, level: ConfirmLevel) -> Self {
        self.confirm = level;
        self
    }

    /// Run the command against the ambient environment instead of the
    /// explicitly constructed AWS one (SSO login touches the shared
    /// credential files directly).
    pub fn skip_aws_env(mut self) -> Self {
        if let ActionKind::Exec {
            ref mut skip_aws_env,
            ..
        } = self.kind
        {
            *skip_aws_env = true;
        }
        self
    }

    pub fn operation(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Api { operation } => Some(operation),
            ActionKind::Exec { .. } => None,
        }
    }
}

/// Required input when the empty-token fallback applies.
pub const EMPTY_TOKEN_CONFIRM: &str = "CONFIRM";

/// How much of a long token must be retyped.
pub const CONFIRM_SUFFIX_LEN: usize = 6;

/// Derive the confirmation string for a dangerous action.
///
/// Tokens of six characters or fewer are retyped in full; longer tokens
/// only need their last six characters. An empty token (malformed
/// resource) requires the literal `CONFIRM` so nothing gets confirmed
/// by accident.
pub fn confirm_suffix(token: &str) -> String {
    if token.is_empty() {
        return EMPTY_TOKEN_CONFIRM.to_string();
    }

    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= CONFIRM_SUFFIX_LEN {
        token.to_string()
    } else {
        chars[chars.len() - CONFIRM_SUFFIX_LEN..].iter().collect()
    }
}

/// Exact-match check against the derived confirmation string. Typing
/// the full token where a suffix is expected does not match.
pub fn confirm_matches(token: &str, input: &str) -> bool {
    input == confirm_suffix(token)
}

/// Outcome of executing one action. Produced fresh per invocation.
#[derive(Debug)]
pub struct ActionResult {
    pub ok: bool,
    pub message: String,
    pub error: Option<Error>,
    /// Follow-up signal for the UI: reload the current view.
    pub refresh: bool,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            error: None,
            refresh: true,
        }
    }

    pub fn failure(error: Error) -> Self {
        Self {
            ok: false,
            message: error.to_string(),
            error: Some(error),
            refresh: false,
        }
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_are_retyped_in_full() {
        assert_eq!(confirm_suffix("abc"), "abc");
        assert_eq!(confirm_suffix("abcdef"), "abcdef");
    }

    #[test]
    fn long_tokens_need_only_the_last_six() {
        assert_eq!(confirm_suffix("i-1234567890abcdef0"), "bcdef0");
        assert_eq!(
            confirm_suffix("arn:aws:sqs:us-east-1:123456789012:jobs"),
            "2:jobs"
        );
    }

    #[test]
    fn empty_token_requires_the_literal() {
        assert_eq!(confirm_suffix(""), "CONFIRM");
        assert!(confirm_matches("", "CONFIRM"));
        assert!(!confirm_matches("", ""));
    }

    #[test]
    fn full_token_is_rejected_when_suffix_expected() {
        let token = "i-1234567890abcdef0";
        assert!(confirm_matches(token, "bcdef0"));
        assert!(!confirm_matches(token, token));
    }

    #[test]
    fn suffix_counts_characters_not_bytes() {
        assert_eq!(confirm_suffix("héllo-wörld"), "-wörld");
    }

    #[test]
    fn builders_set_kind_and_confirm() {
        let stop = Action::api("Stop", 's', "StopInstances").confirm(ConfirmLevel::Simple);
        assert_eq!(stop.operation(), Some("StopInstances"));
        assert_eq!(stop.confirm, ConfirmLevel::Simple);

        let login = Action::exec("SSO Login", 'l', "aws sso login").skip_aws_env();
        assert!(matches!(
            login.kind,
            ActionKind::Exec { skip_aws_env: true, .. }
        ));
        assert_eq!(login.operation(), None);
    }
}
