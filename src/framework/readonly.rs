//! Read-only mode allowlists
//!
//! When the process-wide read-only flag is set, only the actions named
//! here may be dispatched; everything else is denied before it reaches
//! an executor or a shell. The lists are deliberately a single,
//! reviewable artifact: an operation missing here is blocked, full
//! stop.

use super::action::{Action, ActionKind};

/// API operations that never mutate AWS state.
pub const READ_ONLY_API_ALLOWLIST: &[&str] = &["GetQueueAttributes"];

/// Exec actions (by display name) that are safe under read-only mode.
pub const READ_ONLY_EXEC_ALLOWLIST: &[&str] = &["SSO Login", "Open Console"];

pub fn is_allowed_in_read_only(action: &Action) -> bool {
    match &action.kind {
        ActionKind::Api { operation } => READ_ONLY_API_ALLOWLIST.contains(&operation.as_str()),
        ActionKind::Exec { .. } => READ_ONLY_EXEC_ALLOWLIST.contains(&action.name.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_actions_gate_on_operation_name() {
        let allowed = Action::api("Attributes", 'a', "GetQueueAttributes");
        let blocked = Action::api("Purge", 'P', "PurgeQueue");
        assert!(is_allowed_in_read_only(&allowed));
        assert!(!is_allowed_in_read_only(&blocked));
    }

    #[test]
    fn exec_actions_gate_on_display_name() {
        let allowed = Action::exec("Open Console", 'o', "xdg-open 'https://example'");
        let blocked = Action::exec("Shell", 's', "aws ssm start-session --target ${ID}");
        assert!(is_allowed_in_read_only(&allowed));
        assert!(!is_allowed_in_read_only(&blocked));
    }
}
