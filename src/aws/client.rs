//! AWS client
//!
//! Thin handle combining the resolved session (credentials, region,
//! profile) with the signed HTTP transport. DAOs and executors hold an
//! `Arc<AwsClient>` and go through these helpers.

use super::auth::AwsAuth;
use super::http::AwsHttpClient;
use crate::framework::error::{Error, ErrorKind, Result};
use serde_json::Value;

#[derive(Clone)]
pub struct AwsClient {
    pub auth: AwsAuth,
    pub http: AwsHttpClient,
}

impl AwsClient {
    pub fn new(auth: AwsAuth, http: AwsHttpClient) -> Self {
        Self { auth, http }
    }

    /// Resolve credentials and build the transport for a session.
    pub fn connect(profile: Option<&str>, region: Option<&str>) -> anyhow::Result<Self> {
        let auth = AwsAuth::resolve(profile, region)?;
        let http = AwsHttpClient::new()?;
        Ok(Self { auth, http })
    }

    pub fn region(&self) -> &str {
        &self.auth.region
    }

    pub fn profile(&self) -> Option<&str> {
        self.auth.profile.as_deref()
    }

    /// Query-protocol call (EC2, CloudFormation).
    pub async fn query(
        &self,
        service: &str,
        action: &str,
        version: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        self.http
            .query_request(&self.auth, service, action, version, params)
            .await
    }

    /// JSON-protocol call (SQS, Compute Optimizer).
    pub async fn json(&self, service: &str, target: &str, body: &Value) -> Result<Value> {
        self.http
            .json_request(&self.auth, service, target, body)
            .await
    }

    /// REST-XML call (S3).
    pub async fn rest(
        &self,
        service: &str,
        operation: &str,
        method: &str,
        path: &str,
    ) -> Result<Value> {
        self.http
            .rest_request(&self.auth, service, operation, method, path)
            .await
    }

    /// Environment for exec-action subprocesses.
    pub fn command_env(&self) -> Vec<(String, String)> {
        self.auth.command_env()
    }
}

/// Format a framework error for display, with a kind-specific hint.
pub fn format_aws_error(error: &Error) -> String {
    match error.kind() {
        ErrorKind::Auth => {
            "Access denied. Check your AWS credentials and IAM permissions.".to_string()
        }
        ErrorKind::Throttling => "Rate limited by AWS. Please try again shortly.".to_string(),
        ErrorKind::ReadOnly => {
            "Blocked by read-only mode. Restart without --readonly to make changes.".to_string()
        }
        ErrorKind::ResourceInUse => {
            format!("{}. Delete or detach its dependents first.", error)
        }
        ErrorKind::NotFound
        | ErrorKind::Unsupported
        | ErrorKind::UnsafeInput
        | ErrorKind::Misconfigured => error.to_string(),
        ErrorKind::Other => {
            // Keep unclassified API noise short and printable.
            let message: String = error
                .to_string()
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect();
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_errors_get_a_specific_hint() {
        let message = format_aws_error(&Error::ReadOnlyDenied);
        assert!(message.contains("read-only"));
    }

    #[test]
    fn in_use_errors_explain_why_delete_failed() {
        let message = format_aws_error(&Error::ResourceInUse("bucket logs".into()));
        assert!(message.contains("dependents"));
    }

    #[test]
    fn other_errors_are_truncated_and_printable() {
        let noisy = Error::Api {
            operation: "DescribeInstances".into(),
            message: format!("{}\u{7}", "y".repeat(300)),
        };
        let message = format_aws_error(&noisy);
        assert!(message.len() <= 120);
        assert!(message.chars().all(|c| c.is_ascii_graphic() || c == ' '));
    }
}
