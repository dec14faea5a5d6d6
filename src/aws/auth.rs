//! AWS credential resolution
//!
//! Resolves credentials and region from the environment first, then the
//! shared `~/.aws/credentials` / `~/.aws/config` profile files. No SSO
//! token refresh or role assumption: the resolved static credentials
//! are what the session signs with, and what exec-action subprocesses
//! receive through an explicitly constructed environment.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Resolved session: which profile/region we browse and sign as.
#[derive(Debug, Clone)]
pub struct AwsAuth {
    pub profile: Option<String>,
    pub region: String,
    pub credentials: Credentials,
}

impl AwsAuth {
    /// Resolve credentials and region for a session.
    ///
    /// Precedence: explicit flags, then environment, then the shared
    /// AWS files, then the default region.
    pub fn resolve(profile: Option<&str>, region: Option<&str>) -> Result<Self> {
        let profile = profile
            .map(str::to_string)
            .or_else(|| std::env::var("AWS_PROFILE").ok());
        let profile_name = profile.as_deref().unwrap_or("default");

        let credentials = match env_credentials() {
            Some(creds) => creds,
            None => file_credentials(profile_name)?,
        };

        let region = region
            .map(str::to_string)
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .or_else(|| file_region(profile_name))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            profile,
            region,
            credentials,
        })
    }

    /// Environment for exec-action subprocesses. Built explicitly from
    /// the resolved session rather than inherited, so a command always
    /// targets the profile and region the UI is showing.
    pub fn command_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("AWS_REGION".to_string(), self.region.clone()),
            ("AWS_DEFAULT_REGION".to_string(), self.region.clone()),
            (
                "AWS_ACCESS_KEY_ID".to_string(),
                self.credentials.access_key_id.clone(),
            ),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                self.credentials.secret_access_key.clone(),
            ),
        ];

        if let Some(token) = &self.credentials.session_token {
            env.push(("AWS_SESSION_TOKEN".to_string(), token.clone()));
        }
        if let Some(profile) = &self.profile {
            env.push(("AWS_PROFILE".to_string(), profile.clone()));
        }

        env
    }
}

fn env_credentials() -> Option<Credentials> {
    let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
    let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
    Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
    })
}

fn aws_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aws"))
}

fn file_credentials(profile: &str) -> Result<Credentials> {
    let path = aws_dir()
        .map(|dir| dir.join("credentials"))
        .context("Could not determine home directory")?;

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("No credentials in the environment and {:?} is unreadable", path))?;

    let sections = parse_ini(&content);
    let section = sections
        .get(profile)
        .with_context(|| format!("Profile '{}' not found in {:?}", profile, path))?;

    let access_key_id = section
        .get("aws_access_key_id")
        .cloned()
        .with_context(|| format!("Profile '{}' has no aws_access_key_id", profile))?;
    let secret_access_key = section
        .get("aws_secret_access_key")
        .cloned()
        .with_context(|| format!("Profile '{}' has no aws_secret_access_key", profile))?;

    Ok(Credentials {
        access_key_id,
        secret_access_key,
        session_token: section.get("aws_session_token").cloned(),
    })
}

fn file_region(profile: &str) -> Option<String> {
    let path = aws_dir()?.join("config");
    let content = std::fs::read_to_string(path).ok()?;
    let sections = parse_ini(&content);

    // The config file prefixes non-default sections with "profile ".
    let section_name = if profile == "default" {
        profile.to_string()
    } else {
        format!("profile {}", profile)
    };

    sections
        .get(&section_name)
        .or_else(|| sections.get(profile))
        .and_then(|section| section.get("region").cloned())
}

/// Minimal INI parse: `[section]` headers, `key = value` lines,
/// `#`/`;` comments. Enough for the shared AWS files.
fn parse_ini(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        if let (Some(section), Some(eq)) = (&current, line.find('=')) {
            let key = line[..eq].trim().to_lowercase();
            let value = line[eq + 1..].trim().to_string();
            if let Some(map) = sections.get_mut(section) {
                map.insert(key, value);
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini_parses_profiles_and_comments() {
        let content = "\
# shared credentials
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = secret1

[staging]
aws_access_key_id=AKIASTAGING
aws_secret_access_key = secret2
aws_session_token = tok
";
        let sections = parse_ini(content);
        assert_eq!(
            sections["default"]["aws_access_key_id"],
            "AKIADEFAULT"
        );
        assert_eq!(sections["staging"]["aws_session_token"], "tok");
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn command_env_is_explicit_and_complete() {
        let auth = AwsAuth {
            profile: Some("staging".into()),
            region: "eu-west-1".into(),
            credentials: Credentials {
                access_key_id: "AKIA".into(),
                secret_access_key: "secret".into(),
                session_token: Some("tok".into()),
            },
        };

        let env: HashMap<String, String> = auth.command_env().into_iter().collect();
        assert_eq!(env["AWS_REGION"], "eu-west-1");
        assert_eq!(env["AWS_PROFILE"], "staging");
        assert_eq!(env["AWS_SESSION_TOKEN"], "tok");
        assert_eq!(env["AWS_ACCESS_KEY_ID"], "AKIA");
    }

    #[test]
    fn command_env_omits_absent_token_and_profile() {
        let auth = AwsAuth {
            profile: None,
            region: "us-east-1".into(),
            credentials: Credentials {
                access_key_id: "AKIA".into(),
                secret_access_key: "secret".into(),
                session_token: None,
            },
        };

        let keys: Vec<String> = auth.command_env().into_iter().map(|(k, _)| k).collect();
        assert!(!keys.contains(&"AWS_SESSION_TOKEN".to_string()));
        assert!(!keys.contains(&"AWS_PROFILE".to_string()));
    }
}
