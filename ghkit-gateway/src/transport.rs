//! Transports: how a [`QueryDescriptor`] reaches the GraphQL endpoint.
//!
//! Both implementations return the raw response body; envelope checks and
//! typed parsing live in [`crate::client`].

use std::process::Command;
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::query::QueryDescriptor;

pub trait Transport {
    fn execute(&self, query: &QueryDescriptor) -> Result<Value, GatewayError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, query: &QueryDescriptor) -> Result<Value, GatewayError> {
        (**self).execute(query)
    }
}

// ---------------------------------------------------------------------------
// gh CLI
// ---------------------------------------------------------------------------

/// Runs `gh api graphql`; authentication is whatever `gh auth` holds.
#[derive(Debug, Clone)]
pub struct GhCliTransport {
    program: String,
}

impl Default for GhCliTransport {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }
}

impl GhCliTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable (a wrapper script, a pinned path).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `api graphql -f query=… [-F name=value | -f name=value]…`
    ///
    /// Strings go through `-f` so they are never type-coerced; numbers and
    /// booleans go through `-F`. Null variables are omitted.
    pub fn args(query: &QueryDescriptor) -> Vec<String> {
        let mut args = vec![
            "api".to_string(),
            "graphql".to_string(),
            "-f".to_string(),
            format!("query={}", query.query),
        ];
        for (name, value) in &query.variables {
            match value {
                Value::Null => continue,
                Value::String(s) => {
                    args.push("-f".to_string());
                    args.push(format!("{name}={s}"));
                }
                other => {
                    args.push("-F".to_string());
                    args.push(format!("{name}={other}"));
                }
            }
        }
        args
    }
}

impl Transport for GhCliTransport {
    fn execute(&self, query: &QueryDescriptor) -> Result<Value, GatewayError> {
        tracing::debug!("{} via {}", query.operation, self.program);
        let output = Command::new(&self.program)
            .args(Self::args(query))
            .output()
            .map_err(|source| GatewayError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // `gh` exits non-zero on GraphQL errors but still prints the payload;
        // hand that back so the envelope check can classify it.
        if let Ok(body) = serde_json::from_slice::<Value>(&output.stdout) {
            if output.status.success() || body.get("errors").is_some() {
                return Ok(body);
            }
        }

        if output.status.success() {
            return Err(GatewayError::UnexpectedShape(format!(
                "`{}` printed non-JSON output for {}",
                self.program, query.operation
            )));
        }

        Err(GatewayError::Command {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// HTTPS
// ---------------------------------------------------------------------------

/// POSTs `{query, variables}` to the GraphQL endpoint with a bearer token.
pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("ghkit/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Token from `GH_TOKEN`, falling back to `GITHUB_TOKEN`.
    pub fn from_env(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let token = ["GH_TOKEN", "GITHUB_TOKEN"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|v| !v.trim().is_empty())
            .ok_or(GatewayError::MissingToken)?;
        Ok(Self::new(endpoint, token, timeout))
    }
}

impl Transport for HttpTransport {
    fn execute(&self, query: &QueryDescriptor) -> Result<Value, GatewayError> {
        tracing::debug!("{} via {}", query.operation, self.endpoint);
        let body = json!({
            "query": query.query,
            "variables": query.variables,
        });
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body);

        match response {
            Ok(resp) => resp
                .into_json::<Value>()
                .map_err(|e| GatewayError::Transport(e.to_string())),
            Err(ureq::Error::Status(status, resp)) => Err(GatewayError::Http {
                status,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(t)) => Err(GatewayError::Transport(t.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Cursor, PageRequest};
    use ghkit_core::{Owner, OwnerKind, ProjectNumber};

    #[test]
    fn gh_args_split_typed_and_raw_variables() {
        let owner = Owner::new("acme", OwnerKind::Organization);
        let page = PageRequest::after(100, Some(Cursor::from("abc")));
        let q = QueryDescriptor::project_items(&owner, ProjectNumber(7), &page);
        let args = GhCliTransport::args(&q);

        assert_eq!(&args[..3], &["api", "graphql", "-f"]);
        assert!(args[3].starts_with("query=query("));
        let pairs: Vec<(String, String)> = args[4..]
            .chunks(2)
            .map(|c| (c[0].clone(), c[1].clone()))
            .collect();
        assert!(pairs.contains(&("-f".into(), "login=acme".into())));
        assert!(pairs.contains(&("-F".into(), "number=7".into())));
        assert!(pairs.contains(&("-F".into(), "first=100".into())));
        assert!(pairs.contains(&("-f".into(), "after=abc".into())));
    }

    #[test]
    fn missing_gh_binary_is_spawn_error() {
        let transport = GhCliTransport::with_program("ghkit-definitely-not-installed");
        let err = transport
            .execute(&QueryDescriptor::resolve_owner("acme"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Spawn { .. }), "got {err:?}");
    }
}
