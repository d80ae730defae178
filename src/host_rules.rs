//! Host credential rules and the registry that holds them.
//!
//! A host rule scopes authentication material (token, username/password) to a
//! host or URL and optionally to a host type such as `npm`. Rules are kept in
//! registration order, which matters when several rules target the same host.

use crate::datasource::is_env_host_type;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Environment variable prefixes set by npm itself, never host rules.
const NPM_ENV_PREFIXES: &[&str] = &["npm_config_", "npm_lifecycle_", "npm_package_"];

/// A credential rule for a matched host.
///
/// # Security Notes
///
/// The `Debug` implementation redacts the token and password.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    /// Host type the rule is restricted to (e.g. `npm`). Untyped rules apply
    /// to every host type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    /// Bare host (`registry.company.com`) or full URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Bearer token, or a basic auth string when `auth_type` is `Basic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Hostname derived from `match_host` when the rule is registered.
    #[serde(skip)]
    pub resolved_host: Option<String>,
}

impl fmt::Debug for HostRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("HostRule")
            .field("host_type", &self.host_type)
            .field("match_host", &self.match_host)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .field("auth_type", &self.auth_type)
            .field("resolved_host", &self.resolved_host)
            .finish()
    }
}

impl HostRule {
    /// Check whether the rule is typed with `host_type`.
    pub fn is_host_type(&self, host_type: &str) -> bool {
        self.host_type.as_deref() == Some(host_type)
    }

    /// Check whether the rule applies to `host_type` (typed with it, or untyped).
    pub fn applies_to(&self, host_type: &str) -> bool {
        self.host_type.is_none() || self.is_host_type(host_type)
    }

    fn set_secret(&mut self, field: &str, value: String) {
        match field {
            "token" => self.token = Some(value),
            "username" => self.username = Some(value),
            "password" => self.password = Some(value),
            _ => {}
        }
    }
}

/// Prefix a scheme-less host with a path (`host/path`) with `https://`.
///
/// # Examples
///
/// ```
/// use npm_hostrules::massage_host_url;
///
/// assert_eq!(massage_host_url("example.com/npm"), "https://example.com/npm");
/// assert_eq!(massage_host_url("example.com"), "example.com");
/// assert_eq!(massage_host_url("http://example.com/npm"), "http://example.com/npm");
/// ```
pub fn massage_host_url(match_host: &str) -> String {
    if !match_host.contains("://") && match_host.contains('/') {
        format!("https://{}", match_host)
    } else {
        match_host.to_string()
    }
}

/// Resolve the hostname a `match_host` value targets.
///
/// URLs resolve to their hostname; anything that does not parse as a URL with
/// a host is used as-is.
///
/// # Examples
///
/// ```
/// use npm_hostrules::resolve_host;
///
/// assert_eq!(resolve_host("https://registry.npmjs.org"), "registry.npmjs.org");
/// assert_eq!(resolve_host("registry.company.com"), "registry.company.com");
/// ```
pub fn resolve_host(match_host: &str) -> String {
    match Url::parse(match_host) {
        Ok(url) => match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => match_host.to_string(),
        },
        Err(_) => match_host.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HostRulesInput {
    List(Vec<HostRule>),
    Config {
        #[serde(default, rename = "hostRules")]
        host_rules: Vec<HostRule>,
    },
}

/// An ordered collection of host credential rules.
///
/// # Examples
///
/// ```
/// use npm_hostrules::{HostRule, HostRules};
///
/// let mut rules = HostRules::new();
/// rules.add(HostRule {
///     host_type: Some("npm".to_string()),
///     match_host: Some("https://registry.company.com/npm".to_string()),
///     token: Some("abc".to_string()),
///     ..Default::default()
/// });
///
/// let npm_rules = rules.find_all("npm");
/// assert_eq!(npm_rules.len(), 1);
/// assert_eq!(npm_rules[0].resolved_host.as_deref(), Some("registry.company.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostRules {
    rules: Vec<HostRule>,
}

impl HostRules {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, computing its resolved host.
    pub fn add(&mut self, mut rule: HostRule) {
        rule.resolved_host = None;
        if let Some(match_host) = rule.match_host.take().filter(|h| !h.is_empty()) {
            let massaged = massage_host_url(&match_host);
            rule.resolved_host = Some(resolve_host(&massaged));
            rule.match_host = Some(massaged);
        }
        self.rules.push(rule);
    }

    /// Remove every rule.
    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HostRule> {
        self.rules.iter()
    }

    /// Get every rule applying to `host_type`, in registration order.
    ///
    /// Untyped rules are included.
    pub fn find_all(&self, host_type: &str) -> Vec<&HostRule> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(host_type))
            .collect()
    }

    /// Parse host rules from JSON.
    ///
    /// Accepts either a bare array of rules or a config object with a
    /// `hostRules` array.
    pub fn from_json(content: &str) -> Result<Self> {
        let input: HostRulesInput = serde_json::from_str(content)?;
        let parsed = match input {
            HostRulesInput::List(rules) => rules,
            HostRulesInput::Config { host_rules } => host_rules,
        };
        debug!("Parsed {} host rule(s) from JSON", parsed.len());
        Ok(parsed.into_iter().collect())
    }

    /// Load host rules from a JSON file.
    ///
    /// Returns `Err(Error::FileNotFound)` if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&content)
    }

    /// Derive host rules from environment variables.
    ///
    /// Variable names have the form `{HOSTTYPE}_{HOST_PARTS}_{FIELD}`, where
    /// `FIELD` is `TOKEN`, `USERNAME` or `PASSWORD`, host parts are joined with
    /// `.` and a double underscore stands for `-`. For example
    /// `NPM_REGISTRY_COMPANY_COM_TOKEN` yields an `npm` rule for
    /// `registry.company.com`. Variables for the same host type and host are
    /// merged into one rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use npm_hostrules::HostRules;
    ///
    /// let rules = HostRules::from_env([
    ///     ("NPM_REGISTRY_COMPANY_COM_USERNAME".to_string(), "bot".to_string()),
    ///     ("NPM_REGISTRY_COMPANY_COM_PASSWORD".to_string(), "secret".to_string()),
    ///     ("HOME".to_string(), "/root".to_string()),
    /// ]);
    /// assert_eq!(rules.len(), 1);
    /// ```
    pub fn from_env<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: Vec<(String, String)> = vars.into_iter().collect();
        vars.sort();

        let mut rules: Vec<HostRule> = Vec::new();
        for (name, value) in vars {
            if NPM_ENV_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
                continue;
            }

            let normalized = name.to_lowercase().replace("__", "-");
            let mut parts: Vec<&str> = normalized.split('_').collect();
            if parts.len() < 2 {
                continue;
            }
            let host_type = parts.remove(0);
            if !is_env_host_type(host_type) {
                continue;
            }
            let Some(field) = parts.pop() else {
                continue;
            };
            if !matches!(field, "token" | "username" | "password") {
                continue;
            }

            let match_host = match parts.len() {
                0 => None,
                1 => {
                    warn!(env = %name, "Cannot parse host rule from environment variable");
                    continue;
                }
                _ => Some(parts.join(".")),
            };

            let existing = rules.iter_mut().find(|rule| {
                rule.is_host_type(host_type) && rule.match_host == match_host
            });
            match existing {
                Some(rule) => rule.set_secret(field, value),
                None => {
                    let mut rule = HostRule {
                        host_type: Some(host_type.to_string()),
                        match_host,
                        ..Default::default()
                    };
                    rule.set_secret(field, value);
                    rules.push(rule);
                }
            }
        }

        debug!("Derived {} host rule(s) from environment", rules.len());
        rules.into_iter().collect()
    }

    /// Derive host rules from the current process environment.
    pub fn from_process_env() -> Self {
        Self::from_env(std::env::vars())
    }
}

impl FromIterator<HostRule> for HostRules {
    fn from_iter<T: IntoIterator<Item = HostRule>>(iter: T) -> Self {
        let mut rules = HostRules::new();
        rules.extend(iter);
        rules
    }
}

impl Extend<HostRule> for HostRules {
    fn extend<T: IntoIterator<Item = HostRule>>(&mut self, iter: T) {
        for rule in iter {
            self.add(rule);
        }
    }
}
