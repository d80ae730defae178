//! Translation of host rules into npm and yarn registry configuration.
//!
//! npm reads per-registry credentials from nerf-darted `.npmrc` keys, while
//! yarn berry reads them from the `npmRegistries` map in `.yarnrc.yml`. Both
//! fragments are generated from the same deduplicated set of host rules.

use crate::auth::{encode_password, RegistryAuth, RegistryUri};
use crate::datasource::NPM;
use crate::error::{Error, Result};
use crate::host_rules::{HostRule, HostRules};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

const NPM_REGISTRIES_KEY: &str = "npmRegistries";

/// The `npmRegistries` fragment of a `.yarnrc.yml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YarnRcYml {
    /// Registry auth keyed by registry URL.
    pub npm_registries: BTreeMap<String, RegistryAuth>,
}

impl YarnRcYml {
    /// Render the fragment as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn insert(&mut self, uri: &RegistryUri, auth: RegistryAuth) {
        for key in uri.yarn_keys() {
            self.npm_registries.insert(key.to_string(), auth.clone());
        }
    }
}

/// Config fragments generated from host rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostRulesResult {
    /// Lines to append to `.npmrc`.
    pub additional_npmrc_content: Vec<String>,
    /// Registry auth to merge into `.yarnrc.yml`, `None` when there is none.
    pub additional_yarn_rc_yml: Option<YarnRcYml>,
}

impl HostRulesResult {
    /// The additional `.npmrc` lines joined into file content.
    pub fn npmrc_content(&self) -> String {
        self.additional_npmrc_content.join("\n")
    }
}

/// Translate npm-relevant host rules into `.npmrc` lines and yarn registry auth.
///
/// Rules typed `npm` and untyped rules are considered. Rules without a
/// resolved host are skipped. When several rules resolve to the same host,
/// the first `npm`-typed rule wins over untyped ones; otherwise the first
/// registered rule wins.
///
/// For each rule a token produces one `_authToken` line (or `_auth` when the
/// auth type is `Basic`), and a username/password pair produces a `username`
/// line followed by a base64 `_password` line.
///
/// # Examples
///
/// ```
/// use npm_hostrules::{process_host_rules, HostRule, HostRules};
///
/// let mut rules = HostRules::new();
/// rules.add(HostRule {
///     host_type: Some("npm".to_string()),
///     match_host: Some("registry.company.com".to_string()),
///     token: Some("abc".to_string()),
///     ..Default::default()
/// });
///
/// let res = process_host_rules(&rules);
/// assert_eq!(
///     res.additional_npmrc_content,
///     vec!["//registry.company.com/:_authToken=abc"]
/// );
/// ```
pub fn process_host_rules(host_rules: &HostRules) -> HostRulesResult {
    let npm_host_rules = host_rules.find_all(NPM);
    debug!("Found {} npm host rule(s)", npm_host_rules.len());

    let mut additional_npmrc_content = Vec::new();
    let mut yarn = YarnRcYml::default();

    for rule in dedupe_by_host(npm_host_rules) {
        let Some(match_host) = non_empty(&rule.match_host) else {
            debug!("Skipping host rule without matchHost");
            continue;
        };
        let uri = RegistryUri::from_match_host(match_host);

        if let Some(token) = non_empty(&rule.token) {
            let basic = rule.auth_type.as_deref() == Some("Basic");
            let key = if basic { "_auth" } else { "_authToken" };
            debug!("Adding npmrc entry for {} with key {}", uri.cleaned, key);
            additional_npmrc_content.push(uri.npmrc_line(key, token));

            let auth = if basic {
                RegistryAuth::Ident(token.to_string())
            } else {
                RegistryAuth::Token(token.to_string())
            };
            yarn.insert(&uri, auth);
            continue;
        }

        if let (Some(username), Some(password)) =
            (non_empty(&rule.username), non_empty(&rule.password))
        {
            debug!("Adding npmrc entry for {} with username/password", uri.cleaned);
            additional_npmrc_content.push(uri.npmrc_line("username", username));
            let encoded = encode_password(password);
            additional_npmrc_content.push(uri.npmrc_line("_password", &encoded));
            yarn.insert(&uri, RegistryAuth::Ident(format!("{}:{}", username, password)));
            continue;
        }

        trace!("Host rule for {} has no usable credentials", uri.cleaned);
    }

    let additional_yarn_rc_yml = if yarn.npm_registries.is_empty() {
        None
    } else {
        Some(yarn)
    };

    HostRulesResult {
        additional_npmrc_content,
        additional_yarn_rc_yml,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Keep one rule per resolved host, preferring `npm`-typed rules.
///
/// A host keeps the output position of its first rule.
fn dedupe_by_host<'a>(rules: Vec<&'a HostRule>) -> Vec<&'a HostRule> {
    let mut result: Vec<&HostRule> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for rule in rules {
        let Some(host) = non_empty(&rule.resolved_host) else {
            debug!("Skipping host rule without resolved host");
            continue;
        };

        match index.get(host).copied() {
            None => {
                index.insert(host, result.len());
                result.push(rule);
            }
            Some(idx) => {
                if rule.is_host_type(NPM) && !result[idx].is_host_type(NPM) {
                    trace!("Preferring npm host rule for {}", host);
                    result[idx] = rule;
                }
            }
        }
    }

    result
}

/// Append additional lines to existing `.npmrc` content.
///
/// Later lines win in npm's ini parsing, so generated credentials override
/// existing ones for the same key.
///
/// # Examples
///
/// ```
/// use npm_hostrules::merge_npmrc_content;
///
/// let lines = vec!["//r.com/:_authToken=abc".to_string()];
/// assert_eq!(
///     merge_npmrc_content(Some("save-exact=true"), &lines),
///     "save-exact=true\n//r.com/:_authToken=abc"
/// );
/// assert_eq!(merge_npmrc_content(None, &lines), "//r.com/:_authToken=abc");
/// ```
pub fn merge_npmrc_content(existing: Option<&str>, additional: &[String]) -> String {
    let mut lines: Vec<&str> = Vec::with_capacity(additional.len() + 1);
    if let Some(content) = existing.filter(|c| !c.is_empty()) {
        lines.push(content);
    }
    lines.extend(additional.iter().map(String::as_str));
    lines.join("\n")
}

/// Merge registry auth into existing `.yarnrc.yml` content.
///
/// Keys outside `npmRegistries` are kept untouched. Existing registry entries
/// keep their other settings; the auth field is overwritten.
pub fn merge_yarnrc_yml(existing: Option<&str>, additional: &YarnRcYml) -> Result<String> {
    let mut root: Value = match existing {
        Some(content) if !content.trim().is_empty() => serde_yaml::from_str(content)?,
        _ => Value::Null,
    };
    if root.is_null() {
        root = Value::Mapping(Mapping::new());
    }

    let root_map = root.as_mapping_mut().ok_or_else(|| Error::InvalidYarnrc {
        message: "top level is not a mapping".to_string(),
    })?;
    if root_map.get(NPM_REGISTRIES_KEY).map_or(true, Value::is_null) {
        root_map.insert(NPM_REGISTRIES_KEY.into(), Value::Mapping(Mapping::new()));
    }
    let registries = root_map
        .get_mut(NPM_REGISTRIES_KEY)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| Error::InvalidYarnrc {
            message: format!("{} is not a mapping", NPM_REGISTRIES_KEY),
        })?;

    for (registry, auth) in &additional.npm_registries {
        let key = Value::String(registry.clone());
        match registries.get_mut(&key).and_then(Value::as_mapping_mut) {
            Some(entry) => {
                entry.insert(auth.yarn_key().into(), auth.secret().into());
            }
            None => {
                registries.insert(key, serde_yaml::to_value(auth)?);
            }
        }
    }

    Ok(serde_yaml::to_string(&root)?)
}
