//! The renovate config presets pseudo-manager.
//!
//! Renovate config files can extend shared presets hosted in git repositories
//! (`github>owner/repo#v1.2.3`). This manager finds those references so that
//! tagged presets can be updated like any other dependency.

use crate::datasource::{GITEA_TAGS, GITHUB_TAGS, GITLAB_TAGS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Documentation page for this manager.
pub const URL: &str = "../../../config-presets.md";

/// File names renovate reads its configuration from.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "renovate.json",
    "renovate.json5",
    ".github/renovate.json",
    ".github/renovate.json5",
    ".gitlab/renovate.json",
    ".gitlab/renovate.json5",
    ".renovaterc",
    ".renovaterc.json",
    ".renovaterc.json5",
    "package.json",
];

/// Datasources able to look up preset versions.
pub const SUPPORTED_DATASOURCES: &[&str] = &[GITHUB_TAGS, GITLAB_TAGS, GITEA_TAGS];

/// Groups of presets built into renovate, referenced as `group:name`.
const INTERNAL_PRESET_GROUPS: &[&str] = &[
    "abandonments",
    "config",
    "customManagers",
    "default",
    "docker",
    "global",
    "group",
    "helpers",
    "mergeConfidence",
    "monorepo",
    "npm",
    "packages",
    "preview",
    "regexManagers",
    "replacements",
    "schedule",
    "security",
    "workarounds",
];

/// `source>body`, e.g. `github>owner/repo:preset`.
static SOURCE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<source>github|gitlab|gitea|local|npm)>(?P<body>.+)$").unwrap()
});

/// `group:name` for internal presets.
static INTERNAL_PRESET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<group>[A-Za-z]+):(?P<name>.+)$").unwrap());

/// Default configuration of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Files the manager extracts dependencies from.
    pub manager_file_patterns: Vec<String>,
}

/// The manager's default config: every config file name except `package.json`.
///
/// # Examples
///
/// ```
/// use npm_hostrules::presets::default_config;
///
/// let config = default_config();
/// assert!(config.manager_file_patterns.contains(&"renovate.json".to_string()));
/// assert!(!config.manager_file_patterns.contains(&"package.json".to_string()));
/// ```
pub fn default_config() -> ManagerConfig {
    ManagerConfig {
        manager_file_patterns: CONFIG_FILE_NAMES
            .iter()
            .filter(|name| **name != "package.json")
            .map(|name| name.to_string())
            .collect(),
    }
}

/// Where a preset is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSource {
    Github,
    Gitlab,
    Gitea,
    Local,
    Npm,
    Http,
    /// Built into renovate.
    Internal,
}

impl PresetSource {
    /// The tags datasource able to version presets from this source.
    pub fn datasource(self) -> Option<&'static str> {
        match self {
            PresetSource::Github => Some(GITHUB_TAGS),
            PresetSource::Gitlab => Some(GITLAB_TAGS),
            PresetSource::Gitea => Some(GITEA_TAGS),
            _ => None,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "github" => Some(PresetSource::Github),
            "gitlab" => Some(PresetSource::Gitlab),
            "gitea" => Some(PresetSource::Gitea),
            "local" => Some(PresetSource::Local),
            "npm" => Some(PresetSource::Npm),
            _ => None,
        }
    }
}

impl fmt::Display for PresetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetSource::Github => "github",
            PresetSource::Gitlab => "gitlab",
            PresetSource::Gitea => "gitea",
            PresetSource::Local => "local",
            PresetSource::Npm => "npm",
            PresetSource::Http => "http",
            PresetSource::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// A preset reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPreset {
    pub source: PresetSource,
    /// Repository, package name, URL or internal group.
    pub repo: String,
    pub preset_name: String,
    /// Directory of the preset file inside the repository.
    pub preset_path: Option<String>,
    /// Version pinned with `#tag`.
    pub tag: Option<String>,
}

/// Parse a preset reference from an `extends` array.
///
/// # Examples
///
/// ```
/// use npm_hostrules::presets::{parse_preset, PresetSource};
///
/// let preset = parse_preset("github>acme/renovate-config:base#v1.2.0");
/// assert_eq!(preset.source, PresetSource::Github);
/// assert_eq!(preset.repo, "acme/renovate-config");
/// assert_eq!(preset.preset_name, "base");
/// assert_eq!(preset.tag.as_deref(), Some("v1.2.0"));
///
/// assert_eq!(parse_preset("config:recommended").source, PresetSource::Internal);
/// ```
pub fn parse_preset(input: &str) -> ParsedPreset {
    let (reference, tag) = match input.split_once('#') {
        Some((reference, tag)) if !tag.is_empty() => (reference, Some(tag.to_string())),
        Some((reference, _)) => (reference, None),
        None => (input, None),
    };

    if let Some(name) = reference.strip_prefix(':') {
        return internal_preset("default", name, tag);
    }

    if let Some(caps) = INTERNAL_PRESET.captures(reference) {
        let group = &caps["group"];
        if INTERNAL_PRESET_GROUPS.contains(&group) {
            return internal_preset(group, &caps["name"], tag);
        }
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return ParsedPreset {
            source: PresetSource::Http,
            repo: reference.to_string(),
            preset_name: String::new(),
            preset_path: None,
            tag,
        };
    }

    if let Some(caps) = SOURCE_PREFIX.captures(reference) {
        // the regex only admits known prefixes
        let source = PresetSource::from_prefix(&caps["source"]).unwrap_or(PresetSource::Npm);
        let body = &caps["body"];
        if source == PresetSource::Npm {
            return npm_preset(body, tag);
        }
        return repository_preset(source, body, tag);
    }

    npm_preset(reference, tag)
}

fn internal_preset(group: &str, name: &str, tag: Option<String>) -> ParsedPreset {
    ParsedPreset {
        source: PresetSource::Internal,
        repo: group.to_string(),
        preset_name: name.to_string(),
        preset_path: None,
        tag,
    }
}

fn repository_preset(source: PresetSource, body: &str, tag: Option<String>) -> ParsedPreset {
    if let Some((repo, file)) = body.split_once("//") {
        let (preset_path, file_name) = match file.rsplit_once('/') {
            Some((dir, name)) => (Some(dir.to_string()), name),
            None => (None, file),
        };
        let preset_name = file_name
            .strip_suffix(".json5")
            .or_else(|| file_name.strip_suffix(".json"))
            .unwrap_or(file_name);
        return ParsedPreset {
            source,
            repo: repo.to_string(),
            preset_name: preset_name.to_string(),
            preset_path,
            tag,
        };
    }

    let (repo, preset_name) = body.split_once(':').unwrap_or((body, "default"));
    ParsedPreset {
        source,
        repo: repo.to_string(),
        preset_name: preset_name.to_string(),
        preset_path: None,
        tag,
    }
}

fn npm_preset(body: &str, tag: Option<String>) -> ParsedPreset {
    let (package, preset_name) = body.split_once(':').unwrap_or((body, "default"));
    let repo = if let Some(scope) = package.strip_prefix('@') {
        if scope.contains('/') {
            package.to_string()
        } else {
            format!("{}/renovate-config", package)
        }
    } else if package.starts_with("renovate-config-") {
        package.to_string()
    } else {
        format!("renovate-config-{}", package)
    };
    ParsedPreset {
        source: PresetSource::Npm,
        repo,
        preset_name: preset_name.to_string(),
        preset_path: None,
        tag,
    }
}

/// Why a dependency cannot be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    UnsupportedDatasource,
    UnspecifiedVersion,
}

/// A preset reference found in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDependency {
    pub dep_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

/// Dependencies extracted from one config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFileContent {
    pub deps: Vec<PackageDependency>,
}

#[derive(Deserialize)]
struct PresetConfig {
    #[serde(default)]
    extends: Vec<String>,
}

/// Extract preset dependencies from a renovate config file.
///
/// `.json5` files are parsed as JSON5, everything else as JSON.
/// Returns `None` when the content cannot be parsed or references no
/// non-internal presets.
///
/// # Examples
///
/// ```
/// use npm_hostrules::presets::extract_package_file;
///
/// let content = r#"{ "extends": ["config:recommended", "github>acme/presets#1.0.0"] }"#;
/// let res = extract_package_file(content, "renovate.json").unwrap();
/// assert_eq!(res.deps.len(), 1);
/// assert_eq!(res.deps[0].dep_name, "acme/presets");
/// assert_eq!(res.deps[0].current_value.as_deref(), Some("1.0.0"));
/// ```
pub fn extract_package_file(content: &str, package_file: &str) -> Option<PackageFileContent> {
    let parsed = if package_file.ends_with(".json5") {
        json5::from_str::<PresetConfig>(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<PresetConfig>(content).map_err(|e| e.to_string())
    };
    let config = match parsed {
        Ok(config) => config,
        Err(err) => {
            debug!(package_file, error = %err, "Invalid renovate config");
            return None;
        }
    };

    let mut deps = Vec::new();
    for preset in &config.extends {
        let parsed = parse_preset(preset);
        let Some(datasource) = parsed.source.datasource() else {
            if parsed.source != PresetSource::Internal {
                debug!(preset = %preset, source = %parsed.source, "Unsupported preset source");
                deps.push(PackageDependency {
                    dep_name: parsed.repo,
                    datasource: None,
                    current_value: None,
                    skip_reason: Some(SkipReason::UnsupportedDatasource),
                });
            }
            continue;
        };

        let dep = match parsed.tag {
            Some(tag) => PackageDependency {
                dep_name: parsed.repo,
                datasource: Some(datasource.to_string()),
                current_value: Some(tag),
                skip_reason: None,
            },
            None => PackageDependency {
                dep_name: parsed.repo,
                datasource: None,
                current_value: None,
                skip_reason: Some(SkipReason::UnspecifiedVersion),
            },
        };
        deps.push(dep);
    }

    debug!(package_file, "Found {} preset dependencies", deps.len());
    if deps.is_empty() {
        None
    } else {
        Some(PackageFileContent { deps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_internal_presets() {
        let preset = parse_preset(":semanticCommits");
        assert_eq!(preset.source, PresetSource::Internal);
        assert_eq!(preset.repo, "default");
        assert_eq!(preset.preset_name, "semanticCommits");

        let preset = parse_preset("group:monorepos");
        assert_eq!(preset.source, PresetSource::Internal);
        assert_eq!(preset.repo, "group");
    }

    #[test]
    fn test_parse_repository_preset_default_name() {
        let preset = parse_preset("gitlab>group/sub/presets");
        assert_eq!(preset.source, PresetSource::Gitlab);
        assert_eq!(preset.repo, "group/sub/presets");
        assert_eq!(preset.preset_name, "default");
        assert_eq!(preset.tag, None);
    }

    #[test]
    fn test_parse_repository_preset_with_path() {
        let preset = parse_preset("gitea>acme/presets//configs/base.json5#v2");
        assert_eq!(preset.source, PresetSource::Gitea);
        assert_eq!(preset.repo, "acme/presets");
        assert_eq!(preset.preset_path.as_deref(), Some("configs"));
        assert_eq!(preset.preset_name, "base");
        assert_eq!(preset.tag.as_deref(), Some("v2"));
    }

    #[test]
    fn test_parse_npm_presets() {
        assert_eq!(parse_preset("acme").repo, "renovate-config-acme");
        assert_eq!(parse_preset("renovate-config-acme").repo, "renovate-config-acme");
        assert_eq!(parse_preset("@acme").repo, "@acme/renovate-config");
        assert_eq!(parse_preset("@acme/presets:base").repo, "@acme/presets");
        assert_eq!(parse_preset("npm>acme:base").preset_name, "base");
        assert_eq!(parse_preset("acme").source, PresetSource::Npm);
    }

    #[test]
    fn test_parse_http_preset() {
        let preset = parse_preset("https://example.com/preset.json");
        assert_eq!(preset.source, PresetSource::Http);
        assert_eq!(preset.repo, "https://example.com/preset.json");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(PresetSource::Gitea.to_string(), "gitea");
        assert_eq!(PresetSource::Internal.to_string(), "internal");
    }

    #[test]
    fn test_empty_tag_is_none() {
        assert_eq!(parse_preset("github>acme/presets#").tag, None);
    }

    #[test]
    fn test_supported_datasources() {
        assert_eq!(
            SUPPORTED_DATASOURCES,
            &["github-tags", "gitlab-tags", "gitea-tags"]
        );
    }

    #[test]
    fn test_skip_reason_serialization() {
        let value = serde_json::to_value(SkipReason::UnspecifiedVersion).unwrap();
        assert_eq!(value, serde_json::json!("unspecified-version"));
    }
}
