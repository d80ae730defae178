//! Host credential rules to npm and yarn registry configuration.
//!
//! This crate turns a set of host credential rules into the registry auth
//! configuration package managers read:
//!
//! - Legacy `.npmrc` lines (`//registry.company.com/:_authToken=...`)
//! - The `npmRegistries` map of yarn berry's `.yarnrc.yml`
//!
//! It also exposes the renovate config presets pseudo-manager, which finds
//! versioned preset references in renovate config files.
//!
//! # Quick Start
//!
//! ```
//! use npm_hostrules::{process_host_rules, HostRule, HostRules};
//!
//! let mut rules = HostRules::new();
//! rules.add(HostRule {
//!     host_type: Some("npm".to_string()),
//!     match_host: Some("registry.company.com".to_string()),
//!     username: Some("user123".to_string()),
//!     password: Some("pass123".to_string()),
//!     ..Default::default()
//! });
//!
//! let res = process_host_rules(&rules);
//! assert_eq!(
//!     res.additional_npmrc_content,
//!     vec![
//!         "//registry.company.com/:username=user123",
//!         "//registry.company.com/:_password=cGFzczEyMw==",
//!     ]
//! );
//! let yarn = res.additional_yarn_rc_yml.unwrap();
//! assert_eq!(
//!     yarn.npm_registries["//registry.company.com/"].ident(),
//!     Some("user123:pass123")
//! );
//! ```
//!
//! # Rule Selection
//!
//! Only rules typed `npm` or untyped are used, and only when they have a
//! resolvable host. When several rules resolve to the same host, an
//! `npm`-typed rule wins over an untyped one; otherwise the first registered
//! rule wins.
//!
//! # Loading Rules
//!
//! Rules can be parsed from renovate-style JSON config (`hostRules`) or
//! derived from environment variables:
//!
//! ```text
//! NPM_REGISTRY_COMPANY_COM_TOKEN=abc  ->  npm rule for registry.company.com
//! ```

mod auth;
pub mod datasource;
mod error;
mod host_rules;
pub mod presets;
mod rules;

// Re-export main types
pub use auth::{encode_password, is_http_url, RegistryAuth, RegistryUri};
pub use error::{Error, Result};
pub use host_rules::{massage_host_url, resolve_host, HostRule, HostRules};
pub use rules::{
    merge_npmrc_content, merge_yarnrc_yml, process_host_rules, HostRulesResult, YarnRcYml,
};
