//! Rendering and merging tests for generated registry config.

use npm_hostrules::{
    merge_npmrc_content, merge_yarnrc_yml, process_host_rules, HostRule, HostRules,
    RegistryAuth, YarnRcYml,
};
use pretty_assertions::assert_eq;
use serde_yaml::Value;

fn company_yarnrc() -> YarnRcYml {
    let mut yarn = YarnRcYml::default();
    yarn.npm_registries.insert(
        "//registry.company.com/".to_string(),
        RegistryAuth::Token("abc".to_string()),
    );
    yarn
}

fn parse(yaml: &str) -> Value {
    serde_yaml::from_str(yaml).unwrap()
}

// =============================================================================
// .yarnrc.yml
// =============================================================================

#[test]
fn test_merge_into_missing_yarnrc() {
    let merged = merge_yarnrc_yml(None, &company_yarnrc()).unwrap();
    let value = parse(&merged);
    assert_eq!(
        value["npmRegistries"]["//registry.company.com/"]["npmAuthToken"].as_str(),
        Some("abc")
    );
}

#[test]
fn test_merge_keeps_other_settings() {
    let existing = "\
nodeLinker: node-modules
npmRegistries:
  //registry.company.com/:
    npmAlwaysAuth: true
    npmAuthToken: old
  //other.com/:
    npmAuthIdent: keep:me
";
    let merged = merge_yarnrc_yml(Some(existing), &company_yarnrc()).unwrap();
    let value = parse(&merged);

    assert_eq!(value["nodeLinker"].as_str(), Some("node-modules"));
    let company = &value["npmRegistries"]["//registry.company.com/"];
    assert_eq!(company["npmAuthToken"].as_str(), Some("abc"));
    assert_eq!(company["npmAlwaysAuth"].as_bool(), Some(true));
    assert_eq!(
        value["npmRegistries"]["//other.com/"]["npmAuthIdent"].as_str(),
        Some("keep:me")
    );
}

#[test]
fn test_merge_into_comment_only_yarnrc() {
    let merged = merge_yarnrc_yml(Some("# nothing here\n"), &company_yarnrc()).unwrap();
    let value = parse(&merged);
    assert!(value["npmRegistries"].is_mapping());
}

#[test]
fn test_generated_yaml_round_trips_through_merge() {
    let mut rules = HostRules::new();
    rules.add(HostRule {
        host_type: Some("npm".to_string()),
        match_host: Some("https://registry.npmjs.org".to_string()),
        token: Some("token123".to_string()),
        ..Default::default()
    });

    let yarn = process_host_rules(&rules).additional_yarn_rc_yml.unwrap();
    let value = parse(&yarn.to_yaml().unwrap());
    let registries = value["npmRegistries"].as_mapping().unwrap();
    assert_eq!(registries.len(), 2);
    assert_eq!(
        value["npmRegistries"]["//registry.npmjs.org"]["npmAuthToken"].as_str(),
        Some("token123")
    );
}

// =============================================================================
// .npmrc
// =============================================================================

#[test]
fn test_merge_npmrc_appends_lines() {
    let mut rules = HostRules::new();
    rules.add(HostRule {
        match_host: Some("registry.company.com".to_string()),
        username: Some("user123".to_string()),
        password: Some("pass123".to_string()),
        ..Default::default()
    });
    let res = process_host_rules(&rules);

    let merged = merge_npmrc_content(Some("save-exact=true"), &res.additional_npmrc_content);
    assert_eq!(
        merged,
        "save-exact=true\n\
         //registry.company.com/:username=user123\n\
         //registry.company.com/:_password=cGFzczEyMw=="
    );
    assert_eq!(
        merge_npmrc_content(None, &res.additional_npmrc_content),
        res.npmrc_content()
    );
}
