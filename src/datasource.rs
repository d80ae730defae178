//! Identifiers of datasources and platforms that host rules can be typed with.

/// GitHub tags datasource.
pub const GITHUB_TAGS: &str = "github-tags";

/// GitLab tags datasource.
pub const GITLAB_TAGS: &str = "gitlab-tags";

/// Gitea tags datasource.
pub const GITEA_TAGS: &str = "gitea-tags";

/// npm registry datasource. Also the host type of npm credentials.
pub const NPM: &str = "npm";

/// Datasource ids known to the host rules environment parser.
pub const DATASOURCE_IDS: &[&str] = &[
    "bitbucket-tags",
    "cdnjs",
    "conan",
    "crate",
    "docker",
    "gitea-releases",
    GITEA_TAGS,
    "github-releases",
    GITHUB_TAGS,
    "gitlab-packages",
    "gitlab-releases",
    GITLAB_TAGS,
    "go",
    "helm",
    "hex",
    "maven",
    NPM,
    "nuget",
    "packagist",
    "pypi",
    "rubygems",
    "terraform-module",
    "terraform-provider",
];

/// Platform host types.
pub const PLATFORM_HOST_TYPES: &[&str] = &[
    "azure",
    "bitbucket",
    "bitbucket-server",
    "codecommit",
    "forgejo",
    "gerrit",
    "gitea",
    "github",
    "gitlab",
];

/// Check whether `host_type` may be derived from an environment variable name.
///
/// Azure is excluded because its variable names clash with Azure tooling.
///
/// # Examples
///
/// ```
/// use npm_hostrules::datasource::is_env_host_type;
///
/// assert!(is_env_host_type("npm"));
/// assert!(is_env_host_type("github-tags"));
/// assert!(!is_env_host_type("azure"));
/// assert!(!is_env_host_type("path"));
/// ```
pub fn is_env_host_type(host_type: &str) -> bool {
    DATASOURCE_IDS.contains(&host_type)
        || (host_type != "azure" && PLATFORM_HOST_TYPES.contains(&host_type))
}
