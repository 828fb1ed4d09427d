use crate::error::Error;
use std::time::Duration;

/// Default remote API root.
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com/";

/// Default bound on in-flight remote requests per aggregation call.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default deadline for a whole aggregation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default field holding a bug's severity.
pub const DEFAULT_SEVERITY_FIELD: &str = "Microsoft.VSTS.Common.Severity";

/// Environment variables read by [`Config::from_env`].
pub mod env {
    pub const PAT: &str = "ADO_PAT";
    pub const ORG_NAME: &str = "ADO_ORG_NAME";
    pub const ORG_URL: &str = "ADO_ORG_URL";
    pub const PROJECT: &str = "ADO_DEFAULT_PROJECT";
    pub const BASE_URL: &str = "QABOARD_ADO_BASE_URL";
    pub const CONCURRENCY: &str = "QABOARD_CONCURRENCY";
    pub const TIMEOUT_SECS: &str = "QABOARD_TIMEOUT_SECS";
    pub const SEVERITY_FIELD: &str = "ADO_FIELD_SEVERITY";
}

/// Runtime configuration for qaboard.
#[derive(Clone)]
pub struct Config {
    /// Personal access token for the remote API.
    pub pat: Option<String>,

    /// Default organization.
    pub organization: Option<String>,

    /// Default project.
    pub project: Option<String>,

    /// Remote API root (overridable for tests and on-prem servers).
    pub base_url: String,

    /// Maximum concurrent remote requests.
    pub concurrency: usize,

    /// Deadline for one aggregation call; zero means no deadline.
    pub timeout: Duration,

    /// Work item field counted by the severity metric.
    pub severity_field: String,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("pat", &self.pat.as_ref().map(|_| "<redacted>"))
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .field("severity_field", &self.severity_field)
            .field("json_logs", &self.json_logs)
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pat: None,
            organization: None,
            project: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            severity_field: DEFAULT_SEVERITY_FIELD.to_string(),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Build a config from the process environment.
    ///
    /// The organization comes from `ADO_ORG_NAME`, falling back to the last
    /// path segment of `ADO_ORG_URL`. Unparseable numeric values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let organization = non_empty(env::ORG_NAME).or_else(|| {
            non_empty(env::ORG_URL).and_then(|url| org_from_url(&url).map(String::from))
        });

        let mut config = Self {
            pat: non_empty(env::PAT),
            organization,
            project: non_empty(env::PROJECT),
            ..Self::default()
        };

        if let Some(base_url) = non_empty(env::BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(n) = non_empty(env::CONCURRENCY).and_then(|v| v.parse::<usize>().ok()) {
            config = config.with_concurrency(n);
        }
        if let Some(secs) = non_empty(env::TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(field) = non_empty(env::SEVERITY_FIELD) {
            config.severity_field = field;
        }
        config
    }

    /// Set the personal access token.
    #[must_use]
    pub fn with_pat(mut self, pat: impl Into<String>) -> Self {
        self.pat = Some(pat.into());
        self
    }

    /// Set the default organization.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Set the default project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the remote API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the concurrency bound (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the aggregation deadline (zero disables it).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// The credential, or a fatal config error when it is missing.
    pub fn credential(&self) -> Result<&str, Error> {
        self.pat
            .as_deref()
            .ok_or_else(|| Error::config(format!("Missing {} in environment", env::PAT)))
    }

    /// The organization, preferring an explicit override.
    pub fn organization_or<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str, Error> {
        explicit
            .or(self.organization.as_deref())
            .ok_or_else(|| Error::config(format!("Missing {} in environment", env::ORG_NAME)))
    }

    /// The project, preferring an explicit override.
    pub fn project_or<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str, Error> {
        explicit
            .or(self.project.as_deref())
            .ok_or_else(|| Error::config(format!("Missing {} in environment", env::PROJECT)))
    }
}

/// `https://dev.azure.com/contoso/` -> `contoso`
fn org_from_url(url: &str) -> Option<&str> {
    url.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}
