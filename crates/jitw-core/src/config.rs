//! Operator configuration and its validation.
//!
//! [`RawConfig`] is what any front end (CLI flags today, perhaps a config
//! file later) produces; [`Config::validate`] is the single gate all of it
//! passes through before the rest of the crate ever sees it. A `Config` is
//! only ever constructed this way, so every consumer can treat its fields as
//! already-checked invariants rather than re-validating them.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Unvalidated operator input, as collected from flags (or, in principle,
/// any other front end). Every field here is exactly what the user typed.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    /// `host:port` of the access platform's gRPC proxy.
    pub proxy: Option<String>,
    /// Path to the identity-file credential bundle.
    pub identity_file: Option<PathBuf>,
    /// Requested resource-count ceiling.
    pub max_resources: i64,
    /// Whether resource-limit enforcement is requested.
    pub check_resources: bool,
    /// Whether role-conflict enforcement is requested.
    pub check_conflicts: bool,
    /// Raw conflict-pattern strings, already comma-split and trimmed.
    pub conflict_patterns: Vec<String>,
    /// Requested reconciliation cadence.
    pub poll_interval: Duration,
    /// Whether DEBUG-level logging was requested.
    pub debug: bool,
}

/// Fatal startup rejections (§4.H, §7 kind 1). Validation never partially
/// succeeds: the first violation found is the one reported.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--proxy` was not supplied.
    #[error("--proxy is required")]
    MissingProxy,
    /// `--identity-file` was not supplied.
    #[error("--identity-file is required")]
    MissingIdentityFile,
    /// The identity-file path does not exist on disk.
    #[error("identity file not found: {0}")]
    IdentityFileNotFound(PathBuf),
    /// `--max-resources` was not a positive integer.
    #[error("max-resources must be >= 1, got {0}")]
    InvalidMaxResources(i64),
    /// `--poll-interval` was below the 1-second floor.
    #[error("poll-interval must be >= 1s, got {0:?}")]
    InvalidPollInterval(Duration),
    /// Role-conflict checking was enabled with fewer than two patterns.
    #[error("--role-conflicts requires at least 2 --conflict-patterns")]
    TooFewConflictPatterns,
    /// A configured conflict pattern failed to compile as a regex.
    #[error("conflict pattern '{pattern}' failed to compile: {source}")]
    InvalidPattern {
        /// The offending pattern string, verbatim as configured.
        pattern: String,
        /// Underlying regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Validated, immutable configuration. The only way to build one is
/// [`Config::validate`]; once built, every field is guaranteed to satisfy
/// the invariants in §4.H.
#[derive(Debug, Clone)]
pub struct Config {
    /// `host:port` of the access platform's gRPC proxy.
    pub proxy: String,
    /// Path to the identity-file credential bundle; guaranteed to exist.
    pub identity_file: PathBuf,
    /// Resource-count ceiling; guaranteed `>= 1`.
    pub max_resources: usize,
    /// Whether resource-limit enforcement is enabled.
    pub check_resources: bool,
    /// Whether role-conflict enforcement is enabled.
    pub check_conflicts: bool,
    /// Conflict patterns in operator-configured order; each is a valid regex.
    /// Non-empty whenever `check_conflicts` is set, and has at least 2 entries.
    pub conflict_patterns: Vec<String>,
    /// Reconciliation cadence; guaranteed `>= 1s`.
    pub poll_interval: Duration,
    /// Whether DEBUG-level logging is enabled.
    pub debug: bool,
}

impl Config {
    /// Default resource-count ceiling when the operator doesn't set one.
    pub const DEFAULT_MAX_RESOURCES: i64 = 3;
    /// Default reconciliation cadence.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
    /// Default conflict patterns.
    #[must_use]
    pub fn default_conflict_patterns() -> Vec<String> {
        vec!["prod".to_string(), "research".to_string()]
    }

    /// Validate `raw`, returning the first violation encountered in the
    /// fixed order documented in §4.H.
    pub fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let proxy = raw.proxy.filter(|s| !s.trim().is_empty()).ok_or(ConfigError::MissingProxy)?;
        let identity_file = raw.identity_file.ok_or(ConfigError::MissingIdentityFile)?;
        if !identity_file.exists() {
            return Err(ConfigError::IdentityFileNotFound(identity_file));
        }
        if raw.max_resources < 1 {
            return Err(ConfigError::InvalidMaxResources(raw.max_resources));
        }
        if raw.poll_interval < Duration::from_secs(1) {
            return Err(ConfigError::InvalidPollInterval(raw.poll_interval));
        }
        if raw.check_conflicts && raw.conflict_patterns.len() < 2 {
            return Err(ConfigError::TooFewConflictPatterns);
        }
        for pattern in &raw.conflict_patterns {
            if let Err(source) = regex::RegexBuilder::new(pattern).case_insensitive(true).build() {
                return Err(ConfigError::InvalidPattern { pattern: pattern.clone(), source });
            }
        }

        Ok(Self {
            proxy,
            identity_file,
            // `InvalidMaxResources` above guarantees `raw.max_resources >= 1`.
            max_resources: raw.max_resources as usize,
            check_resources: raw.check_resources,
            check_conflicts: raw.check_conflicts,
            conflict_patterns: raw.conflict_patterns,
            poll_interval: raw.poll_interval,
            debug: raw.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw(identity_file: PathBuf) -> RawConfig {
        RawConfig {
            proxy: Some("proxy.example.com:443".to_string()),
            identity_file: Some(identity_file),
            max_resources: 3,
            check_resources: true,
            check_conflicts: true,
            conflict_patterns: vec!["prod".to_string(), "research".to_string()],
            poll_interval: Duration::from_secs(30),
            debug: false,
        }
    }

    #[test]
    fn rejects_missing_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.proxy = None;
        assert!(matches!(Config::validate(raw), Err(ConfigError::MissingProxy)));
    }

    #[test]
    fn rejects_nonexistent_identity_file() {
        let mut raw = valid_raw(PathBuf::from("/does/not/exist"));
        raw.identity_file = Some(PathBuf::from("/does/not/exist"));
        assert!(matches!(Config::validate(raw), Err(ConfigError::IdentityFileNotFound(_))));
    }

    #[test]
    fn rejects_non_positive_max_resources() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.max_resources = 0;
        assert!(matches!(Config::validate(raw), Err(ConfigError::InvalidMaxResources(0))));
    }

    #[test]
    fn rejects_sub_second_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.poll_interval = Duration::from_millis(500);
        assert!(matches!(Config::validate(raw), Err(ConfigError::InvalidPollInterval(_))));
    }

    #[test]
    fn rejects_too_few_conflict_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.conflict_patterns = vec!["prod".to_string()];
        assert!(matches!(Config::validate(raw), Err(ConfigError::TooFewConflictPatterns)));
    }

    #[test]
    fn allows_single_pattern_when_conflicts_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.check_conflicts = false;
        raw.conflict_patterns = vec!["prod".to_string()];
        assert!(Config::validate(raw).is_ok());
    }

    #[test]
    fn rejects_invalid_pattern_regex() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = valid_raw(dir.path().to_path_buf());
        raw.conflict_patterns = vec!["prod".to_string(), "research(".to_string()];
        assert!(matches!(Config::validate(raw), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn accepts_well_formed_config() {
        let dir = tempfile::tempdir().unwrap();
        let raw = valid_raw(dir.path().to_path_buf());
        let cfg = Config::validate(raw).unwrap();
        assert_eq!(cfg.max_resources, 3);
        assert_eq!(cfg.conflict_patterns, vec!["prod", "research"]);
    }
}
