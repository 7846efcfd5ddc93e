//! Skip policy for suites that depend on an embedded PostgreSQL cluster.
//!
//! The spatial store needs PostGIS, which stock embedded PostgreSQL bundles
//! do not ship. Environment problems (no cluster, no extension) therefore
//! skip with a `SKIP-TEST-CLUSTER` marker unless `LINKUP_REQUIRE_TEST_CLUSTER`
//! is truthy. A schema that fails to apply on a working cluster always fails
//! the test.

use std::fmt;

/// Why the database for a test could not be prepared.
#[derive(Debug)]
pub enum SetupFailure {
    /// The embedded cluster could not be started or reached.
    Cluster(String),
    /// The cluster is up but `CREATE EXTENSION postgis` failed.
    Extension(String),
    /// The migration itself failed after the extension loaded.
    Schema(String),
}

impl fmt::Display for SetupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(reason) => write!(f, "embedded cluster unavailable: {reason}"),
            Self::Extension(reason) => write!(f, "postgis unavailable: {reason}"),
            Self::Schema(reason) => write!(f, "schema migration failed: {reason}"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Returns true when `LINKUP_REQUIRE_TEST_CLUSTER` is `1`, `true` or `yes`.
pub fn require_test_cluster() -> bool {
    env_flag("LINKUP_REQUIRE_TEST_CLUSTER")
}

/// Returns true when `SKIP_TEST_CLUSTER` is `1`, `true` or `yes`.
pub fn should_skip_test_cluster() -> bool {
    env_flag("SKIP_TEST_CLUSTER")
}

fn should_skip(failure: &SetupFailure, skip_requested: bool, cluster_required: bool) -> bool {
    let environmental = matches!(
        failure,
        SetupFailure::Cluster(_) | SetupFailure::Extension(_)
    );
    skip_requested || (environmental && !cluster_required)
}

/// Prints a skip marker and returns `None` for environment failures; panics
/// for schema failures or when the cluster is required.
pub fn handle_cluster_setup_failure<T>(failure: SetupFailure) -> Option<T> {
    if should_skip(&failure, should_skip_test_cluster(), require_test_cluster()) {
        eprintln!("SKIP-TEST-CLUSTER: {failure}");
        None
    } else {
        panic!("Test cluster setup failed: {failure}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::missing_extension(SetupFailure::Extension("no control file".into()), false, false, true)]
    #[case::cluster_down(SetupFailure::Cluster("bootstrap failed".into()), false, false, true)]
    #[case::cluster_required(SetupFailure::Cluster("bootstrap failed".into()), false, true, false)]
    #[case::broken_schema(SetupFailure::Schema("syntax error".into()), false, false, false)]
    #[case::explicit_skip(SetupFailure::Schema("syntax error".into()), true, true, true)]
    fn skip_policy(
        #[case] failure: SetupFailure,
        #[case] skip_requested: bool,
        #[case] cluster_required: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(should_skip(&failure, skip_requested, cluster_required), expected);
    }
}
