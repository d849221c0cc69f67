use std::collections::HashMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Cluster version string reported by a member whose cluster has not yet
/// negotiated a version.
pub const UNDECIDED_CLUSTER_VERSION: &str = "not_decided";

/// Versions reported by a member at its `/version` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionReport {
    /// The member's own build version.
    pub server: String,
    /// The cluster-wide version as that member currently sees it.
    pub cluster: String,
}

/// Version reports keyed by member ID (hex string).
///
/// `None` means the member was asked and could not be reached or understood,
/// as opposed to a member that was never queried (absent key). Absence of a
/// report is contagious to the cluster version decision.
pub type VersionMap = HashMap<String, Option<VersionReport>>;

/// The local build's version identity, parsed once at startup.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// The running binary's own version.
    pub server_version: Version,
    /// Oldest cluster version this build can participate in.
    pub min_cluster_version: Version,
    /// Accept a cluster one minor version ahead of this build, for
    /// mixed-version rolling upgrades.
    pub next_version_compatible: bool,
}

impl BuildInfo {
    pub fn new(
        server_version: &str,
        min_cluster_version: &str,
        next_version_compatible: bool,
    ) -> Result<Self> {
        Ok(Self {
            server_version: parse_version(server_version)?,
            min_cluster_version: parse_version(min_cluster_version)?,
            next_version_compatible,
        })
    }

    /// The inclusive `[min, max]` range of cluster versions this build
    /// accepts. The upper bound is the build's own `{major, minor}` with
    /// patch and pre-release stripped, bumped one minor version when
    /// next-version compatibility is on.
    pub fn compatibility_range(&self) -> (Version, Version) {
        let mut max = Version::new(self.server_version.major, self.server_version.minor, 0);
        if self.next_version_compatible {
            max.minor += 1;
        }
        (self.min_cluster_version.clone(), max)
    }
}

pub fn parse_version(input: &str) -> Result<Version> {
    Version::parse(input).map_err(|e| ClusterError::InvalidVersion {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
