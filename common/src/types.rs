use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Unique identifier of a cluster member.
///
/// Serialized as a plain integer in JSON bodies; the text form used in
/// headers and version maps is zero-padded lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(MemberId)
    }
}

/// Identifier of a cluster generation, carried in the cluster-ID response
/// header as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u64);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ClusterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(ClusterId)
    }
}

/// A single cluster member as reported by the membership endpoint.
///
/// A non-empty `client_urls` list means the member has completed bootstrap
/// and registered its client-facing endpoints. Learners replicate the log
/// but do not vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
    #[serde(rename = "isLearner", default)]
    pub is_learner: bool,
}

/// A snapshot of cluster membership, built fresh on every discovery call.
///
/// The view is never mutated in place by this crate once handed to an
/// operation; callers replace their cached view wholesale. The negotiated
/// cluster version is optional until version negotiation converges.
#[derive(Debug, Clone)]
pub struct ClusterView {
    cluster_id: ClusterId,
    members: BTreeMap<MemberId, Member>,
    version: Option<Version>,
}

impl ClusterView {
    /// Builds a view from a remote member list.
    ///
    /// A remote response with zero members means the peer considers the
    /// cluster invalid, so construction fails rather than producing an
    /// empty view. Duplicate member IDs also fail construction.
    pub fn from_members(cluster_id: ClusterId, members: Vec<Member>) -> Result<Self> {
        if members.is_empty() {
            return Err(ClusterError::EmptyCluster);
        }
        let mut map = BTreeMap::new();
        for m in members {
            let id = m.id;
            if map.insert(id, m).is_some() {
                return Err(ClusterError::DuplicateMemberId(id));
            }
        }
        Ok(Self {
            cluster_id,
            members: map,
            version: None,
        })
    }

    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    /// All members, in ascending ID order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// Looks a member up by its human-readable name. Names are unique
    /// within a cluster generation.
    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        self.members.values().find(|m| m.name == name)
    }

    /// The negotiated cluster-wide version, if one has been decided.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Records a negotiated cluster version. Caller-side only; discovery
    /// always returns views with no version set.
    pub fn set_version(&mut self, version: Version) {
        self.version = Some(version);
    }
}
