use semver::Version;
use tracing::warn;

use quorumgate_common::{
    BuildInfo, ClusterError, ClusterView, Member, MemberId, Result, VersionMap, VersionReport,
    UNDECIDED_CLUSTER_VERSION,
};

use crate::transport::PeerTransport;

const VERSION_PATH: &str = "/version";

/// Collects a version report for every member of the cluster.
///
/// The local member's entry is synthesized without a network call: its
/// server version is the build's own, its cluster version the view's
/// negotiated version or the undecided sentinel. Every other member is
/// queried over its peer URLs; a member whose URLs all fail is recorded as
/// `None` rather than omitted, so callers can tell "asked and failed" from
/// "never asked". Per-member failures are independent.
pub async fn collect_versions(
    view: &ClusterView,
    local_id: MemberId,
    build: &BuildInfo,
    transport: &PeerTransport,
) -> VersionMap {
    let client = match transport.client(None) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "failed to construct peer client for version query");
            None
        }
    };

    let mut vers = VersionMap::new();
    for member in view.members() {
        if member.id == local_id {
            let cluster = view
                .version()
                .map(|v| v.to_string())
                .unwrap_or_else(|| UNDECIDED_CLUSTER_VERSION.to_string());
            vers.insert(
                member.id.to_string(),
                Some(VersionReport {
                    server: build.server_version.to_string(),
                    cluster,
                }),
            );
            continue;
        }

        let report = match &client {
            Some(client) => member_version(client, member).await,
            None => Err(ClusterError::Transport("peer client unavailable".to_string())),
        };
        match report {
            Ok(report) => {
                vers.insert(member.id.to_string(), Some(report));
            }
            Err(e) => {
                warn!(remote_member_id = %member.id, error = %e, "failed to get version");
                vers.insert(member.id.to_string(), None);
            }
        }
    }
    vers
}

/// Queries one member's version over its peer URLs in listed order,
/// stopping at the first parsable payload. Returns the last error when
/// every URL fails.
async fn member_version(client: &reqwest::Client, member: &Member) -> Result<VersionReport> {
    let mut last_err = ClusterError::Unreachable {
        address: member.id.to_string(),
        reason: "member has no peer URLs".to_string(),
    };

    for url in &member.peer_urls {
        let address = format!("{url}{VERSION_PATH}");

        let resp = match client.get(&address).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%address, remote_member_id = %member.id, error = %e, "failed to reach the peer URL");
                last_err = ClusterError::Unreachable {
                    address,
                    reason: e.to_string(),
                };
                continue;
            }
        };

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%address, remote_member_id = %member.id, error = %e, "failed to read body of version response");
                last_err = ClusterError::MalformedResponse {
                    address,
                    reason: e.to_string(),
                };
                continue;
            }
        };

        match serde_json::from_slice::<VersionReport>(&body) {
            Ok(report) => return Ok(report),
            Err(e) => {
                warn!(%address, remote_member_id = %member.id, error = %e, "failed to unmarshal version response");
                last_err = ClusterError::MalformedResponse {
                    address,
                    reason: e.to_string(),
                };
            }
        }
    }
    Err(last_err)
}

/// Decides the cluster-wide version from a full version map: the minimum
/// reported server version, or `None` when any entry is absent or
/// unparsable. Negotiation requires full information; a gap is unsafe to
/// guess across.
///
/// A remote member running ahead of the local build is logged but does not
/// change the result: the minimum wins so the cluster version only
/// advances once every member has upgraded.
pub fn decide_cluster_version(versions: &VersionMap, local: &Version) -> Option<Version> {
    let mut cv: Option<Version> = None;

    for (member_id, report) in versions {
        let Some(report) = report else {
            return None;
        };
        let v = match Version::parse(&report.server) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    remote_member_id = %member_id,
                    remote_member_version = %report.server,
                    error = %e,
                    "failed to parse server version of remote member"
                );
                return None;
            }
        };
        if *local < v {
            warn!(
                local_member_version = %local,
                remote_member_id = %member_id,
                remote_member_version = %v,
                "found higher-versioned member"
            );
        }
        cv = match cv {
            Some(cur) if cur < v => Some(cur),
            _ => Some(v),
        };
    }
    cv
}

/// Collects versions from the cluster and checks the local build's
/// compatibility range against them.
pub async fn is_compatible_with_cluster(
    view: &ClusterView,
    local_id: MemberId,
    build: &BuildInfo,
    transport: &PeerTransport,
) -> bool {
    let versions = collect_versions(view, local_id, build, transport).await;
    let (min, max) = build.compatibility_range();
    is_compatible_with_versions(&versions, local_id, &min, &max)
}

/// True when at least one other member reports a cluster version inside
/// `[min, max]` and no member reports one outside it.
///
/// Absent reports are skipped rather than fatal because another member may
/// simply be offline while this one joins; but with no usable comparison
/// at all, compatibility cannot be asserted and the answer is false.
pub fn is_compatible_with_versions(
    versions: &VersionMap,
    local_id: MemberId,
    min: &Version,
    max: &Version,
) -> bool {
    let local = local_id.to_string();
    let mut ok = false;

    for (member_id, report) in versions {
        if *member_id == local {
            continue;
        }
        let Some(report) = report else {
            continue;
        };
        let cluster_version = match Version::parse(&report.cluster) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    remote_member_id = %member_id,
                    remote_member_cluster_version = %report.cluster,
                    error = %e,
                    "failed to parse cluster version of remote member"
                );
                continue;
            }
        };
        if cluster_version < *min {
            warn!(
                remote_member_id = %member_id,
                remote_member_cluster_version = %cluster_version,
                minimum_cluster_version_supported = %min,
                "cluster version of remote member is not compatible; too low"
            );
            return false;
        }
        if *max < cluster_version {
            warn!(
                remote_member_id = %member_id,
                remote_member_cluster_version = %cluster_version,
                maximum_cluster_version_supported = %max,
                "cluster version of remote member is not compatible; too high"
            );
            return false;
        }
        ok = true;
    }
    ok
}
