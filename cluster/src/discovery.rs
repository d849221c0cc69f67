use std::time::Duration;

use tracing::warn;

use quorumgate_common::{ClusterError, ClusterId, ClusterView, Member, Result};

use crate::transport::PeerTransport;

/// Response header carrying the cluster ID as a hex string.
pub const CLUSTER_ID_HEADER: &str = "x-quorumgate-cluster-id";

/// Per-request timeout for foreground discovery. The cluster's heartbeat
/// TTL tops out around 5s, so 10s is enough to build a connection and
/// finish the request while still bounding stalls on unreachable peers.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

const MEMBERS_PATH: &str = "/members";

/// Returns the peer URLs of every member other than `local_name`, flattened
/// and sorted in ascending lexicographical order. The order does not affect
/// which peers discovery can reach, but it keeps retries and logs stable.
pub fn remote_peer_urls(view: &ClusterView, local_name: &str) -> Vec<String> {
    let mut urls: Vec<String> = view
        .members()
        .filter(|m| m.name != local_name)
        .flat_map(|m| m.peer_urls.iter().cloned())
        .collect();
    urls.sort();
    urls
}

/// Attempts to construct a cluster view by querying the membership endpoint
/// of the given peer URLs in order. The first URL to yield a non-empty
/// member list wins and no further URLs are tried.
pub async fn cluster_from_remote_peers(
    urls: &[String],
    transport: &PeerTransport,
) -> Result<ClusterView> {
    fetch_cluster(urls, DEFAULT_DISCOVERY_TIMEOUT, true, transport).await
}

/// Outcome of probing one candidate URL.
enum Probe {
    /// The peer produced a usable membership snapshot.
    Cluster(ClusterView),
    /// The peer could not be used; the next candidate may still succeed.
    TryNext,
    /// The peer's answer invalidates the whole attempt.
    Abort(ClusterError),
}

/// Internal discovery with caller-controlled timeout and log volume, used
/// by background probes that poll frequently and want quiet logs.
pub(crate) async fn fetch_cluster(
    urls: &[String],
    timeout: Duration,
    log_verbose: bool,
    transport: &PeerTransport,
) -> Result<ClusterView> {
    let client = transport.client(Some(timeout))?;
    for url in urls {
        match probe_members(&client, url, log_verbose).await {
            Probe::Cluster(view) => return Ok(view),
            Probe::TryNext => continue,
            Probe::Abort(err) => return Err(err),
        }
    }
    Err(ClusterError::ExhaustedCandidates)
}

async fn probe_members(client: &reqwest::Client, url: &str, log_verbose: bool) -> Probe {
    let address = format!("{url}{MEMBERS_PATH}");

    let resp = match client.get(&address).send().await {
        Ok(resp) => resp,
        Err(e) => {
            if log_verbose {
                warn!(%address, error = %e, "failed to get cluster response");
            }
            return Probe::TryNext;
        }
    };

    let raw_cluster_id = resp
        .headers()
        .get(CLUSTER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = match resp.bytes().await {
        Ok(body) => body,
        Err(e) => {
            if log_verbose {
                warn!(%address, error = %e, "failed to read body of cluster response");
            }
            return Probe::TryNext;
        }
    };

    let members: Vec<Member> = match serde_json::from_slice(&body) {
        Ok(members) => members,
        Err(e) => {
            if log_verbose {
                warn!(%address, error = %e, "failed to unmarshal cluster response");
            }
            return Probe::TryNext;
        }
    };

    let cluster_id: ClusterId = match raw_cluster_id.parse() {
        Ok(id) => id,
        Err(e) => {
            if log_verbose {
                warn!(%address, header = %raw_cluster_id, error = %e, "failed to parse cluster ID");
            }
            return Probe::TryNext;
        }
    };

    // An otherwise well-formed response with zero members means this peer
    // believes the cluster is invalid. That signal must not be masked by
    // retrying the next peer, so the whole attempt stops here.
    if members.is_empty() {
        return Probe::Abort(ClusterError::EmptyCluster);
    }

    match ClusterView::from_members(cluster_id, members) {
        Ok(view) => Probe::Cluster(view),
        Err(e) => {
            if log_verbose {
                warn!(%address, error = %e, "rejected invalid member list");
            }
            Probe::TryNext
        }
    }
}

/// Best-effort check of whether the named member, as seen by its peers,
/// has already completed bootstrap.
///
/// A member with at least one registered client URL has necessarily
/// finished initial setup from the cluster's perspective, even if the
/// local process has not confirmed it yet. Any discovery failure yields
/// `false`; this probe never surfaces errors.
pub async fn is_member_bootstrapped(
    view: &ClusterView,
    member_name: &str,
    transport: &PeerTransport,
    timeout: Duration,
) -> bool {
    let Some(local) = view.member_by_name(member_name) else {
        return false;
    };
    let urls = remote_peer_urls(view, member_name);
    let Ok(remote) = fetch_cluster(&urls, timeout, false, transport).await else {
        return false;
    };
    remote
        .member(local.id)
        .map(|m| !m.client_urls.is_empty())
        .unwrap_or(false)
}
