pub mod discovery;
pub mod promote;
pub mod transport;
pub mod versions;

pub use discovery::{
    cluster_from_remote_peers, is_member_bootstrapped, remote_peer_urls, CLUSTER_ID_HEADER,
    DEFAULT_DISCOVERY_TIMEOUT,
};
pub use promote::promote_member;
pub use transport::PeerTransport;
pub use versions::{
    collect_versions, decide_cluster_version, is_compatible_with_cluster,
    is_compatible_with_versions,
};
