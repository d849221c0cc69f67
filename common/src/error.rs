use crate::types::MemberId;

/// Errors surfaced by cluster discovery, version negotiation and member
/// promotion.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("peer unreachable at {address}: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("malformed response from {address}: {reason}")]
    MalformedResponse { address: String, reason: String },

    #[error("duplicate member ID {0} in member list")]
    DuplicateMemberId(MemberId),

    #[error("failed to get raft cluster member(s) from the given URLs")]
    EmptyCluster,

    #[error("could not retrieve cluster information from the given URLs")]
    ExhaustedCandidates,

    /// Not produced by this crate's operations: `decide_cluster_version`
    /// reports insufficient information as `None`. Callers that must block
    /// a join/start on an undecided version surface it as this error.
    #[error("cluster version not decided yet")]
    VersionUndecided,

    /// Not produced by this crate's operations: the compatibility gate
    /// returns `false`. Callers that must refuse to proceed surface the
    /// refusal as this error.
    #[error("local build version is not compatible with the running cluster")]
    Incompatible,

    #[error("invalid semantic version {input:?}: {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("failed to construct HTTP client: {0}")]
    Transport(String),

    // Promotion outcomes, mapped from the administrative endpoint's
    // status codes.
    #[error("server timed out committing the promotion")]
    Timeout,

    #[error("member is not a learner")]
    MemberNotLearner,

    #[error("learner is not ready to be promoted")]
    LearnerNotReady,

    #[error("member ID not found")]
    IdNotFound,

    #[error("member promote: unknown error (status {status}): {body}")]
    UnknownPromotionFailure { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, ClusterError>;
