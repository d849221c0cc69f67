use reqwest::StatusCode;

use quorumgate_common::{ClusterError, Member, MemberId, Result};

use crate::transport::PeerTransport;

// Prose markers returned in 412 bodies by the administrative endpoint.
const LEARNER_NOT_READY_MARKER: &str = "learner not ready";
const NOT_LEARNER_MARKER: &str = "not a learner";

/// Asks the administrative endpoint at `url` to promote the learner with
/// the given ID into a voting member, returning the updated member list on
/// success.
///
/// No retries are performed here: promotion is caller-driven and safe to
/// re-POST externally, e.g. after `LearnerNotReady` once the learner's log
/// has caught up. Dropping the returned future aborts the in-flight
/// request, so callers cancel by racing it against a deadline.
pub async fn promote_member(
    url: &str,
    id: MemberId,
    transport: &PeerTransport,
) -> Result<Vec<Member>> {
    let client = transport.client(None)?;
    // The promotion path addresses the member by its decimal ID.
    let address = format!("{url}/members/promote/{}", id.0);

    let resp = client
        .post(&address)
        .send()
        .await
        .map_err(|e| ClusterError::Unreachable {
            address: address.clone(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| ClusterError::MalformedResponse {
            address: address.clone(),
            reason: e.to_string(),
        })?;

    match status {
        StatusCode::OK => {
            serde_json::from_slice(&body).map_err(|e| ClusterError::MalformedResponse {
                address,
                reason: e.to_string(),
            })
        }
        StatusCode::REQUEST_TIMEOUT => Err(ClusterError::Timeout),
        StatusCode::PRECONDITION_FAILED => {
            Err(precondition_error(&String::from_utf8_lossy(&body)))
        }
        StatusCode::NOT_FOUND => Err(ClusterError::IdNotFound),
        other => Err(ClusterError::UnknownPromotionFailure {
            status: other.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

/// Translates a 412 precondition-failure body into a typed error. The
/// endpoint only distinguishes the two failure modes in prose, so this is
/// the single place where that substring matching lives.
fn precondition_error(body: &str) -> ClusterError {
    if body.contains(LEARNER_NOT_READY_MARKER) {
        ClusterError::LearnerNotReady
    } else if body.contains(NOT_LEARNER_MARKER) {
        ClusterError::MemberNotLearner
    } else {
        ClusterError::UnknownPromotionFailure {
            status: StatusCode::PRECONDITION_FAILED.as_u16(),
            body: body.to_string(),
        }
    }
}
