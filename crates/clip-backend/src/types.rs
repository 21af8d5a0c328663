//! Request/response bodies of the internal job API.

use serde::{Deserialize, Serialize};

use clip_models::Job;

use crate::error::{BackendError, BackendResult};

/// Body of `POST /jobs/{id}/progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub progress: u8,
}

/// Parse the body of `POST /jobs/claim`.
///
/// The body must be an object with a `job` key. `null` means the queue is
/// empty; a missing key or an undecodable job is a malformed response.
pub fn parse_claim_response(body: &str) -> BackendResult<Option<Job>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(format!("claim body is not JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| BackendError::malformed("claim body is not an object"))?;

    let job = object
        .get("job")
        .ok_or_else(|| BackendError::malformed("claim body has no `job` field"))?;

    if job.is_null() {
        return Ok(None);
    }

    let job: Job = serde_json::from_value(job.clone())
        .map_err(|e| BackendError::malformed(format!("invalid job in claim body: {}", e)))?;

    if job.id.is_empty() {
        return Err(BackendError::malformed("claimed job has an empty id"));
    }

    Ok(Some(job))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_job_is_empty_queue() {
        assert!(parse_claim_response(r#"{"job":null}"#).unwrap().is_none());
    }

    #[test]
    fn test_job_is_parsed() {
        let job = parse_claim_response(
            r#"{"job":{"id":"j1","type":"VIDEO_CLIP","status":"PROCESSING","payload":{}}}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(job.id.as_str(), "j1");
        assert_eq!(job.job_type, "VIDEO_CLIP");
    }

    #[test]
    fn test_missing_job_key_is_malformed() {
        let err = parse_claim_response(r#"{}"#).unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            parse_claim_response("[]").unwrap_err(),
            BackendError::MalformedResponse(_)
        ));
        assert!(matches!(
            parse_claim_response("not json").unwrap_err(),
            BackendError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_job_without_type_is_malformed() {
        let err = parse_claim_response(r#"{"job":{"id":"j1"}}"#).unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[test]
    fn test_job_with_empty_id_is_malformed() {
        let err = parse_claim_response(r#"{"job":{"id":"","type":"VIDEO_CLIP"}}"#).unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }
}
