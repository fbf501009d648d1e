//! Request handlers and wire DTOs.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use facegate_liveness::TenantDirectory;
use facegate_types::{CapturedFrame, ChallengeToken, FramePair, IdentityRef, TenantContext, Timestamp};
use serde::Serialize;

use crate::error::RpcError;
use crate::server::AppState;

// ── Wire shapes ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    /// Opaque challenge token to echo back on verify.
    pub challenge: String,
    /// Wire name of the instructed action.
    pub action: &'static str,
    /// Seconds until the challenge expires.
    pub expires_in: u64,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub user_id: i64,
    pub confidence: f64,
    pub branch_id: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /live/challenge`
pub async fn issue_challenge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ChallengeResponse>, RpcError> {
    require_api_key(&state, &headers)?;
    let tenant = resolve_tenant(&state, &headers).await?;

    let now = Timestamp::now();
    let challenge = state.issuer.issue(&tenant, now)?;
    state.stats.bump("challenges_issued");

    Ok(Json(ChallengeResponse {
        challenge: challenge.token.to_string(),
        action: challenge.action.as_str(),
        expires_in: challenge.expires_in(now),
    }))
}

/// `POST /live/verify`
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<VerifyResponse>, RpcError> {
    require_api_key(&state, &headers)?;
    let tenant = resolve_tenant(&state, &headers).await?;
    let submission = read_verify_request(multipart).await?;

    let now = Timestamp::now();
    match state
        .verifier
        .verify(
            &submission.token,
            submission.frames,
            &tenant,
            submission.uid_hint,
            now,
        )
        .await
    {
        Ok(result) => {
            state.stats.bump("verify_ok");
            Ok(Json(VerifyResponse {
                ok: result.ok,
                user_id: result.matched_identity.map(|id| id.0).unwrap_or(-1),
                confidence: result.confidence,
                branch_id: tenant.branch_id,
            }))
        }
        Err(e) => {
            state.stats.bump(if e.is_merit_failure() {
                "verify_failed"
            } else {
                "verify_rejected"
            });
            Err(e.into())
        }
    }
}

// ── Request plumbing ─────────────────────────────────────────────────────

fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), RpcError> {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented != Some(state.config.api_key.as_str()) {
        return Err(RpcError::InvalidApiKey);
    }
    Ok(())
}

async fn resolve_tenant(state: &AppState, headers: &HeaderMap) -> Result<TenantContext, RpcError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };
    let tenant = state
        .directory
        .resolve(
            header("x-org-id"),
            header("x-branch-code"),
            header("x-device-code"),
        )
        .await?;
    Ok(tenant)
}

struct VerifySubmission {
    token: ChallengeToken,
    uid_hint: Option<IdentityRef>,
    frames: FramePair,
}

async fn read_verify_request(mut multipart: Multipart) -> Result<VerifySubmission, RpcError> {
    let mut token = None;
    let mut uid_hint = None;
    let mut frame_a = None;
    let mut frame_b = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RpcError::bad_request("malformed_multipart", e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("challenge") => {
                let text = read_text(field).await?;
                token = Some(text.parse::<ChallengeToken>().map_err(|e| {
                    RpcError::bad_request("malformed_challenge", e.to_string())
                })?);
            }
            Some("uid_hint") => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    let uid: i64 = text.parse().map_err(|_| {
                        RpcError::bad_request("malformed_uid_hint", "uid_hint must be an integer")
                    })?;
                    uid_hint = Some(IdentityRef(uid));
                }
            }
            Some("frame_a") => frame_a = Some(read_frame(field).await?),
            Some("frame_b") => frame_b = Some(read_frame(field).await?),
            _ => {} // unknown parts are ignored
        }
    }

    let token = token.ok_or_else(|| RpcError::bad_request("missing_field", "challenge missing"))?;
    let frame_a = frame_a.ok_or_else(|| RpcError::bad_request("missing_field", "frame_a missing"))?;
    let frame_b = frame_b.ok_or_else(|| RpcError::bad_request("missing_field", "frame_b missing"))?;

    if !frame_a.looks_like_jpeg() || !frame_b.looks_like_jpeg() {
        return Err(RpcError::bad_request("bad_image", "Bad images"));
    }

    Ok(VerifySubmission {
        token,
        uid_hint,
        frames: FramePair::new(frame_a, frame_b),
    })
}

async fn read_text(field: Field<'_>) -> Result<String, RpcError> {
    field
        .text()
        .await
        .map_err(|e| RpcError::bad_request("malformed_multipart", e.to_string()))
}

/// Read a frame part. Capture clients stamp the capture instant into the
/// filename (`frame_a_<millis>.jpg`); when the stamp is absent the frame
/// is stamped at receipt, which is by construction inside the challenge
/// window.
async fn read_frame(field: Field<'_>) -> Result<CapturedFrame, RpcError> {
    let declared = field.file_name().and_then(capture_stamp_from_filename);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| RpcError::bad_request("malformed_multipart", e.to_string()))?;
    Ok(CapturedFrame::new(
        bytes.to_vec(),
        declared.unwrap_or_else(now_ms),
    ))
}

fn capture_stamp_from_filename(name: &str) -> Option<u64> {
    let stem = name
        .strip_suffix(".jpg")
        .or_else(|| name.strip_suffix(".jpeg"))?;
    let (_, stamp) = stem.rsplit_once('_')?;
    stamp.parse().ok()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::capture_stamp_from_filename;

    #[test]
    fn filename_stamps_parse() {
        assert_eq!(
            capture_stamp_from_filename("frame_a_1722945600000.jpg"),
            Some(1_722_945_600_000)
        );
        assert_eq!(
            capture_stamp_from_filename("frame_b_12345.jpeg"),
            Some(12_345)
        );
        assert_eq!(capture_stamp_from_filename("webcam.jpg"), None);
        assert_eq!(capture_stamp_from_filename("frame_a_xyz.jpg"), None);
        assert_eq!(capture_stamp_from_filename("frame_a_1.png"), None);
    }
}
