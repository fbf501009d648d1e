//! HTTP client for the remote face engine.
//!
//! The engine is a separate inference service with a raw-bytes API: images
//! travel in the request body, parameters in the query string. This client
//! implements both analysis capabilities against it. Call budgets are
//! enforced by the verifier; the transport timeout here only guards
//! against a wedged connection outliving the whole verification.

use async_trait::async_trait;
use facegate_types::{CapturedFrame, IdentityRef, LivenessAction, TenantContext};
use serde::Deserialize;
use std::time::Duration;

use crate::capability::{ActionAnalyzer, CapabilityError, FaceMatcher, MatchCandidate};

const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the face engine's `/action` and `/identify` endpoints.
pub struct RemoteFaceEngine {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteFaceEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_bytes<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<T, CapabilityError> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .timeout(TRANSPORT_TIMEOUT)
            .send()
            .await
            .map_err(|e| CapabilityError(format!("face engine unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(CapabilityError(format!(
                "face engine returned HTTP {}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| CapabilityError(format!("malformed face engine reply: {e}")))
    }
}

#[derive(Deserialize)]
struct ActionReply {
    confidence: f64,
}

#[derive(Deserialize)]
struct IdentifyReply {
    user_id: Option<i64>,
    score: f64,
}

#[async_trait]
impl ActionAnalyzer for RemoteFaceEngine {
    async fn detect_action(
        &self,
        frame_a: &CapturedFrame,
        frame_b: &CapturedFrame,
        action: LivenessAction,
    ) -> Result<f64, CapabilityError> {
        // Both frames in one body; `split` marks where frame A ends.
        let url = format!(
            "{}?kind={}&split={}",
            self.endpoint("/action"),
            action.as_str(),
            frame_a.jpeg.len()
        );
        let mut body = Vec::with_capacity(frame_a.jpeg.len() + frame_b.jpeg.len());
        body.extend_from_slice(&frame_a.jpeg);
        body.extend_from_slice(&frame_b.jpeg);

        let reply: ActionReply = self.post_bytes(&url, body).await?;
        Ok(reply.confidence.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl FaceMatcher for RemoteFaceEngine {
    async fn match_identity(
        &self,
        frame: &CapturedFrame,
        tenant: &TenantContext,
        uid_hint: Option<IdentityRef>,
    ) -> Result<Option<MatchCandidate>, CapabilityError> {
        let mut url = format!(
            "{}?org_id={}&branch_id={}",
            self.endpoint("/identify"),
            tenant.org_id,
            tenant.branch_id
        );
        if let Some(hint) = uid_hint {
            url.push_str(&format!("&uid_hint={}", hint.0));
        }

        let reply: IdentifyReply = self.post_bytes(&url, frame.jpeg.clone()).await?;
        Ok(reply.user_id.map(|uid| MatchCandidate {
            identity: IdentityRef(uid),
            confidence: reply.score.clamp(0.0, 1.0),
        }))
    }
}
