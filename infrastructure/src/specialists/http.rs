//! Remote specialist over HTTP
//!
//! POSTs `{case, prior_answers, deadline_ms}` as JSON and expects a
//! [`SpecialistOpinion`] back.

use async_trait::async_trait;
use council_application::{ConsultContext, SpecialistError, SpecialistPort};
use council_domain::{Case, SpecialistOpinion, SpecialistProfile};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct ConsultRequest<'a> {
    case: &'a Case,
    prior_answers: &'a [SpecialistOpinion],
    deadline_ms: u64,
}

pub struct HttpSpecialist {
    profile: SpecialistProfile,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSpecialist {
    pub fn new(profile: SpecialistProfile, endpoint: impl Into<String>) -> Self {
        Self::with_client(profile, endpoint, reqwest::Client::new())
    }

    pub fn with_client(
        profile: SpecialistProfile,
        endpoint: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            profile,
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpecialistPort for HttpSpecialist {
    fn profile(&self) -> &SpecialistProfile {
        &self.profile
    }

    async fn consult(
        &self,
        case: &Case,
        context: &ConsultContext,
    ) -> Result<SpecialistOpinion, SpecialistError> {
        let request = ConsultRequest {
            case,
            prior_answers: &context.prior_answers,
            deadline_ms: context.deadline.as_millis() as u64,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "case-council/0.1 (Specialist)")
            .timeout(context.deadline)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpecialistError::Timeout(context.deadline)
                } else if e.is_connect() {
                    SpecialistError::Unavailable(format!("{}: {}", self.endpoint, e))
                } else {
                    SpecialistError::Failed(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpecialistError::Failed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let mut opinion: SpecialistOpinion = response
            .json()
            .await
            .map_err(|e| SpecialistError::Failed(format!("malformed opinion: {}", e)))?;

        if opinion.domain.is_empty() {
            opinion.domain = self.profile.domain.clone();
        }
        debug!(
            specialist = %self.profile.id,
            status = %opinion.status,
            "remote specialist responded"
        );
        Ok(opinion)
    }
}
