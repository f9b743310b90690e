use serde::{Deserialize, Serialize};

use crate::clinic::EmailDraft;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResponse {
    #[serde(flatten)]
    pub draft: EmailDraft,
    pub mailto_url: String,
}

impl From<EmailDraft> for EmailResponse {
    fn from(draft: EmailDraft) -> Self {
        let mailto_url = draft.mailto_url();
        Self { draft, mailto_url }
    }
}

#[derive(Debug, Serialize)]
pub struct RegistrationUrlResponse {
    pub url: String,
}
