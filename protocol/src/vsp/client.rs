//! HTTP client for the VSP API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FeeAddressResponse, PayFeeResponse, SignedBody, VspError, VspErrorBody, VspService};
use crate::config::{
    VSP_CLIENT_SIGNATURE_HEADER, VSP_FEE_ADDRESS_PATH, VSP_FEE_ALREADY_RECEIVED, VSP_PAY_FEE_PATH,
    VSP_REQUEST_TIMEOUT,
};

/// Talks to one VSP over HTTPS.
#[derive(Debug, Clone)]
pub struct VspHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl VspHttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, VspError> {
        Self::with_timeout(base_url, VSP_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VspError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VspError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &SignedBody) -> Result<T, VspError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "vsp request");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(VSP_CLIENT_SIGNATURE_HEADER, &body.signature)
            .body(body.json.clone())
            .send()
            .await
            .map_err(|e| VspError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VspError::Transport(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| VspError::InvalidResponse(format!("{e}: {text}")));
        }

        let err = classify_error(status.as_u16(), &text);
        warn!(%url, status = status.as_u16(), error = %err, "vsp request failed");
        Err(err)
    }
}

/// Maps a non-2xx answer to a [`VspError`].
pub(crate) fn classify_error(status: u16, text: &str) -> VspError {
    match serde_json::from_str::<VspErrorBody>(text) {
        Ok(body) if body.code == VSP_FEE_ALREADY_RECEIVED && matches!(status, 400 | 403) => {
            VspError::AlreadyPaid
        }
        Ok(body) => VspError::Api {
            status,
            code: body.code,
            message: body.message,
        },
        Err(_) => VspError::Api {
            status,
            code: -1,
            message: text.trim().to_string(),
        },
    }
}

#[async_trait]
impl VspService for VspHttpClient {
    async fn fee_address(&self, body: &SignedBody) -> Result<FeeAddressResponse, VspError> {
        self.post(VSP_FEE_ADDRESS_PATH, body).await
    }

    async fn pay_fee(&self, body: &SignedBody) -> Result<PayFeeResponse, VspError> {
        self.post(VSP_PAY_FEE_PATH, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_paid_needs_code_and_status() {
        let body = r#"{"code":3,"message":"fee tx already received for ticket"}"#;
        assert_eq!(classify_error(400, body), VspError::AlreadyPaid);
        assert_eq!(classify_error(403, body), VspError::AlreadyPaid);
        assert!(matches!(classify_error(500, body), VspError::Api { code: 3, .. }));
    }

    #[test]
    fn other_errors_keep_details() {
        let err = classify_error(400, r#"{"code":7,"message":"bad sig"}"#);
        assert_eq!(
            err,
            VspError::Api {
                status: 400,
                code: 7,
                message: "bad sig".into()
            }
        );
        assert!(matches!(
            classify_error(502, "Bad Gateway\n"),
            VspError::Api { status: 502, code: -1, .. }
        ));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let client = VspHttpClient::new("https://vsp.example.org/").unwrap();
        assert_eq!(client.base_url(), "https://vsp.example.org");
    }
}
