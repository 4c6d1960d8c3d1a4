//! Access token claims

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Read the claims of a JWT without verifying it; the server does that
pub fn decode_claims(token: &str) -> DomainResult<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| DomainError::InvalidInput("malformed access token".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| DomainError::InvalidInput(format!("malformed access token: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| DomainError::InvalidInput(format!("malformed access token: {}", e)))
}
