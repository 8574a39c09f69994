//! Validation of identity-provider tokens.
//!
//! The external identity provider authenticates the user (OAuth, magic link,
//! whatever) and hands the client a short-lived HS256 JWT over a shared
//! secret. This service only verifies it and reads the claims; who the user
//! "is" is entirely the provider's business.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims carried by an identity token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub iss: String,
    /// Stable user id; becomes the profile id on first sign-in.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Preferred UI language, if the provider knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Validate an identity token and return its claims.
pub fn validate_identity_token(
    token: &str,
    issuer: &str,
    secret: &str,
) -> Result<IdentityClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let key = DecodingKey::from_secret(secret.as_bytes());

    let data = jsonwebtoken::decode::<IdentityClaims>(token, &key, &validation)
        .map_err(|err| {
            tracing::debug!(?err, "identity token rejected");
            ApiError::unauthorized("Invalid identity token")
        })?;

    Ok(data.claims)
}
