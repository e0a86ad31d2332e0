/// Admin authentication extractor and token helpers
use crate::{context::AppContext, error::SiteError};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by admin bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

/// Admin authentication context - requires a configured admin role
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub subject: String,
    pub role: String,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = SiteError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| SiteError::Authentication("Missing authorization header".to_string()))?;

        let claims = verify_admin_token(&token, &state.config.authentication.jwt_secret)?;

        // Roles are plain strings; any configured admin role grants access
        if !state
            .config
            .authentication
            .admin_roles
            .iter()
            .any(|role| role == &claims.role)
        {
            tracing::warn!("AdminAuthContext: {} has role {}, not an admin", claims.sub, claims.role);
            return Err(SiteError::Authorization("Admin role required".to_string()));
        }

        Ok(AdminAuthContext {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Verify an admin JWT and return its claims
pub fn verify_admin_token(token: &str, jwt_secret: &str) -> Result<AdminClaims, SiteError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<AdminClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("JWT verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    SiteError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    SiteError::Authentication("Invalid token signature".to_string())
                }
                _ => SiteError::Authentication(format!("Invalid token: {}", e)),
            }
        })
}

/// Sign an admin token for `subject` with the given role, valid for `ttl`
pub fn issue_admin_token(jwt_secret: &str, subject: &str, role: &str, ttl: Duration) -> Result<String, SiteError> {
    let claims = AdminClaims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| SiteError::Internal(format!("Failed to sign token: {}", e)))
}
