//! Organizer JWT authentication middleware.
//!
//! Guards the organizer routes. Validated identity is stored in request
//! extensions for the [`crate::extractors::UserAuth`] extractor.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use shared::jwt::{extract_user_id, JwtConfig};

/// Authenticated organizer extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// JWT ID (jti).
    pub jti: String,
}

impl UserAuth {
    /// Validates a token and returns the organizer identity.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt_config
            .validate_token(token)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let user_id =
            extract_user_id(&claims).map_err(|_| "Invalid user ID in token".to_string())?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
        })
    }

    /// Creates a JwtConfig from JwtAuthConfig.
    pub fn create_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, String> {
        JwtConfig::new(
            &config.secret,
            config.access_token_expiry_secs,
            config.leeway_secs,
        )
        .map_err(|e| format!("Failed to initialize JWT config: {}", e))
    }
}

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid organizer token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    let jwt_config = match UserAuth::create_jwt_config(&state.config.jwt) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to create JWT config: {}", e);
            return internal_error_response("Authentication service unavailable");
        }
    };

    match UserAuth::validate(&jwt_config, token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            unauthorized_response("Invalid or expired token")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jwt_config() -> JwtConfig {
        JwtConfig::new("middleware-test-secret", 900, 0).unwrap()
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_validate_round_trip() {
        let config = jwt_config();
        let user_id = Uuid::new_v4();
        let (token, jti) = config.generate_token(user_id).unwrap();

        let auth = UserAuth::validate(&config, &token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.jti, jti);
    }

    #[test]
    fn test_validate_rejects_foreign_secret() {
        let other = JwtConfig::new("another-secret", 900, 0).unwrap();
        let (token, _) = other.generate_token(Uuid::new_v4()).unwrap();

        assert!(UserAuth::validate(&jwt_config(), &token).is_err());
    }

    #[test]
    fn test_create_jwt_config_rejects_empty_secret() {
        let config = JwtAuthConfig {
            secret: String::new(),
            access_token_expiry_secs: 900,
            leeway_secs: 0,
        };
        assert!(UserAuth::create_jwt_config(&config).is_err());
    }

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Invalid or expired token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_error_response() {
        let response = internal_error_response("Authentication service unavailable");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
