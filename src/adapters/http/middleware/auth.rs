//! Authentication middleware and extractors for axum.
//!
//! - `auth_middleware` validates Bearer tokens and injects the user into
//!   request extensions
//! - `RequireAuth` extracts the authenticated user, rejecting with 401
//! - `RequireAdmin` additionally rejects non-admin roles with 403
//!
//! Routes that never need a caller identity (the gateway webhook, health)
//! simply don't use the extractors; the middleware passes unauthenticated
//! requests through untouched.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};

/// JWT claims carried by access tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    role: Role,
    #[allow(dead_code)]
    exp: usize,
}

/// Validates HMAC-signed bearer tokens.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(jwt_secret: &SecretString) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id: UserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

/// Auth middleware state.
pub type AuthState = Arc<TokenValidator>;

/// Validates the Bearer token if one is present and injects the user into
/// request extensions. Requests without a token continue unauthenticated;
/// `RequireAuth` decides per route whether that is acceptable.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match validator.validate(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                let (status, message) = match &e {
                    AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                    _ => (StatusCode::UNAUTHORIZED, "Invalid token"),
                };
                (
                    status,
                    Json(serde_json::json!({
                        "error_code": "AUTH_ERROR",
                        "message": message,
                    })),
                )
                    .into_response()
            }
        },
        None => next.run(request).await,
    }
}

/// Extractor that requires an authenticated caller.
pub struct RequireAuth(pub AuthenticatedUser);

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub AuthenticatedUser);

/// Rejection for missing or insufficient authentication.
pub enum AuthRejection {
    Unauthenticated,
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Authentication is required",
            ),
            AuthRejection::Forbidden => (
                StatusCode::FORBIDDEN,
                "ADMIN_REQUIRED",
                "Admin access is required",
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error_code": code,
                "message": message,
            })),
        )
            .into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthRejection::Unauthenticated)?;

        if !user.role.is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(RequireAdmin(user))
    }
}
