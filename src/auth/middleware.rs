//! Bearer-token authentication stage.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{AuthError, TokenService};
use crate::error::AppError;
use crate::models::UserId;

/// The acting user, attached to the request by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
}

/// Rejects requests without a valid `Authorization: Bearer <token>` header
/// and exposes the token's subject to handlers as an `AuthUser` extension.
pub async fn require_auth(
    State(tokens): State<Arc<dyn TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials(
            "Authorization header is required",
        ))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty() && !token.contains(' '))
        .ok_or(AuthError::MissingCredentials(
            "Invalid authorization header format",
        ))?;

    let id = tokens.verify(token)?;
    debug!(user = %id, "authenticated request");
    request.extensions_mut().insert(AuthUser { id });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtTokens;
    use crate::models::User;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use chrono::Utc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(tokens: Arc<dyn TokenService>) -> Router {
        Router::new()
            .route(
                "/me",
                get(|Extension(user): Extension<AuthUser>| async move { user.id.to_string() }),
            )
            .route_layer(from_fn_with_state(tokens, require_auth))
    }

    fn tokens() -> Arc<dyn TokenService> {
        Arc::new(JwtTokens::new("test-secret", Duration::from_secs(60)))
    }

    async fn call(app: Router, auth: Option<&str>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let tokens = tokens();
        let user = User {
            id: UserId::new(),
            email: "a@b.co".into(),
            password_hash: String::new(),
            name: "A".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let token = tokens.issue(&user).unwrap();

        let status = call(app(tokens), Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        assert_eq!(call(app(tokens()), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(app(tokens()), Some("Token abc")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(app(tokens()), Some("Bearer not-a-jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
