//! Request authentication.
//!
//! [`authenticate`] runs once per request and leaves an [`Identity`] in the
//! request extensions. Handlers take it through [`CurrentIdentity`] (any
//! caller) or [`AuthUser`] (authenticated callers only).

use super::tokens::Scope;
use super::{AuthError, AuthService, Identity};
use crate::types::{AppError, User};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Extracts the bearer secret from an `Authorization` header.
///
/// - no header, or an empty one: `Ok(None)`
/// - exactly `"Bearer <secret>"`: `Ok(Some(secret))`
/// - anything else: [`AuthError::MalformedHeader`]
pub fn parse_bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    if value.is_empty() {
        return Ok(None);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(secret), None) if !secret.is_empty() => Ok(Some(secret)),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Resolves the request headers to an identity.
pub async fn resolve_identity(auth_service: &AuthService, headers: &HeaderMap) -> Result<Identity, AppError> {
    match parse_bearer(headers)? {
        None => Ok(Identity::Anonymous),
        Some(secret) => {
            let user = auth_service.resolve(Scope::Authentication, secret).await?;
            Ok(Identity::from(user))
        }
    }
}

fn vary_on_authorization(mut response: Response) -> Response {
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

/// Authentication gate.
///
/// A request without credentials continues as [`Identity::Anonymous`]. A
/// malformed header or a token that does not resolve is rejected with 401
/// before the handler runs. Every response varies by `Authorization`.
pub async fn authenticate(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match resolve_identity(&auth_service, req.headers()).await {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "rejected request credentials");
            return vary_on_authorization(e.into_response());
        }
    };

    req.extensions_mut().insert(identity);

    vary_on_authorization(next.run(req).await)
}

/// The identity of the caller, possibly anonymous.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(
            parts.extensions.get::<Identity>().cloned().unwrap_or_default(),
        ))
    }
}

/// The authenticated caller. Anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Authenticated(user)) => Ok(AuthUser(user.clone())),
            Some(Identity::Anonymous) | None => Err(AuthError::AuthenticationRequired.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{clock::ManualClock, password::PlaintextPassword, tokens::auth_token_ttl};
    use crate::db::{DatabaseClient, TursoClient};
    use crate::types::NewUser;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use rstest::rstest;
    use tower::ServiceExt;

    async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> String {
        match identity.user() {
            Some(user) => user.username.clone(),
            None => "anonymous".to_string(),
        }
    }

    async fn gated_app() -> (Router, String) {
        let db: Arc<dyn DatabaseClient> = Arc::new(TursoClient::new_memory().await.unwrap());
        let auth_service = Arc::new(AuthService::new(db.clone(), Arc::new(ManualClock::starting_now())));

        let password_hash = auth_service
            .hash_password(&PlaintextPassword::new("secret123"))
            .unwrap();
        let user = db
            .create_user(&NewUser {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password_hash,
                bio: String::new(),
            })
            .await
            .unwrap();
        let token = auth_service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();

        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(auth_service, authenticate));

        (app, token.secret.into_inner())
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String, Option<HeaderValue>) {
        let mut request = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let vary = response.headers().get(header::VARY).cloned();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), vary)
    }

    #[tokio::test]
    async fn test_gate_passes_anonymous_through() {
        let (app, _) = gated_app().await;

        let (status, body, vary) = call(app, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
        assert_eq!(vary.unwrap(), "Authorization");
    }

    #[tokio::test]
    async fn test_gate_resolves_valid_token() {
        let (app, secret) = gated_app().await;

        let (status, body, _) = call(app, Some(&format!("Bearer {}", secret))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_gate_rejects_unknown_token_before_handler() {
        let (app, _) = gated_app().await;

        let (status, body, vary) = call(app, Some("Bearer nope")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("invalid or expired authentication token"));
        assert_eq!(vary.unwrap(), "Authorization");
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_no_header_is_anonymous() {
        assert!(matches!(parse_bearer(&HeaderMap::new()), Ok(None)));
    }

    #[test]
    fn test_empty_header_is_anonymous() {
        assert!(matches!(parse_bearer(&headers("")), Ok(None)));
    }

    #[test]
    fn test_well_formed_header() {
        let headers = headers("Bearer abc123");
        assert_eq!(parse_bearer(&headers).unwrap(), Some("abc123"));
    }

    #[rstest]
    #[case("abc123")]
    #[case("Bearer")]
    #[case("Bearer ")]
    #[case("bearer abc123")]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer abc 123")]
    #[case("Bearer  abc123")]
    #[case(" Bearer abc123")]
    fn test_malformed_header(#[case] value: &str) {
        assert!(matches!(
            parse_bearer(&headers(value)),
            Err(AuthError::MalformedHeader)
        ));
    }
}
