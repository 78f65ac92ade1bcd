use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::error::ApiError;
use super::state::AppState;

/// Bearer-token guard for the admin surface. When no token is configured
/// the guard lets requests through; local development runs without one.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    let presented = bearer_token(request.headers().get(axum::http::header::AUTHORIZATION));
    match presented {
        Some(token) if token_matches(&token, expected) => next.run(request).await,
        _ => {
            warn!(
                target = "canastra::http",
                path = %request.uri().path(),
                "admin request rejected"
            );
            ApiError::unauthorized().into_response()
        }
    }
}

fn bearer_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}

fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison_requires_exact_match() {
        assert!(token_matches("segredo", "segredo"));
        assert!(!token_matches("segredo", "segredo2"));
        assert!(!token_matches("", "segredo"));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let value = axum::http::HeaderValue::from_static("Token abc");
        assert_eq!(bearer_token(Some(&value)), None);

        let value = axum::http::HeaderValue::from_static("Bearer abc");
        assert_eq!(bearer_token(Some(&value)).as_deref(), Some("abc"));
    }
}
