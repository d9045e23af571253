//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and
/// the full body is logged at the `debug` level.
/// Bodies are passed on byte for byte. Only the logged copy is made lossy.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);
    tracing::info!(
        "Received request: {} {}\nbody: {}",
        parts.method,
        parts.uri,
        truncate(&body_text)
    );
    log_full_body("request", &body_text);

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes.clone())))
        .await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);
    tracing::info!(
        "Sending response: {}\nbody: {}",
        parts.status,
        truncate(&body_text)
    );
    log_full_body("response", &body_text);

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

/// Cut `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a
/// character.
fn truncate(body: &str) -> String {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return format!("{body:?}");
    }

    let end = (0..=LOG_BODY_LENGTH_LIMIT)
        .rev()
        .find(|index| body.is_char_boundary(*index))
        .unwrap_or(0);

    format!("{:?}...", &body[..end])
}

fn log_full_body(kind: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full {kind} body: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Bytes, middleware, routing::post};
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, truncate};

    #[tokio::test]
    async fn bodies_are_passed_on_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = Bytes::from_static(b"{\"name\": \"\xff\xfe\"}");

        let response = server.post("/echo").bytes(body.clone()).await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes(), &body);
    }

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate("{\"ok\":true}"), "\"{\\\"ok\\\":true}\"");
    }

    #[test]
    fn long_bodies_are_cut() {
        let body = "a".repeat(LOG_BODY_LENGTH_LIMIT + 10);

        let truncated = truncate(&body);

        assert_eq!(
            truncated,
            format!("{:?}...", "a".repeat(LOG_BODY_LENGTH_LIMIT))
        );
    }

    #[test]
    fn cut_does_not_split_characters() {
        let body = "ñ".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert_eq!(
            truncated,
            format!("{:?}...", "ñ".repeat(LOG_BODY_LENGTH_LIMIT / 2))
        );
    }
}
