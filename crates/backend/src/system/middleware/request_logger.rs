use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Logs every HTTP request with method, path, status, latency and
/// response size. The body is buffered to measure its real size.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(_) => {
            tracing::warn!(
                "{} {} -> {} ({}ms, body read failed)",
                method,
                uri.path(),
                parts.status.as_u16(),
                start.elapsed().as_millis()
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let duration = start.elapsed();
    if parts.status.is_success() {
        tracing::info!(
            "{} {} -> {} ({}ms, {} bytes)",
            method,
            uri.path(),
            parts.status.as_u16(),
            duration.as_millis(),
            bytes.len()
        );
    } else {
        tracing::warn!(
            "{} {} -> {} ({}ms, {} bytes)",
            method,
            uri.path(),
            parts.status.as_u16(),
            duration.as_millis(),
            bytes.len()
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}
