use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

const HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    // JSON API: nothing should be loaded or framed
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
    // Quotes go stale within seconds
    ("cache-control", "no-store"),
];

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for &(name, value) in HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}
