//! HTTP span helpers.

use uuid::Uuid;

/// Length of a raw portal token (32 bytes, hex encoded).
const PORTAL_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = normalise_path_for_span_name(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Replace raw portal tokens embedded in a path, e.g. `/v1/tokens/{token}/validate`.
pub(super) fn redact_tokens(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if looks_like_portal_token(segment) {
                "{token}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn looks_like_portal_token(segment: &str) -> bool {
    segment.len() == PORTAL_TOKEN_LEN && segment.chars().all(|c| c.is_ascii_hexdigit())
}

fn normalise_path_for_span_name(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut normalised = String::from("/");

    for (index, segment) in path.trim_start_matches('/').split('/').enumerate() {
        if index > 0 {
            normalised.push('/');
        }

        if Uuid::parse_str(segment).is_ok() {
            normalised.push_str("{uuid}");
        } else {
            normalised.push_str(segment);
        }
    }

    normalised
}
