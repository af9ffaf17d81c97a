//! Per-request span, request id and completion log.
//!
//! Portal tokens never reach the logs: paths are redacted before they are
//! recorded and the caller is identified by tenant and artisan instead.

mod parent_context;
mod request_ids;
mod spans;

use std::time::{Duration, Instant};

use salvo::{
    Request, handler,
    http::StatusCode,
    prelude::{Depot, FlowCtrl, Response},
};
use tracing::{Instrument as _, Span, error, info, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt as _;

use portal_app::domain::{
    api_keys::records::AuthenticatedTenant, portal_tokens::records::PortalSession,
};

use super::{metrics, settings};

const METRICS_PATH: &str = "/metrics";
const REQUEST_ID_DEPOT_KEY: &str = "request_id";

#[handler]
pub(crate) async fn request_logging(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if req.uri().path() == METRICS_PATH {
        ctrl.call_next(req, depot, res).await;
        return;
    }

    let started = Instant::now();
    let _in_flight = metrics::InFlightRequestGuard::track();

    let request_id =
        request_ids::resolve_request_id(req.header::<String>(request_ids::REQUEST_ID_HEADER));

    depot.insert(REQUEST_ID_DEPOT_KEY, request_id.clone());
    request_ids::set_request_id_header(res, &request_id);

    let method = req.method().to_string();
    let path = spans::redact_tokens(req.uri().path());
    let names = spans::request_span_name(&method, &path);

    let span = tracing::info_span!(
        parent: None,
        "http.request",
        otel.name = %names.otel_span_name,
        otel.kind = "server",
        request_id = %request_id,
        method = %method,
        path = %path,
        remote_addr = %req.remote_addr(),
        tenant_uuid = tracing::field::Empty,
        artisan_id = tracing::field::Empty,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty
    );

    if settings::otel_parent_propagation_enabled()
        && let Some(parent_context) = parent_context::extract_parent_context(req.headers())
        && let Err(source) = span.set_parent(parent_context)
    {
        warn!("failed to set parent context on request span: {source}");
    }

    ctrl.call_next(req, depot, res)
        .instrument(span.clone())
        .await;

    record_caller(&span, depot);

    let status = request_ids::response_status_or_ok(res.status_code);
    let elapsed = started.elapsed();

    metrics::observe_request(
        &method,
        &names.otel_path,
        status.as_u16(),
        elapsed.as_secs_f64(),
    );

    span.in_scope(|| log_completion(status, elapsed));
}

/// Identify the caller once authentication has run.
fn record_caller(span: &Span, depot: &Depot) {
    if let Ok(tenant) = depot.obtain::<AuthenticatedTenant>() {
        span.record("tenant_uuid", tracing::field::display(tenant.tenant_uuid()));
    } else if let Ok(session) = depot.obtain::<PortalSession>() {
        span.record("tenant_uuid", tracing::field::display(session.tenant_uuid));
        span.record("artisan_id", session.artisan_id.as_str());
    }
}

fn log_completion(status: StatusCode, elapsed: Duration) {
    let status_code = status.as_u16();
    let duration_ms = elapsed.as_millis();
    let threshold_ms = u128::from(settings::slow_request_threshold_ms());

    Span::current().record("status", status_code);
    Span::current().record("duration_ms", duration_ms);

    if status.is_server_error() {
        error!(status = status_code, duration_ms, "request failed");
    } else if status.is_client_error() {
        warn!(status = status_code, duration_ms, "request rejected");
    } else {
        info!(status = status_code, duration_ms, "request completed");
    }

    if duration_ms > threshold_ms {
        warn!(duration_ms, threshold_ms, "slow request");
    }
}
