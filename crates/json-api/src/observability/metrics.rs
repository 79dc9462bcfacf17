//! Prometheus metrics collection and exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    orders_created_total: IntCounter,
    payments_reconciled_total: IntCounterVec,
    checkout_sessions_created_total: IntCounter,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        if let Some(metrics) = metrics() {
            metrics.requests_in_flight.inc();
            return Self { tracked: true };
        }

        Self { tracked: false }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_class = status_class(status_code);
    let status_code = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class, status_code.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Count an order placed directly by a customer.
pub(crate) fn record_order_created() {
    if let Some(metrics) = metrics() {
        metrics.orders_created_total.inc();
    }
}

/// Count a verified payment session, labelled `created` or `existing`.
pub(crate) fn record_payment_reconciled(outcome: &str) {
    if let Some(metrics) = metrics() {
        metrics
            .payments_reconciled_total
            .with_label_values(&[outcome])
            .inc();
    }
}

pub(crate) fn record_checkout_session_created() {
    if let Some(metrics) = metrics() {
        metrics.checkout_sessions_created_total.inc();
    }
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metric_families, &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    let content_type = match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => value,
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(String::from_utf8_lossy(&encoded).into_owned());
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = match IntCounterVec::new(
        Opts::new(
            "storefront_json_http_requests_total",
            "Total HTTP requests partitioned by method, route, status class, and status code.",
        ),
        &["method", "route", "status_class", "status_code"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create requests_total metric: {source}");
            return None;
        }
    };

    let request_duration_seconds = match HistogramVec::new(
        HistogramOpts::new(
            "storefront_json_http_request_duration_seconds",
            "HTTP request duration in seconds partitioned by method and route.",
        )
        .buckets(vec![
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "route"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create request_duration metric: {source}");
            return None;
        }
    };

    let requests_in_flight = match IntGauge::with_opts(Opts::new(
        "storefront_json_http_requests_in_flight",
        "Current number of in-flight HTTP requests.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create in-flight gauge metric: {source}");
            return None;
        }
    };

    let orders_created_total = match IntCounter::with_opts(Opts::new(
        "storefront_orders_created_total",
        "Orders placed directly by customers.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create orders_created metric: {source}");
            return None;
        }
    };

    let payments_reconciled_total = match IntCounterVec::new(
        Opts::new(
            "storefront_payments_reconciled_total",
            "Verified checkout sessions partitioned by whether a new order was written.",
        ),
        &["outcome"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create payments_reconciled metric: {source}");
            return None;
        }
    };

    let checkout_sessions_created_total = match IntCounter::with_opts(Opts::new(
        "storefront_checkout_sessions_created_total",
        "Hosted checkout sessions opened with the payment processor.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create checkout_sessions_created metric: {source}");
            return None;
        }
    };

    let collectors: [(&str, Box<dyn prometheus::core::Collector>); 6] = [
        ("requests_total", Box::new(requests_total.clone())),
        (
            "request_duration",
            Box::new(request_duration_seconds.clone()),
        ),
        ("in-flight gauge", Box::new(requests_in_flight.clone())),
        ("orders_created", Box::new(orders_created_total.clone())),
        (
            "payments_reconciled",
            Box::new(payments_reconciled_total.clone()),
        ),
        (
            "checkout_sessions_created",
            Box::new(checkout_sessions_created_total.clone()),
        ),
    ];

    for (name, collector) in collectors {
        if let Err(source) = registry.register(collector) {
            error!("failed to register {name} metric: {source}");
            return None;
        }
    }

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        orders_created_total,
        payments_reconciled_total,
        checkout_sessions_created_total,
    })
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        Router, Service,
        test::{ResponseExt, TestClient},
    };

    use super::*;

    async fn scrape() -> String {
        let service =
            Service::new(Router::new().push(Router::with_path("metrics").get(metrics_handler)));

        TestClient::get("http://example.com/metrics")
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_http_metrics() {
        observe_request("GET", "/api/products", 200, 0.042);
        observe_request("GET", "/api/products", 500, 0.123);

        let response = scrape().await;

        assert!(
            response.contains("storefront_json_http_requests_total"),
            "expected requests_total metric in response"
        );
        assert!(
            response.contains("storefront_json_http_request_duration_seconds"),
            "expected request_duration metric in response"
        );
        assert!(
            response.contains("storefront_json_http_requests_in_flight"),
            "expected in-flight metric in response"
        );
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_domain_counters() {
        record_order_created();
        record_checkout_session_created();
        record_payment_reconciled("created");
        record_payment_reconciled("existing");

        let response = scrape().await;

        assert!(
            response.contains("storefront_orders_created_total"),
            "expected orders_created counter"
        );
        assert!(
            response.contains("storefront_checkout_sessions_created_total"),
            "expected checkout_sessions_created counter"
        );
        assert!(
            response.contains(r#"storefront_payments_reconciled_total{outcome="created"}"#),
            "expected created outcome label"
        );
        assert!(
            response.contains(r#"storefront_payments_reconciled_total{outcome="existing"}"#),
            "expected existing outcome label"
        );
    }

    #[test]
    fn status_codes_are_grouped_by_class() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(409), "4xx");
        assert_eq!(status_class(502), "5xx");
        assert_eq!(status_class(42), "other");
    }
}
