//! Dispatch and client metrics.
//!
//! Recorded through the `metrics` facade; nothing is collected until the
//! host installs a recorder (Prometheus, StatsD, ...).
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `accord_requests_total` | Counter | `route`, `status` |
//! | `accord_request_duration_seconds` | Histogram | `route` |
//! | `accord_request_validation_failures_total` | Counter | `route`, `facet` |
//! | `accord_response_validation_failures_total` | Counter | `route`, `status` |
//! | `accord_unmatched_requests_total` | Counter | `method` |
//! | `accord_client_requests_total` | Counter | `route`, `status`, `known` |

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Requests dispatched.
pub const REQUESTS_TOTAL: &str = "accord_requests_total";
/// Dispatch duration.
pub const REQUEST_DURATION_SECONDS: &str = "accord_request_duration_seconds";
/// Requests rejected by validation, per failing facet.
pub const REQUEST_VALIDATION_FAILURES_TOTAL: &str = "accord_request_validation_failures_total";
/// Handler responses that broke their own contract.
pub const RESPONSE_VALIDATION_FAILURES_TOTAL: &str = "accord_response_validation_failures_total";
/// Requests no route matched.
pub const UNMATCHED_REQUESTS_TOTAL: &str = "accord_unmatched_requests_total";
/// Client calls completed.
pub const CLIENT_REQUESTS_TOTAL: &str = "accord_client_requests_total";

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests dispatched");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time from dispatch to response"
    );
    describe_counter!(
        REQUEST_VALIDATION_FAILURES_TOTAL,
        "Requests rejected by contract validation, per failing facet"
    );
    describe_counter!(
        RESPONSE_VALIDATION_FAILURES_TOTAL,
        "Handler responses that failed contract validation"
    );
    describe_counter!(UNMATCHED_REQUESTS_TOTAL, "Requests that matched no route");
    describe_counter!(CLIENT_REQUESTS_TOTAL, "Client calls by status");
}

/// Records a dispatched request.
pub fn record_request(route: &str, status: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
        .record(duration.as_secs_f64());
}

/// Records a request validation failure, once per failing facet.
pub fn record_request_validation_failure<'a>(route: &str, facets: impl IntoIterator<Item = &'a str>) {
    for facet in facets {
        counter!(
            REQUEST_VALIDATION_FAILURES_TOTAL,
            "route" => route.to_string(),
            "facet" => facet.to_string()
        )
        .increment(1);
    }
}

/// Records a response validation failure.
pub fn record_response_validation_failure(route: &str, status: u16) {
    counter!(
        RESPONSE_VALIDATION_FAILURES_TOTAL,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Records a request that matched no route.
pub fn record_unmatched(method: &str) {
    counter!(UNMATCHED_REQUESTS_TOTAL, "method" => method.to_string()).increment(1);
}

/// Records a completed client call.
pub fn record_client_request(route: &str, status: u16, known: bool) {
    counter!(
        CLIENT_REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status.to_string(),
        "known" => known.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_without_recorder() {
        describe_metrics();
        record_request("posts.getPost", 200, Duration::from_millis(10));
        record_request_validation_failure("posts.getPost", ["headers", "query"]);
        record_response_validation_failure("posts.getPost", 200);
        record_unmatched("GET");
        record_client_request("posts.getPost", 418, false);
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            REQUESTS_TOTAL,
            REQUEST_DURATION_SECONDS,
            REQUEST_VALIDATION_FAILURES_TOTAL,
            RESPONSE_VALIDATION_FAILURES_TOTAL,
            UNMATCHED_REQUESTS_TOTAL,
            CLIENT_REQUESTS_TOTAL,
        ] {
            assert!(name.starts_with("accord_"));
        }
    }
}
