//! Metrics recording.
//!
//! # Responsibilities
//! - Count segment publications and lost publish races
//! - Count built requests per builder and their wire size
//! - Track the active connection gauge
//!
//! # Metrics
//! - `transport_segments_published_total` (counter): by segment index
//! - `transport_segment_races_lost_total` (counter): speculative segments freed
//! - `transport_requests_built_total` (counter): by builder name
//! - `transport_request_bytes` (histogram): wire size of built requests
//! - `transport_full_requests_total` (counter): normalized requests by method
//! - `transport_active_connections` (gauge): registered, not yet closed
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the embedding engine installs a recorder
//! - Without a recorder every call is a no-op

/// Record a segment becoming visible to all threads.
pub fn record_segment_published(segment: usize) {
    ::metrics::counter!("transport_segments_published_total", "segment" => segment.to_string())
        .increment(1);
}

/// Record a speculative segment that lost the publish race.
pub fn record_publish_race_lost() {
    ::metrics::counter!("transport_segment_races_lost_total").increment(1);
}

/// Record a request assembled by one of the builders.
pub fn record_request_built(builder: &'static str, bytes: usize) {
    ::metrics::counter!("transport_requests_built_total", "builder" => builder).increment(1);
    ::metrics::histogram!("transport_request_bytes", "builder" => builder).record(bytes as f64);
}

/// Record a message rewritten into passthrough form.
pub fn record_full_request(method: &'static str) {
    ::metrics::counter!("transport_full_requests_total", "method" => method).increment(1);
}

/// Update the active connection gauge.
pub fn record_active_connections(count: usize) {
    ::metrics::gauge!("transport_active_connections").set(count as f64);
}
