// Metric emitters for the client's observability contract.
//
// One function per exported series keeps names and tags in a single place.
// Without the `telemetry` feature every emitter compiles to a no-op.

/// `connection_state_change` counter, tagged by the new state.
pub(crate) fn connection_state_change(state: &'static str) {
    #[cfg(feature = "telemetry")]
    metrics::counter!("connection_state_change", "state" => state).increment(1);
    #[cfg(not(feature = "telemetry"))]
    let _ = state;
}

/// `subscription_count` gauge, the current registry size.
pub(crate) fn subscription_count(count: usize) {
    #[cfg(feature = "telemetry")]
    metrics::gauge!("subscription_count").set(count as f64);
    #[cfg(not(feature = "telemetry"))]
    let _ = count;
}

/// `command` histogram in milliseconds, tagged by method and outcome.
pub(crate) fn command_duration(method: &'static str, success: bool, elapsed_ms: f64) {
    #[cfg(feature = "telemetry")]
    {
        let result = if success { "success" } else { "failure" };
        metrics::histogram!("command", "method" => method, "result" => result)
            .record(elapsed_ms);
    }
    #[cfg(not(feature = "telemetry"))]
    let _ = (method, success, elapsed_ms);
}

/// `message_received` counter, one per inbound transport frame.
pub(crate) fn message_received() {
    #[cfg(feature = "telemetry")]
    metrics::counter!("message_received").increment(1);
}

/// `push_received` counter, tagged by push body type.
pub(crate) fn push_received(push_type: &'static str) {
    #[cfg(feature = "telemetry")]
    metrics::counter!("push_received", "push_type" => push_type).increment(1);
    #[cfg(not(feature = "telemetry"))]
    let _ = push_type;
}

/// `websocket_error` counter, one per transport error callback.
pub(crate) fn websocket_error() {
    #[cfg(feature = "telemetry")]
    metrics::counter!("websocket_error").increment(1);
}
