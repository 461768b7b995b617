// Prometheus metrics for the execution engine.
//
// Cleanup failures are surfaced here as a gauge so leaked workspaces are
// observable instead of only a warn! line in the logs.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder,
};
use testit_engine::SessionRegistry;

lazy_static! {
    pub static ref BATCH_REQUESTS: IntCounter = register_int_counter!(
        "testit_batch_requests_total",
        "Batch execution requests received"
    )
    .expect("register batch requests counter");
    pub static ref JOBS_EXECUTED: IntCounter = register_int_counter!(
        "testit_jobs_executed_total",
        "Execution jobs run to a terminal state"
    )
    .expect("register jobs counter");
    static ref ACTIVE_SESSIONS: IntGauge = register_int_gauge!(
        "testit_active_sessions",
        "Live interactive sessions with a running job"
    )
    .expect("register sessions gauge");
    static ref CLEANUP_FAILURES: IntGauge = register_int_gauge!(
        "testit_workspace_cleanup_failures",
        "Workspace deletions that failed and leaked disk"
    )
    .expect("register cleanup gauge");
}

pub fn render(registry: &SessionRegistry) -> String {
    ACTIVE_SESSIONS.set(registry.active_sessions() as i64);
    CLEANUP_FAILURES.set(testit_engine::workspace::cleanup_failures() as i64);

    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&metric_families, &mut buf) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buf).unwrap_or_default()
}
