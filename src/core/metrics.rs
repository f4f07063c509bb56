// src/core/metrics.rs

//! Prometheus metrics for server monitoring, registered once globally for
//! the process lifetime.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Gauge, TextEncoder,
};

lazy_static! {
    /// Whether this replica currently believes itself the leader (1) or not (0).
    pub static ref IS_LEADER: Gauge =
        register_gauge!("chatterd_is_leader", "1 if this replica is the current leader.").unwrap();

    /// The number of users currently held in memory.
    pub static ref USER_COUNT: Gauge =
        register_gauge!("chatterd_user_count", "Number of user accounts in the in-memory store.").unwrap();

    /// The number of messages currently held in memory.
    pub static ref MESSAGE_COUNT: Gauge =
        register_gauge!("chatterd_message_count", "Number of messages in the in-memory store.").unwrap();

    /// The total number of RPCs processed, labeled by method name.
    pub static ref RPCS_PROCESSED_TOTAL: CounterVec = register_counter_vec!(
        "chatterd_rpcs_processed_total",
        "Total number of RPCs processed, labeled by method.",
        &["method"]
    )
    .unwrap();

    /// The total number of successful fan-out pushes to followers.
    pub static ref FANOUT_TOTAL: Counter = register_counter!(
        "chatterd_replication_fanout_total",
        "Total number of successful replication fan-out pushes."
    )
    .unwrap();

    /// The total number of failed fan-out pushes to followers.
    pub static ref FANOUT_FAILURES_TOTAL: Counter = register_counter!(
        "chatterd_replication_fanout_failures_total",
        "Total number of failed replication fan-out pushes."
    )
    .unwrap();

    /// The total number of leader elections this replica has participated in.
    pub static ref ELECTIONS_TOTAL: Counter =
        register_counter!("chatterd_elections_total", "Total number of elections run.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
