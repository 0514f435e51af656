//! Prometheus metrics for pipeline inputs, registered on the default
//! registry. Recording a metric never affects how an input behaves.

// External crates
use lazy_static::lazy_static;
use prometheus::{
    IntCounter, IntCounterVec, IntGauge, register_int_counter, register_int_counter_vec,
    register_int_gauge,
};

lazy_static! {
    // ======== read_until Lifecycle Metrics ========

    /// Number of read_until workers currently running
    pub static ref READ_UNTIL_RUNNING: IntGauge = register_int_gauge!(
        "pipeline_input_read_until_running",
        "Number of read_until workers currently running"
    ).expect("register pipeline_input_read_until_running");

    /// Wrapped inputs observed closing on their own
    pub static ref READ_UNTIL_INPUT_CLOSED: IntCounter = register_int_counter!(
        "pipeline_input_read_until_input_closed_total",
        "Number of times a wrapped input exhausted itself"
    ).expect("register pipeline_input_read_until_input_closed_total");

    /// Wrapped inputs recreated after exhaustion
    pub static ref READ_UNTIL_RESTART_SUCCESS: IntCounter = register_int_counter!(
        "pipeline_input_read_until_restart_success_total",
        "Number of wrapped inputs successfully recreated after exhaustion"
    ).expect("register pipeline_input_read_until_restart_success_total");

    /// Failed attempts to recreate a wrapped input
    pub static ref READ_UNTIL_RESTART_ERROR: IntCounter = register_int_counter!(
        "pipeline_input_read_until_restart_error_total",
        "Number of wrapped inputs that failed to be recreated after exhaustion"
    ).expect("register pipeline_input_read_until_restart_error_total");

    // ======== read_until Message Metrics ========

    /// Transactions read from wrapped inputs
    pub static ref READ_UNTIL_RECEIVED: IntCounter = register_int_counter!(
        "pipeline_input_read_until_received_total",
        "Number of transactions received from the wrapped input"
    ).expect("register pipeline_input_read_until_received_total");

    /// Transactions forwarded downstream unchanged
    pub static ref READ_UNTIL_PROPAGATED: IntCounter = register_int_counter!(
        "pipeline_input_read_until_propagated_total",
        "Number of transactions forwarded downstream unchanged"
    ).expect("register pipeline_input_read_until_propagated_total");

    /// Candidate final messages forwarded with an intercepted response
    pub static ref READ_UNTIL_FINAL_PROPAGATED: IntCounter = register_int_counter!(
        "pipeline_input_read_until_final_propagated_total",
        "Number of candidate final messages forwarded downstream"
    ).expect("register pipeline_input_read_until_final_propagated_total");

    /// Final responses relayed back to the wrapped input
    pub static ref READ_UNTIL_FINAL_RESPONSE_SENT: IntCounter = register_int_counter!(
        "pipeline_input_read_until_final_response_sent_total",
        "Number of candidate final responses relayed to the wrapped input"
    ).expect("register pipeline_input_read_until_final_response_sent_total");

    /// Candidate final messages rejected downstream
    pub static ref READ_UNTIL_FINAL_RESPONSE_ERROR: IntCounter = register_int_counter!(
        "pipeline_input_read_until_final_response_error_total",
        "Number of candidate final messages rejected downstream"
    ).expect("register pipeline_input_read_until_final_response_error_total");

    // ======== Stream Input Metrics ========

    /// Transactions sent by stream inputs, redeliveries included, by input type
    pub static ref STREAM_SENT: IntCounterVec = register_int_counter_vec!(
        "pipeline_input_stream_sent_total",
        "Number of transactions sent by stream inputs, including redeliveries",
        &["input"]
    ).expect("register pipeline_input_stream_sent_total");

    /// Transactions rejected or dropped downstream, by input type
    pub static ref STREAM_REJECTED: IntCounterVec = register_int_counter_vec!(
        "pipeline_input_stream_rejected_total",
        "Number of transactions rejected or dropped downstream",
        &["input"]
    ).expect("register pipeline_input_stream_rejected_total");
}
