//! Response bodies for the JSON endpoints

use serde::Serialize;
use std::collections::BTreeMap;

use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Request counters per instance, keyed by instance name
    pub instances: BTreeMap<String, MetricsSnapshot>,
    pub version: String,
}
