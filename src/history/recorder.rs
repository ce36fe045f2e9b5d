//! Bounded execution history with aggregate statistics.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use crate::history::record::ExecutionRecord;
use crate::registry::EndpointRegistry;

/// Point-in-time aggregate over the retained history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub active_endpoint_count: usize,
    pub healthy_endpoint_count: usize,
}

/// FIFO ring buffer of execution records.
#[derive(Debug)]
pub struct MetricsRecorder {
    records: Mutex<VecDeque<ExecutionRecord>>,
    capacity: usize,
}

impl MetricsRecorder {
    /// Create a recorder holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest when full.
    pub fn append(&self, record: ExecutionRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of every retained record, oldest first.
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Copy of the newest `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        let records = self.records.lock();
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Aggregate statistics plus endpoint counts from the registry.
    pub fn get_stats(&self, registry: &EndpointRegistry) -> RoutingStats {
        let records = self.records();

        let total_requests = records.len();
        let successful_requests = records.iter().filter(|r| r.is_success()).count();
        let avg_latency_ms = if total_requests > 0 {
            records.iter().map(|r| r.latency_ms).sum::<f64>() / total_requests as f64
        } else {
            0.0
        };

        RoutingStats {
            total_requests,
            successful_requests,
            success_rate: successful_requests as f64 / total_requests.max(1) as f64,
            avg_latency_ms,
            active_endpoint_count: registry.len(),
            healthy_endpoint_count: registry.healthy_count(),
        }
    }
}
