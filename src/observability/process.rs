//! Baseline process metrics.
//!
//! Refreshed on every scrape: values are read at collection time rather
//! than tracked.

use std::sync::{Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use metrics::{describe_gauge, gauge};
use sysinfo::{Pid, System};

pub const PROCESS_PREFIX: &str = "taskflow_process_";

const UPTIME_SECONDS: &str = "taskflow_process_uptime_seconds";
const START_TIME_SECONDS: &str = "taskflow_process_start_time_seconds";
const RESIDENT_MEMORY_BYTES: &str = "taskflow_process_resident_memory_bytes";
const VIRTUAL_MEMORY_BYTES: &str = "taskflow_process_virtual_memory_bytes";
const RUNTIME_WORKERS: &str = "taskflow_process_runtime_workers";

/// What one refresh of the OS process table reported about this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSample {
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub start_time_seconds: u64,
    pub run_time_seconds: u64,
}

/// Samples process-level gauges into the active recorder.
#[derive(Debug)]
pub struct ProcessCollector {
    pid: Pid,
    system: Mutex<System>,
    started: Instant,
    start_time_unix: f64,
}

impl ProcessCollector {
    pub fn new() -> Self {
        let start_time_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self {
            pid: Pid::from_u32(std::process::id()),
            system: Mutex::new(System::new()),
            started: Instant::now(),
            start_time_unix,
        }
    }

    /// Register descriptions. Must run under the recorder being described.
    pub fn describe() {
        describe_gauge!(UPTIME_SECONDS, "Seconds since the process started");
        describe_gauge!(START_TIME_SECONDS, "Start time of the process since unix epoch in seconds");
        describe_gauge!(RESIDENT_MEMORY_BYTES, "Resident memory size in bytes");
        describe_gauge!(VIRTUAL_MEMORY_BYTES, "Virtual memory size in bytes");
        describe_gauge!(RUNTIME_WORKERS, "Number of async runtime worker threads");
    }

    /// Refresh this process's entry and read it back. `None` when the
    /// platform does not expose the process.
    pub fn sample(&self) -> Option<ProcessSample> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        if !system.refresh_process(self.pid) {
            return None;
        }
        let process = system.process(self.pid)?;
        Some(ProcessSample {
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            start_time_seconds: process.start_time(),
            run_time_seconds: process.run_time(),
        })
    }

    /// Update all gauges. Must run under the recorder being sampled.
    pub fn collect(&self) {
        match self.sample() {
            Some(sample) => {
                gauge!(UPTIME_SECONDS).set(sample.run_time_seconds as f64);
                gauge!(START_TIME_SECONDS).set(sample.start_time_seconds as f64);
                gauge!(RESIDENT_MEMORY_BYTES).set(sample.resident_memory_bytes as f64);
                gauge!(VIRTUAL_MEMORY_BYTES).set(sample.virtual_memory_bytes as f64);
            }
            None => {
                gauge!(UPTIME_SECONDS).set(self.started.elapsed().as_secs_f64());
                gauge!(START_TIME_SECONDS).set(self.start_time_unix);
            }
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            gauge!(RUNTIME_WORKERS).set(handle.metrics().num_workers() as f64);
        }
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}
