//! In-process counters reported periodically through `tracing`.
//!
//! A single [`Metrics`] value is created at startup and shared (usually as
//! `Arc<Metrics>`) with the HTTP layer. Counters are plain atomics; the
//! reporter only reads them, apart from the CPU and memory gauges it samples
//! on each tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use sysinfo::System;
use tokio::task::JoinHandle;

/// Service counters.
#[derive(Debug, Default)]
pub struct Metrics {
    get_requests: AtomicU64,
    post_requests: AtomicU64,
    put_requests: AtomicU64,
    delete_requests: AtomicU64,
    total_requests: AtomicU64,
    last_request_latency_ms: AtomicU64,

    active_users: AtomicU64,
    auth_successes: AtomicU64,
    auth_failures: AtomicU64,

    pizzas_sold: AtomicU64,
    revenue_bits: AtomicU64,
    order_failures: AtomicU64,
    last_order_latency_ms: AtomicU64,

    cpu_percent_bits: AtomicU64,
    memory_percent_bits: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub get_requests: u64,
    pub post_requests: u64,
    pub put_requests: u64,
    pub delete_requests: u64,
    pub total_requests: u64,
    pub last_request_latency_ms: u64,
    pub active_users: u64,
    pub auth_successes: u64,
    pub auth_failures: u64,
    pub pizzas_sold: u64,
    pub revenue: f64,
    pub order_failures: u64,
    pub last_order_latency_ms: u64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished HTTP request.
    pub fn record_request(&self, method: &str, latency: Duration) {
        let counter = match method {
            "GET" => Some(&self.get_requests),
            "POST" => Some(&self.post_requests),
            "PUT" => Some(&self.put_requests),
            "DELETE" => Some(&self.delete_requests),
            _ => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.last_request_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Count a login/registration attempt.
    pub fn record_auth(&self, success: bool) {
        if success {
            self.auth_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.auth_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A login opened a session.
    pub fn record_login(&self) {
        self.active_users.fetch_add(1, Ordering::Relaxed);
    }

    /// A session ended; never drops below zero.
    pub fn record_logout(&self) {
        let _ = self
            .active_users
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    /// Count an order attempt: items and revenue on success, a failure otherwise.
    pub fn record_order(&self, items: usize, revenue: f64, success: bool, latency: Duration) {
        self.last_order_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
        if !success {
            self.order_failures.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.pizzas_sold.fetch_add(items as u64, Ordering::Relaxed);
        let _ = self
            .revenue_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + revenue).to_bits())
            });
    }

    /// Store the latest host usage, clamped to 0..=100.
    pub fn record_system_usage(&self, cpu_percent: f64, memory_percent: f64) {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        self.cpu_percent_bits
            .store(clamp(cpu_percent).to_bits(), Ordering::Relaxed);
        self.memory_percent_bits
            .store(clamp(memory_percent).to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            get_requests: load(&self.get_requests),
            post_requests: load(&self.post_requests),
            put_requests: load(&self.put_requests),
            delete_requests: load(&self.delete_requests),
            total_requests: load(&self.total_requests),
            last_request_latency_ms: load(&self.last_request_latency_ms),
            active_users: load(&self.active_users),
            auth_successes: load(&self.auth_successes),
            auth_failures: load(&self.auth_failures),
            pizzas_sold: load(&self.pizzas_sold),
            revenue: f64::from_bits(load(&self.revenue_bits)),
            order_failures: load(&self.order_failures),
            last_order_latency_ms: load(&self.last_order_latency_ms),
            cpu_percent: f64::from_bits(load(&self.cpu_percent_bits)),
            memory_percent: f64::from_bits(load(&self.memory_percent_bits)),
        }
    }
}

/// Host CPU and memory usage sampler.
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // cpu usage is a delta between two refreshes
        system.refresh_cpu_usage();
        Self { system }
    }

    /// Global CPU usage and used-memory share, both in percent.
    pub fn sample(&mut self) -> (f64, f64) {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu = f64::from(self.system.global_cpu_usage());
        let total = self.system.total_memory();
        let memory = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f64 / total as f64 * 100.0
        };
        (cpu, memory)
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Log a snapshot every `period` until the returned handle is aborted.
pub fn spawn_reporter(metrics: Arc<Metrics>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sampler = SystemSampler::new();
        let mut ticker = tokio::time::interval(period);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (cpu, memory) = sampler.sample();
            metrics.record_system_usage(cpu, memory);
            let s = metrics.snapshot();
            tracing::info!(
                target: "metrics",
                get_requests = s.get_requests,
                post_requests = s.post_requests,
                put_requests = s.put_requests,
                delete_requests = s.delete_requests,
                total_requests = s.total_requests,
                last_request_latency_ms = s.last_request_latency_ms,
                active_users = s.active_users,
                auth_successes = s.auth_successes,
                auth_failures = s.auth_failures,
                pizzas_sold = s.pizzas_sold,
                revenue = s.revenue,
                order_failures = s.order_failures,
                last_order_latency_ms = s.last_order_latency_ms,
                cpu_percent = s.cpu_percent,
                memory_percent = s.memory_percent,
                "metrics snapshot"
            );
        }
    })
}
