//! Metrics for the dataset tools
//!
//! Each tool owns a phase submodule that defines its metrics. Short-lived
//! batch runs render the in-process registry at exit and push it to a
//! Pushgateway when one is configured.

pub mod captioning;
pub mod sampling;

pub use captioning::CaptionMetrics;
pub use sampling::SamplingMetrics;

use crate::constants::PUSHGATEWAY_URL_ENV;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::sync::{Once, OnceLock};
use std::time::Duration;
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every phase's metrics.
///
/// Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Metrics handle was already set");
            }
            register_all_metrics();
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
}

/// Render the current registry in Prometheus text format
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    fn phase_name() -> &'static str;

    /// Documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds metric names following `cdt_{phase}_{metric_name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("cdt_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("cdt_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("cdt_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

fn register_all_metrics() {
    let mut all_metrics = HashMap::new();
    register_phase_metrics::<SamplingMetrics>(&mut all_metrics);
    register_phase_metrics::<CaptionMetrics>(&mut all_metrics);
    info!("Registered {} metrics", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    for doc in T::metrics_documentation() {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict: '{}' registered again by phase '{}'",
                doc.name,
                T::phase_name()
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

/// Push the rendered registry to Pushgateway.
///
/// Does nothing unless `DATASET_TOOLS_PUSHGATEWAY_URL` is set. Failures are
/// logged and never abort the run.
pub fn push_to_pushgateway(job: &str) {
    let base = match std::env::var(PUSHGATEWAY_URL_ENV) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let Some(body) = render() else {
        warn!("pushgateway: metrics recorder not installed, skipping push");
        return;
    };

    let push_url = format!("{}/metrics/job/{}", base.trim_end_matches('/'), job);
    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!("pushgateway: failed to build client: {}", e);
            return;
        }
    };

    match client
        .post(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
    {
        Ok(r) if r.status().is_success() => {
            info!("pushgateway: pushed metrics for job={}", job);
        }
        Ok(r) => {
            warn!(
                "pushgateway: push responded with status {} for job={}",
                r.status().as_u16(),
                job
            );
        }
        Err(e) => {
            warn!("pushgateway: push request failed for job={}: {}", job, e);
        }
    }
}
