//! Sampling phase metrics: records and media written by the splitter and filter.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::types::Split;

pub struct SamplingMetrics;

impl SamplingMetrics {
    pub fn record_split_written(split: Split, instances: usize, images: usize, missing: usize) {
        let label = split.as_str();
        ::metrics::counter!(phase_metric!(counter, "sampling", "records_written"), "split" => label)
            .increment(instances as u64);
        ::metrics::counter!(phase_metric!(counter, "sampling", "images_copied"), "split" => label)
            .increment(images as u64);
        ::metrics::counter!(phase_metric!(counter, "sampling", "images_missing"), "split" => label)
            .increment(missing as u64);
    }

    pub fn record_ignored(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "sampling", "records_ignored"))
            .increment(count as u64);
    }

    pub fn record_filtered(kept: usize, dropped: usize) {
        ::metrics::counter!(phase_metric!(counter, "sampling", "filter_kept"))
            .increment(kept as u64);
        ::metrics::counter!(phase_metric!(counter, "sampling", "filter_dropped"))
            .increment(dropped as u64);
    }

    pub fn record_pairing_mismatches(count: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "sampling", "pairing_mismatches")).set(count as f64);
    }
}

impl PhaseMetrics for SamplingMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "records_written"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "images_copied"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "images_missing"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "records_ignored"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "filter_kept"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sampling", "filter_dropped"));
        let _ = ::metrics::gauge!(phase_metric!(gauge, "sampling", "pairing_mismatches"));
    }

    fn phase_name() -> &'static str {
        "sampling"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "sampling", "records_written"),
                metric_type: MetricType::Counter,
                help: "Instance records written per split",
            },
            MetricDoc {
                name: phase_metric!(counter, "sampling", "images_copied"),
                metric_type: MetricType::Counter,
                help: "Media files copied per split",
            },
            MetricDoc {
                name: phase_metric!(counter, "sampling", "images_missing"),
                metric_type: MetricType::Counter,
                help: "Referenced media files not found on disk",
            },
            MetricDoc {
                name: phase_metric!(counter, "sampling", "records_ignored"),
                metric_type: MetricType::Counter,
                help: "Records left out because they reference no media",
            },
            MetricDoc {
                name: phase_metric!(counter, "sampling", "filter_kept"),
                metric_type: MetricType::Counter,
                help: "Instance records kept by the image-backed filter",
            },
            MetricDoc {
                name: phase_metric!(counter, "sampling", "filter_dropped"),
                metric_type: MetricType::Counter,
                help: "Instance records dropped by the image-backed filter",
            },
            MetricDoc {
                name: phase_metric!(gauge, "sampling", "pairing_mismatches"),
                metric_type: MetricType::Gauge,
                help: "Identifiers present in only one of instances/truth after the last run",
            },
        ]
    }
}
