//! Captioning phase metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct CaptionMetrics;

impl CaptionMetrics {
    pub fn record_captioned(inference_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "captioning", "images_captioned")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "captioning", "inference_seconds"))
            .record(inference_secs);
    }

    pub fn record_failure() {
        ::metrics::counter!(phase_metric!(counter, "captioning", "images_failed")).increment(1);
    }

    pub fn record_matches(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "captioning", "records_matched"))
            .increment(count as u64);
    }

    pub fn record_overwrite() {
        ::metrics::counter!(phase_metric!(counter, "captioning", "captions_overwritten"))
            .increment(1);
    }
}

impl PhaseMetrics for CaptionMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "captioning", "images_captioned"));
        let _ = ::metrics::counter!(phase_metric!(counter, "captioning", "images_failed"));
        let _ = ::metrics::counter!(phase_metric!(counter, "captioning", "records_matched"));
        let _ = ::metrics::counter!(phase_metric!(counter, "captioning", "captions_overwritten"));
        let _ = ::metrics::histogram!(phase_metric!(histogram, "captioning", "inference_seconds"));
    }

    fn phase_name() -> &'static str {
        "captioning"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "captioning", "images_captioned"),
                metric_type: MetricType::Counter,
                help: "Images the model produced a caption for",
            },
            MetricDoc {
                name: phase_metric!(counter, "captioning", "images_failed"),
                metric_type: MetricType::Counter,
                help: "Images whose captioning call failed",
            },
            MetricDoc {
                name: phase_metric!(counter, "captioning", "records_matched"),
                metric_type: MetricType::Counter,
                help: "Record/image matches found by the joiner",
            },
            MetricDoc {
                name: phase_metric!(counter, "captioning", "captions_overwritten"),
                metric_type: MetricType::Counter,
                help: "Identifiers whose caption was replaced by a later matching image",
            },
            MetricDoc {
                name: phase_metric!(histogram, "captioning", "inference_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent in the captioning model per image",
            },
        ]
    }
}
