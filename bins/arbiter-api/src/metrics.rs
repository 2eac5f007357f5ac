// Prometheus metrics for submission evaluation

use arbiter_common::types::SubmissionReport;
use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("arbiter_submissions_total", "Submissions by outcome"),
        &["outcome"]
    )
    .expect("valid metric definition");

    pub static ref CASE_RESULTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("arbiter_case_results_total", "Test case results by verdict"),
        &["verdict"]
    )
    .expect("valid metric definition");

    pub static ref EVALUATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("arbiter_evaluation_seconds", "Wall time to evaluate one submission")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0])
    )
    .expect("valid metric definition");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry
            .register(Box::new(SUBMISSIONS_TOTAL.clone()))
            .expect("unique metric name");
        registry
            .register(Box::new(CASE_RESULTS_TOTAL.clone()))
            .expect("unique metric name");
        registry
            .register(Box::new(EVALUATION_SECONDS.clone()))
            .expect("unique metric name");
        registry
    };
}

pub fn record_report(report: &SubmissionReport) {
    let outcome = if report.all_passed { "accepted" } else { "rejected" };
    SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();

    for result in &report.results {
        let verdict = if result.execution_failed {
            "execution_failed"
        } else if result.pass {
            "pass"
        } else if result.formatting_only {
            "formatting_only"
        } else {
            "fail"
        };
        CASE_RESULTS_TOTAL.with_label_values(&[verdict]).inc();
    }
}

pub fn record_error(outcome: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Render the registry in the Prometheus text format
pub fn render() -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::types::{CaseResult, Language, TestCase};

    #[test]
    fn test_render_includes_recorded_metrics() {
        let tc = TestCase {
            input: String::new(),
            expected_output: "1".to_string(),
        };
        let report = SubmissionReport::new("p", Language::Python3, vec![CaseResult::failed_execution(&tc)]);
        record_report(&report);

        let text = render().unwrap();
        assert!(text.contains("arbiter_submissions_total"));
        assert!(text.contains("execution_failed"));
    }
}
