/// Submission Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Resolve the problem, run every test case through the case evaluator and
/// aggregate the results into a SubmissionReport.
///
/// **Guarantees:**
/// 1. One CaseResult per test case, in declaration order
/// 2. No short-circuiting: a failing case never stops the rest
/// 3. Callers get a full report or a single error, never both
///
/// With `parallelism > 1` cases run concurrently; results are slotted by index
/// and reassembled before the report is built.

use crate::engine::ExecutionClient;
use crate::evaluator::evaluate_case;
use arbiter_common::store::ProblemStore;
use arbiter_common::types::{CaseResult, Identity, Language, Problem, Submission, SubmissionReport};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, Instrument};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("problem not found: {0}")]
    NotFound(String),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct SubmissionEvaluator {
    store: Arc<dyn ProblemStore>,
    client: Arc<dyn ExecutionClient>,
    parallelism: usize,
}

impl SubmissionEvaluator {
    pub fn new(store: Arc<dyn ProblemStore>, client: Arc<dyn ExecutionClient>) -> Self {
        Self {
            store,
            client,
            parallelism: 1,
        }
    }

    /// Evaluate up to `parallelism` cases at once; values below 1 mean sequential
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Look up a problem, mapping an unknown id to `NotFound`
    pub async fn resolve(&self, problem_id: &str) -> Result<Problem, EvaluationError> {
        self.store
            .get_problem(problem_id)
            .await?
            .ok_or_else(|| EvaluationError::NotFound(problem_id.to_string()))
    }

    /// Resolve the submission's problem and evaluate it
    pub async fn evaluate(
        &self,
        identity: &Identity,
        submission: &Submission,
    ) -> Result<SubmissionReport, EvaluationError> {
        let problem = self.resolve(&submission.problem_id).await?;
        Ok(self.evaluate_problem(identity, &problem, submission).await)
    }

    /// Evaluate a submission against a problem the caller already resolved
    #[instrument(skip(self, identity, problem, submission), fields(user = %identity.user_id, problem_id = %problem.id, language = %submission.language))]
    pub async fn evaluate_problem(
        &self,
        identity: &Identity,
        problem: &Problem,
        submission: &Submission,
    ) -> SubmissionReport {
        let report = self.run(problem, &submission.code, submission.language).await;

        info!(
            submission_id = %report.submission_id,
            passed = report.passed,
            strict_passed = report.strict_passed,
            total = report.total,
            "Submission evaluated"
        );

        report
    }

    /// Like `evaluate`, abandoning in-flight executions once `cancel` fires
    pub async fn evaluate_with_cancel(
        &self,
        identity: &Identity,
        submission: &Submission,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReport, EvaluationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EvaluationError::Cancelled),
            result = self.evaluate(identity, submission) => result,
        }
    }

    /// Run every test case of an already-resolved problem
    pub async fn run(&self, problem: &Problem, code: &str, language: Language) -> SubmissionReport {
        info!(
            problem_id = %problem.id,
            test_cases = problem.test_cases.len(),
            parallelism = self.parallelism,
            "Evaluating submission"
        );

        let results = if self.parallelism <= 1 {
            self.run_sequential(problem, code, language).await
        } else {
            self.run_parallel(problem, code, language).await
        };

        SubmissionReport::new(&problem.id, language, results)
    }

    async fn run_sequential(&self, problem: &Problem, code: &str, language: Language) -> Vec<CaseResult> {
        let mut results = Vec::with_capacity(problem.test_cases.len());

        for (idx, test_case) in problem.test_cases.iter().enumerate() {
            let span = tracing::debug_span!("case", case = idx + 1);
            let result = evaluate_case(self.client.as_ref(), code, language, test_case)
                .instrument(span)
                .await;
            results.push(result);
        }

        results
    }

    async fn run_parallel(&self, problem: &Problem, code: &str, language: Language) -> Vec<CaseResult> {
        let client = self.client.as_ref();

        // Completion order is arbitrary; slot by index to restore declaration order
        let mut slots: Vec<Option<CaseResult>> = vec![None; problem.test_cases.len()];

        // Futures are built eagerly (but stay lazy) so the borrowing closure
        // does not live inside the outer future's state
        let cases: Vec<_> = problem
            .test_cases
            .iter()
            .enumerate()
            .map(|(idx, test_case)| {
                let span = tracing::debug_span!("case", case = idx + 1);
                async move { (idx, evaluate_case(client, code, language, test_case).await) }.instrument(span)
            })
            .collect();

        let mut completed = stream::iter(cases).buffer_unordered(self.parallelism);

        while let Some((idx, result)) = completed.next().await {
            slots[idx] = Some(result);
        }

        slots
            .into_iter()
            .zip(&problem.test_cases)
            // Every index is yielded exactly once by the stream above
            .map(|(slot, test_case)| slot.unwrap_or_else(|| CaseResult::failed_execution(test_case)))
            .collect()
    }
}
