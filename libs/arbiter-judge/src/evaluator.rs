/// Case Evaluator - Verdict for a Single Test Case
///
/// **Core Responsibility:**
/// Run one test case through the execution client and decide pass/fail.
///
/// **Critical Properties:**
/// - Never returns an error; every failure is encoded in the CaseResult
/// - No retries here (wrap the client in `RetryingClient` for that)
/// - Execution failures are logged, not copied into the report
///
/// **Verdict Rules:**
/// - Execution failed: received = "Execution failed", every pass flag false
/// - `pass`: trimmed byte equality between output and expected
/// - `normalized_pass`: equality after `normalizer::normalize` on both sides
/// - `formatting_only`: normalized equality held where strict did not

use crate::engine::{ExecutionClient, ExecutionRequest};
use crate::normalizer;
use arbiter_common::types::{CaseResult, Language, TestCase};
use tracing::{debug, warn};

/// Build the verdict for an output the capability actually produced
pub fn judge_output(received: String, test_case: &TestCase) -> CaseResult {
    let pass = normalizer::strict_equal(&received, &test_case.expected_output);
    let normalized_pass = pass || normalizer::normalized_equal(&received, &test_case.expected_output);

    CaseResult {
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        received,
        pass,
        normalized_pass,
        formatting_only: !pass && normalized_pass,
        execution_failed: false,
    }
}

/// Execute and judge a single test case
pub async fn evaluate_case<C>(
    client: &C,
    code: &str,
    language: Language,
    test_case: &TestCase,
) -> CaseResult
where
    C: ExecutionClient + ?Sized,
{
    let request = ExecutionRequest {
        code,
        language,
        stdin: &test_case.input,
    };

    match client.execute(request).await {
        Ok(output) => {
            let result = judge_output(output.output, test_case);
            debug!(
                pass = result.pass,
                normalized_pass = result.normalized_pass,
                cpu_time = output.cpu_time.as_deref().unwrap_or("-"),
                "Case judged"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, language = %language, "Execution failed; case marked as failed");
            CaseResult::failed_execution(test_case)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ExecutionError, ExecutionOutput};
    use arbiter_common::types::EXECUTION_FAILED;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Helper to create a test case
    fn make_test_case(input: &str, expected_output: &str) -> TestCase {
        TestCase {
            input: input.to_string(),
            expected_output: expected_output.to_string(),
        }
    }

    /// Echoes a fixed reply regardless of input
    struct Fixed(Result<ExecutionOutput, ExecutionError>);

    #[async_trait]
    impl ExecutionClient for Fixed {
        async fn execute(&self, _request: ExecutionRequest<'_>) -> Result<ExecutionOutput, ExecutionError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_judge_exact_match() {
        let result = judge_output("120".to_string(), &make_test_case("5", "120"));
        assert!(result.pass);
        assert!(result.normalized_pass);
        assert!(!result.formatting_only);
        assert!(result.effective_pass());
    }

    #[test]
    fn test_judge_trailing_newline_is_strict_pass() {
        let result = judge_output("4\n".to_string(), &make_test_case("2 2", "4"));
        assert!(result.pass);
        assert_eq!(result.received, "4\n");
    }

    #[test]
    fn test_judge_case_sensitive() {
        let result = judge_output("hello".to_string(), &make_test_case("", "Hello"));
        assert!(!result.pass);
        assert!(!result.normalized_pass);
        assert!(!result.effective_pass());
    }

    #[test]
    fn test_judge_formatting_only_difference() {
        let result = judge_output("[1, 2, 3]\n".to_string(), &make_test_case("", "[1,2,3]"));
        assert!(!result.pass);
        assert!(result.normalized_pass);
        assert!(result.formatting_only);
        assert!(result.effective_pass());

        let result = judge_output("1  2\n3".to_string(), &make_test_case("", "1 2 3"));
        assert!(!result.pass);
        assert!(result.formatting_only);
    }

    #[test]
    fn test_judge_off_by_one_big_integer_fails() {
        // 25! is 15511210043330985984000000
        let result = judge_output(
            "15511210043330985984000001\n".to_string(),
            &make_test_case("25", "15511210043330985984000000"),
        );
        assert!(!result.pass);
        assert!(!result.normalized_pass);
        assert!(!result.effective_pass());
    }

    #[test]
    fn test_judge_empty_output() {
        let result = judge_output("   \n".to_string(), &make_test_case("", ""));
        assert!(result.pass);
    }

    #[tokio::test]
    async fn test_evaluate_case_success() {
        let client = Fixed(Ok(ExecutionOutput::new("Hello\n")));
        let result = evaluate_case(&client, "print('Hello')", Language::Python3, &make_test_case("", "Hello")).await;

        assert!(result.pass);
        assert!(!result.execution_failed);
        assert_eq!(result.received, "Hello\n");
        assert_eq!(result.expected, "Hello");
    }

    #[tokio::test]
    async fn test_evaluate_case_failure_uses_sentinel() {
        let client = Fixed(Err(ExecutionError::Timeout(Duration::from_secs(5))));
        let result = evaluate_case(&client, "while True: pass", Language::Python3, &make_test_case("1", "1")).await;

        assert!(!result.pass);
        assert!(!result.normalized_pass);
        assert!(result.execution_failed);
        assert_eq!(result.received, EXECUTION_FAILED);
        assert_eq!(result.input, "1");
    }

    #[tokio::test]
    async fn test_sentinel_never_passes_even_if_expected_matches() {
        // A problem whose expected output happens to equal the sentinel
        let client = Fixed(Err(ExecutionError::Transport("reset".to_string())));
        let result = evaluate_case(&client, "", Language::Python3, &make_test_case("", EXECUTION_FAILED)).await;

        assert!(!result.pass);
        assert!(!result.effective_pass());
    }
}
