use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Runtimes the execution capability is asked to run
///
/// The serialized name doubles as the language identifier sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python3,
    Java,
    Cpp17,
    C,
    Rust,
    Go,
    Nodejs,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Python3,
        Language::Java,
        Language::Cpp17,
        Language::C,
        Language::Rust,
        Language::Go,
        Language::Nodejs,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python3" | "python" => Some(Language::Python3),
            "java" => Some(Language::Java),
            "cpp17" | "cpp" | "c++" => Some(Language::Cpp17),
            "c" => Some(Language::C),
            "rust" => Some(Language::Rust),
            "go" => Some(Language::Go),
            "nodejs" | "javascript" | "js" => Some(Language::Nodejs),
            _ => None,
        }
    }

    /// Runtime version index used when the language table has no entry
    pub fn default_version_index(&self) -> &'static str {
        match self {
            Language::Python3 => "3",
            Language::Java => "4",
            Language::Cpp17 => "1",
            Language::C => "5",
            Language::Rust => "4",
            Language::Go => "4",
            Language::Nodejs => "4",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python3 => "python3",
            Language::Java => "java",
            Language::Cpp17 => "cpp17",
            Language::C => "c",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Nodejs => "nodejs",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// Declaration order is the order results are reported in
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub problem_id: String,
    pub code: String,
    pub language: Language,
}

/// Caller identity, already verified upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

/// Placed in `received` when the execution capability could not produce output
pub const EXECUTION_FAILED: &str = "Execution failed";

/// Outcome of a single test case
///
/// `pass` is the strict verdict (trimmed byte equality). `normalized_pass`
/// compares after normalization and is always true when `pass` is.
/// `formatting_only` marks cases that only pass once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub input: String,
    pub expected: String,
    pub received: String,
    pub pass: bool,
    pub normalized_pass: bool,
    pub formatting_only: bool,
    pub execution_failed: bool,
}

impl CaseResult {
    pub fn failed_execution(test_case: &TestCase) -> Self {
        Self {
            input: test_case.input.clone(),
            expected: test_case.expected_output.clone(),
            received: EXECUTION_FAILED.to_string(),
            pass: false,
            normalized_pass: false,
            formatting_only: false,
            execution_failed: true,
        }
    }

    /// Strict or normalized equality
    pub fn effective_pass(&self) -> bool {
        self.pass || self.normalized_pass
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    pub problem_id: String,
    pub language: Language,
    pub results: Vec<CaseResult>,
    /// Cases passing strictly or after normalization
    pub passed: usize,
    /// Cases passing on trimmed byte equality alone
    pub strict_passed: usize,
    pub total: usize,
    pub all_passed: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl SubmissionReport {
    pub fn new(problem_id: &str, language: Language, results: Vec<CaseResult>) -> Self {
        let passed = results.iter().filter(|r| r.effective_pass()).count();
        let strict_passed = results.iter().filter(|r| r.pass).count();
        let total = results.len();

        Self {
            submission_id: Uuid::new_v4(),
            problem_id: problem_id.to_string(),
            language,
            results,
            passed,
            strict_passed,
            total,
            all_passed: total > 0 && passed == total,
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_result(pass: bool, normalized_pass: bool) -> CaseResult {
        CaseResult {
            input: String::new(),
            expected: String::new(),
            received: String::new(),
            pass,
            normalized_pass,
            formatting_only: !pass && normalized_pass,
            execution_failed: false,
        }
    }

    #[test]
    fn test_language_round_trip_names() {
        for language in Language::ALL {
            assert_eq!(Language::from_str(&language.to_string()), Some(language));
        }
        assert_eq!(Language::from_str("Python"), Some(Language::Python3));
        assert_eq!(Language::from_str("brainfuck"), None);
    }

    #[test]
    fn test_language_serde_matches_display() {
        let json = serde_json::to_string(&Language::Cpp17).unwrap();
        assert_eq!(json, "\"cpp17\"");
        let parsed: Language = serde_json::from_str("\"python3\"").unwrap();
        assert_eq!(parsed, Language::Python3);
    }

    #[test]
    fn test_failed_execution_result() {
        let tc = TestCase {
            input: "1".to_string(),
            expected_output: "2".to_string(),
        };
        let result = CaseResult::failed_execution(&tc);
        assert_eq!(result.received, EXECUTION_FAILED);
        assert!(!result.pass);
        assert!(!result.effective_pass());
        assert!(result.execution_failed);
    }

    #[test]
    fn test_report_counts_effective_passes() {
        let report = SubmissionReport::new(
            "p1",
            Language::Python3,
            vec![case_result(true, true), case_result(false, true), case_result(false, false)],
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.strict_passed, 1);
        assert!(!report.all_passed);
    }

    #[test]
    fn test_empty_report_is_not_a_full_pass() {
        let report = SubmissionReport::new("p1", Language::Python3, Vec::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.passed, 0);
        assert!(!report.all_passed);
    }

    #[test]
    fn test_problem_optional_fields_default() {
        let problem: Problem = serde_json::from_str(
            r#"{"id":"p1","title":"Sum","test_cases":[{"input":"1 2","expected_output":"3"}]}"#,
        )
        .unwrap();
        assert_eq!(problem.description, "");
        assert!(problem.input_format.is_none());
        assert_eq!(problem.test_cases.len(), 1);
    }
}
