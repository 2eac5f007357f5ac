// CLI commands for Arbiter
use anyhow::{bail, Context, Result};
use arbiter_common::config::{ExecutionConfig, LanguageTable};
use arbiter_common::redis::{list_problem_ids, put_problem};
use arbiter_common::store::InMemoryProblemStore;
use arbiter_common::types::{Identity, Language, Problem, Submission, SubmissionReport};
use arbiter_judge::{client_from_config, normalizer, EvaluationError, SubmissionEvaluator};
use tokio_util::sync::CancellationToken;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Pick the problem to run from a loaded file
fn select_problem(store: &InMemoryProblemStore, id: Option<&str>) -> Result<Problem> {
    let mut problems: Vec<&Problem> = store.problems().collect();
    problems.sort_by(|a, b| a.id.cmp(&b.id));

    match (id, problems.as_slice()) {
        (Some(id), _) => problems
            .iter()
            .find(|p| p.id == id)
            .map(|p| (*p).clone())
            .ok_or_else(|| anyhow::anyhow!("Problem '{}' not found in file", id)),
        (None, [only]) => Ok((*only).clone()),
        (None, []) => bail!("Problem file is empty"),
        (None, _) => bail!("Problem file holds {} problems; pass --id", problems.len()),
    }
}

fn load_language_table() -> Result<LanguageTable> {
    let path = Path::new("config/languages.json");
    if path.exists() {
        LanguageTable::load(path)
    } else {
        Ok(LanguageTable::builtin())
    }
}

/// Render a report the way a person wants to read it
pub fn format_report(problem: &Problem, report: &SubmissionReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("📋 {} ({})\n\n", problem.title, problem.id));

    for (idx, result) in report.results.iter().enumerate() {
        let mark = if result.execution_failed {
            "💥 execution failed"
        } else if result.pass {
            "✓ passed"
        } else if result.formatting_only {
            "≈ passed (formatting differs)"
        } else {
            "✗ failed"
        };
        out.push_str(&format!("  Test {} → {}\n", idx + 1, mark));

        if !result.pass {
            out.push_str(&format!("    Expected: \"{}\"\n", result.expected.trim()));
            out.push_str(&format!("    Got:      \"{}\"\n", result.received.trim()));
        }
    }

    out.push_str(&format!(
        "\nScore: {} / {} (strict: {})\n",
        report.passed, report.total, report.strict_passed
    ));
    if report.all_passed {
        out.push_str("✅ All tests passed\n");
    } else {
        out.push_str("❌ Not all tests passed\n");
    }

    out
}

/// Evaluate a source file against a local problem file
pub async fn run_submission(
    problem_path: &Path,
    id: Option<&str>,
    code_path: &Path,
    language: &str,
    json: bool,
) -> Result<()> {
    let language = Language::from_str(language)
        .ok_or_else(|| anyhow::anyhow!("Unsupported language: {}", language))?;

    let store = InMemoryProblemStore::load_file(problem_path)?;
    let problem = select_problem(&store, id)?;

    let code = fs::read_to_string(code_path)
        .with_context(|| format!("Failed to read {}", code_path.display()))?;

    let config = ExecutionConfig::from_env()?;
    if config.client_id.is_empty() {
        eprintln!("⚠️  EXECUTION_CLIENT_ID is not set");
    }

    let parallelism = config.parallelism;
    let client = client_from_config(config, load_language_table()?)?;
    let evaluator = SubmissionEvaluator::new(Arc::new(store), client).with_parallelism(parallelism);

    let submission = Submission {
        problem_id: problem.id.clone(),
        code,
        language,
    };

    if !json {
        println!("🚀 Running {} test case(s) in {}...\n", problem.test_cases.len(), language);
    }

    // Ctrl-C abandons in-flight executions instead of waiting them out
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let report = match evaluator
        .evaluate_with_cancel(&Identity::new("cli"), &submission, &cancel)
        .await
    {
        Err(EvaluationError::Cancelled) => bail!("Interrupted; no report produced"),
        result => result?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&problem, &report));
    }

    Ok(())
}

/// Push every problem in a file into Redis
pub async fn import_problems(problem_path: &Path, redis_url: &str) -> Result<()> {
    let store = InMemoryProblemStore::load_file(problem_path)?;
    let mut problems: Vec<&Problem> = store.problems().collect();
    problems.sort_by(|a, b| a.id.cmp(&b.id));
    if problems.is_empty() {
        bail!("No problems found in {}", problem_path.display());
    }

    let client = redis::Client::open(redis_url)?;
    let mut conn = redis::aio::ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;

    for problem in problems {
        if problem.test_cases.is_empty() {
            eprintln!("⚠️  Problem '{}' has no test cases; submissions can never fully pass", problem.id);
        }
        put_problem(&mut conn, problem)
            .await
            .with_context(|| format!("Failed to store problem '{}'", problem.id))?;
        println!("📝 Imported {} ({} test cases)", problem.id, problem.test_cases.len());
    }

    let ids = list_problem_ids(&mut conn).await?;
    println!("\n✅ {} problem(s) now stored", ids.len());

    Ok(())
}

/// Print normalized output and, given an expected value, both verdicts
pub fn normalize_output(text: &str, expected: Option<&str>) {
    println!("{}", normalizer::normalize(text));

    if let Some(expected) = expected {
        println!("strict:     {}", normalizer::strict_equal(text, expected));
        println!("normalized: {}", normalizer::normalized_equal(text, expected));
    }
}

/// List all configured languages
pub fn list_languages(config_path: &Path) -> Result<()> {
    let (table, source) = if config_path.exists() {
        (LanguageTable::load(config_path)?, config_path.display().to_string())
    } else {
        (LanguageTable::builtin(), "built-in defaults".to_string())
    };

    println!("📋 Languages ({}):\n", source);
    println!("{:<12} {:<10} {:<8}", "Name", "Version", "Enabled");
    println!("{}", "─".repeat(32));

    for lang in Language::ALL {
        println!(
            "{:<12} {:<10} {:<8}",
            lang.to_string(),
            table.version_index(lang),
            if table.is_enabled(lang) { "yes" } else { "no" }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::types::{CaseResult, TestCase};

    fn problem(id: &str) -> Problem {
        Problem {
            id: id.to_string(),
            title: format!("Problem {}", id),
            description: String::new(),
            input_format: None,
            output_format: None,
            test_cases: vec![TestCase {
                input: "1".to_string(),
                expected_output: "1".to_string(),
            }],
        }
    }

    fn store_of(problems: Vec<Problem>) -> InMemoryProblemStore {
        problems.into_iter().collect()
    }

    #[test]
    fn test_select_single_problem_without_id() {
        let store = store_of(vec![problem("a")]);
        assert_eq!(select_problem(&store, None).unwrap().id, "a");
    }

    #[test]
    fn test_select_requires_id_for_many() {
        let store = store_of(vec![problem("a"), problem("b")]);
        assert!(select_problem(&store, None).is_err());
        assert_eq!(select_problem(&store, Some("b")).unwrap().id, "b");
        assert!(select_problem(&store, Some("c")).is_err());
        assert!(select_problem(&store_of(vec![]), None).is_err());
    }

    #[test]
    fn test_select_from_problem_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, serde_json::to_string(&vec![problem("a"), problem("b")]).unwrap()).unwrap();

        let store = InMemoryProblemStore::load_file(&path).unwrap();
        assert_eq!(select_problem(&store, Some("a")).unwrap().id, "a");
        assert!(InMemoryProblemStore::load_file(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_format_report_marks_each_case() {
        let p = problem("a");
        let passed = CaseResult {
            input: "1".to_string(),
            expected: "1".to_string(),
            received: "1\n".to_string(),
            pass: true,
            normalized_pass: true,
            formatting_only: false,
            execution_failed: false,
        };
        let formatting = CaseResult {
            received: "[1, 2]".to_string(),
            expected: "[1,2]".to_string(),
            pass: false,
            formatting_only: true,
            ..passed.clone()
        };
        let failed = CaseResult::failed_execution(&p.test_cases[0]);

        let report = SubmissionReport::new("a", Language::Python3, vec![passed, formatting, failed]);
        let text = format_report(&p, &report);

        assert!(text.contains("Test 1 → ✓ passed"));
        assert!(text.contains("Test 2 → ≈ passed (formatting differs)"));
        assert!(text.contains("Test 3 → 💥 execution failed"));
        assert!(text.contains("Score: 2 / 3 (strict: 1)"));
        assert!(text.contains("Not all tests passed"));
    }
}
