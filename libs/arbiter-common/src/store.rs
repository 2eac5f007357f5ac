// Problem lookup used by the evaluator
use crate::types::Problem;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Source of problems and their ordered test cases
///
/// `Ok(None)` means the id is unknown; `Err` is reserved for the store itself failing.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn get_problem(&self, problem_id: &str) -> Result<Option<Problem>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProblemStore {
    problems: HashMap<String, Problem>,
}

impl InMemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, problem: Problem) {
        self.problems.insert(problem.id.clone(), problem);
    }

    /// Load a file holding either one problem or an array of problems
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem file {}", path.display()))?;
        let problems = parse_problems(&content)
            .with_context(|| format!("Failed to parse problem file {}", path.display()))?;

        let mut store = Self::new();
        for problem in problems {
            store.insert(problem);
        }
        Ok(store)
    }

    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.problems.values()
    }
}

impl FromIterator<Problem> for InMemoryProblemStore {
    fn from_iter<I: IntoIterator<Item = Problem>>(iter: I) -> Self {
        let mut store = Self::new();
        for problem in iter {
            store.insert(problem);
        }
        store
    }
}

#[async_trait]
impl ProblemStore for InMemoryProblemStore {
    async fn get_problem(&self, problem_id: &str) -> Result<Option<Problem>> {
        Ok(self.problems.get(problem_id).cloned())
    }
}

pub fn parse_problems(content: &str) -> Result<Vec<Problem>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}
