//! Submission evaluation pipeline: normalizer, case evaluator, submission
//! executor and the client for the remote execution capability.

pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod normalizer;


pub use engine::{client_from_config, ExecutionClient, ExecutionError, HttpExecutionClient, RetryPolicy, RetryingClient};
pub use executor::{EvaluationError, SubmissionEvaluator};
