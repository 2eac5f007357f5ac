use crate::store::ProblemStore;
use crate::types::Problem;
use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};

/// Redis key layout for problem documents
/// Keeps the API and CLI agreeing on where problems live

pub const PROBLEM_PREFIX: &str = "arbiter:problem";
pub const PROBLEM_INDEX: &str = "arbiter:problems";

/// Generate deterministic key for a problem
pub fn problem_key(problem_id: &str) -> String {
    format!("{}:{}", PROBLEM_PREFIX, problem_id)
}

/// Store a problem as a JSON document and record its id in the index set
pub async fn put_problem(
    conn: &mut redis::aio::ConnectionManager,
    problem: &Problem,
) -> RedisResult<()> {
    let key = problem_key(&problem.id);
    let payload = serde_json::to_string(problem)
        .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, "serialization error", e.to_string())))?;

    let _: () = conn.set(&key, payload).await?;
    let _: () = conn.sadd(PROBLEM_INDEX, &problem.id).await?;

    Ok(())
}

/// Retrieve a problem, `None` if the key is absent
pub async fn get_problem(
    conn: &mut redis::aio::ConnectionManager,
    problem_id: &str,
) -> RedisResult<Option<Problem>> {
    let key = problem_key(problem_id);
    let payload: Option<String> = conn.get(&key).await?;

    match payload {
        Some(data) => {
            let problem: Problem = serde_json::from_str(&data)
                .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, "deserialization error", e.to_string())))?;
            Ok(Some(problem))
        }
        None => Ok(None),
    }
}

/// List ids of every stored problem
pub async fn list_problem_ids(conn: &mut redis::aio::ConnectionManager) -> RedisResult<Vec<String>> {
    let mut ids: Vec<String> = conn.smembers(PROBLEM_INDEX).await?;
    ids.sort();
    Ok(ids)
}

/// ProblemStore backed by a shared Redis connection manager
#[derive(Clone)]
pub struct RedisProblemStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisProblemStore {
    pub async fn connect(redis_url: &str) -> RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ProblemStore for RedisProblemStore {
    async fn get_problem(&self, problem_id: &str) -> anyhow::Result<Option<Problem>> {
        // ConnectionManager is a cheap handle onto one multiplexed connection
        let mut conn = self.conn.clone();
        Ok(get_problem(&mut conn, problem_id).await?)
    }
}
