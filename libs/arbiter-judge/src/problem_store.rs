// Problem store: where test cases and entry points come from
use arbiter_common::Problem;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("problem not found: {0}")]
    NotFound(String),

    #[error("failed to read problem file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse problem file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of problems for the pipeline
///
/// Returns the ordered test cases and the entry point of a problem.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn load(&self, problem_ref: &str) -> Result<Problem, StoreError>;
}

#[derive(Debug, Deserialize)]
struct ProblemsJson {
    problems: Vec<Problem>,
}

/// Problems loaded once from a JSON file
#[derive(Debug, Clone, Default)]
pub struct JsonProblemStore {
    problems: HashMap<String, Problem>,
}

impl JsonProblemStore {
    /// Load problems from problems.json
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: ProblemsJson =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::from_problems(parsed.problems))
    }

    pub fn from_problems(problems: Vec<Problem>) -> Self {
        let problems = problems
            .into_iter()
            .map(|problem| (problem.id.clone(), problem))
            .collect();
        Self { problems }
    }

    /// Problem ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.problems.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

#[async_trait]
impl ProblemStore for JsonProblemStore {
    async fn load(&self, problem_ref: &str) -> Result<Problem, StoreError> {
        self.problems
            .get(problem_ref)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(problem_ref.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::TestCase;

    fn sample_problem(id: &str) -> Problem {
        Problem {
            id: id.to_string(),
            title: "Add".to_string(),
            entry_point: "add".to_string(),
            test_cases: vec![TestCase {
                input: "1, 2".to_string(),
                expected_output: "3".to_string(),
                is_sample: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_load_known_and_unknown() {
        let store = JsonProblemStore::from_problems(vec![sample_problem("add")]);

        let problem = store.load("add").await.unwrap();
        assert_eq!(problem.entry_point, "add");

        assert!(matches!(
            store.load("missing").await,
            Err(StoreError::NotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("problems-{}.json", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"{
                "problems": [
                    {
                        "id": "two-sum",
                        "entry_point": "twoSum",
                        "test_cases": [
                            {"input": "[2,7,11,15], 9", "expected_output": "[0,1]", "is_sample": true},
                            {"input": "[3,2,4], 6", "expected_output": "[1,2]"}
                        ]
                    },
                    {"id": "echo", "title": "Echo", "entry_point": "echo", "test_cases": []}
                ]
            }"#,
        )
        .unwrap();

        let store = JsonProblemStore::load_from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(store.len(), 2);
        assert_eq!(store.ids(), vec!["echo", "two-sum"]);
        let problem = store.problems.get("two-sum").unwrap();
        assert_eq!(problem.test_cases.len(), 2);
        assert!(!problem.test_cases[1].is_sample);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/problems.json");
        assert!(matches!(
            JsonProblemStore::load_from_file(path),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let path = std::env::temp_dir().join(format!("problems-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "{ not json").unwrap();

        let result = JsonProblemStore::load_from_file(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }
}
