//! Prompt complexity classification.
//!
//! Deterministic, case-insensitive keyword matching with prompt length as a
//! secondary signal. The complex check always runs first, so a short prompt
//! containing a complex keyword is still classified complex.

use crate::estimator::estimate_tokens;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keywords that mark a prompt as complex regardless of its length.
const COMPLEX_KEYWORDS: &[&str] = &[
    "architecture",
    "refactor project",
    "microservice",
    "design pattern",
    "migrate",
    "debug production",
    "memory leak",
    "concurrency",
    "race condition",
    "database schema",
    "monorepo",
    "performance optimization",
    "scalability",
    "security audit",
];

/// Keywords that mark a prompt as at least medium.
const MEDIUM_KEYWORDS: &[&str] = &[
    "refactor",
    "unit test",
    "integration test",
    "optimize",
    "performance",
    "bug",
    "error",
    "stack trace",
    "webpack",
    "vite",
    "component",
    "hook",
    "api integration",
    "database query",
];

/// Token thresholds for the length signal.
const COMPLEX_TOKEN_THRESHOLD: u32 = 8_000;
const MEDIUM_TOKEN_THRESHOLD: u32 = 2_000;

/// Three-level task complexity, used to bias backend selection.
///
/// Derived per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Medium,
    Complex,
}

impl fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskComplexity::Simple => write!(f, "simple"),
            TaskComplexity::Medium => write!(f, "medium"),
            TaskComplexity::Complex => write!(f, "complex"),
        }
    }
}

impl FromStr for TaskComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(TaskComplexity::Simple),
            "medium" => Ok(TaskComplexity::Medium),
            "complex" => Ok(TaskComplexity::Complex),
            _ => Err(format!("Unknown complexity: {}", s)),
        }
    }
}

/// Classify a prompt into simple/medium/complex.
pub fn classify(prompt: &str) -> TaskComplexity {
    let lowered = prompt.to_lowercase();
    let tokens = estimate_tokens(prompt);

    if tokens > COMPLEX_TOKEN_THRESHOLD || contains_any(&lowered, COMPLEX_KEYWORDS) {
        return TaskComplexity::Complex;
    }
    if tokens > MEDIUM_TOKEN_THRESHOLD || contains_any(&lowered, MEDIUM_KEYWORDS) {
        return TaskComplexity::Medium;
    }
    TaskComplexity::Simple
}

fn contains_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| lowered.contains(kw))
}
