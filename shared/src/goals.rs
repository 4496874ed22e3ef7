//! Goal descriptions referenced by board cells
//!
//! Goal files are JSON objects; every entry that is itself an object with a
//! non-empty `"Desc"` string contributes one goal. Anything else (metadata,
//! comments stored as strings) is skipped.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoalError {
    #[error("failed to parse goal file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("goal file contains no goal descriptions")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct GoalEntry {
    #[serde(rename = "Desc", default)]
    desc: Option<String>,
}

/// Ordered, duplicate-free goal list. Both sides must load the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalList {
    goals: Vec<String>,
}

impl GoalList {
    pub fn from_descriptions<I>(descriptions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut goals: Vec<String> = descriptions.into_iter().map(Into::into).collect();
        goals.sort();
        goals.dedup();
        Self { goals }
    }

    pub fn from_json_str(json: &str) -> Result<Self, GoalError> {
        let root: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let descriptions = root
            .into_values()
            .filter(serde_json::Value::is_object)
            .filter_map(|value| serde_json::from_value::<GoalEntry>(value).ok())
            .filter_map(|entry| entry.desc)
            .filter(|desc| !desc.is_empty());

        let list = Self::from_descriptions(descriptions);
        if list.is_empty() {
            return Err(GoalError::Empty);
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.goals.get(index).map(String::as_str)
    }

    /// Text for a cell's goal index, or a placeholder if the lists disagree
    pub fn describe(&self, goal_index: u8) -> &str {
        self.get(goal_index as usize).unwrap_or("<unknown goal>")
    }
}
