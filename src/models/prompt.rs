//! Reusable prompt templates.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub template_text: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub version: Option<i32>,
    /// 1 when enabled, 0 when disabled.
    #[serde(default)]
    pub is_active: Option<i32>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl PromptTemplate {
    pub fn active(&self) -> bool {
        self.is_active == Some(1)
    }

    /// Substitute `{name}` placeholders with the given values.
    ///
    /// Unknown placeholders are left untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        vars.iter().fold(self.template_text.clone(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
    }
}

/// Request body for creating or updating a prompt. Updates carry the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub template_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Optional list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFilter {
    pub task_type: Option<String>,
    pub model: Option<String>,
}

impl PromptFilter {
    /// Non-empty filters as query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(t) = self.task_type.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("taskType", t));
        }
        if let Some(m) = self.model.as_deref().filter(|m| !m.is_empty()) {
            pairs.push(("model", m));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(text: &str) -> PromptTemplate {
        PromptTemplate {
            id: 1,
            name: "ner".to_string(),
            task_type: Some("ner".to_string()),
            description: None,
            template_text: text.to_string(),
            model: None,
            version: Some(1),
            is_active: Some(1),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_render_replaces_known_placeholders() {
        let t = template("Extract entities from {title}: {content} ({unknown})");
        let out = t.render(&[("title", "Memo"), ("content", "Paris")]);
        assert_eq!(out, "Extract entities from Memo: Paris ({unknown})");
    }

    #[test]
    fn test_filter_skips_empty_values() {
        let filter = PromptFilter {
            task_type: Some(String::new()),
            model: Some("deepseek-chat".to_string()),
        };
        assert_eq!(filter.query_pairs(), vec![("model", "deepseek-chat")]);
    }
}
