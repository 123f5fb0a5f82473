//! Structured document queries
//!
//! Conditions name top-level fields of the serialized document, so a backend
//! can evaluate them where the data lives (SQL `WHERE data->>'field'`) instead
//! of loading every document. [`DocumentQuery::apply`] is the reference
//! evaluation used by backends that hold documents in memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Condition on one top-level document field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    /// String field equal to any of the values
    OneOf {
        field: &'static str,
        values: Vec<String>,
    },
    /// RFC 3339 timestamp field at or after `at`
    Since {
        field: &'static str,
        at: DateTime<Utc>,
    },
}

impl FieldCondition {
    fn matches(&self, document: &Value) -> bool {
        match self {
            FieldCondition::OneOf { field, values } => document
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            FieldCondition::Since { field, at } => {
                timestamp(document, field).is_some_and(|t| t >= *at)
            }
        }
    }
}

/// Conjunction of field conditions with optional ordering and paging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub conditions: Vec<FieldCondition>,
    /// Timestamp field to sort on
    pub order_by: Option<(&'static str, SortDirection)>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(self, field: &'static str, value: impl Into<String>) -> Self {
        self.one_of(field, [value.into()])
    }

    pub fn one_of<S: Into<String>>(
        mut self,
        field: &'static str,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.conditions.push(FieldCondition::OneOf {
            field,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn since(mut self, field: &'static str, at: DateTime<Utc>) -> Self {
        self.conditions.push(FieldCondition::Since { field, at });
        self
    }

    pub fn order_by(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.order_by = Some((field, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Same conditions without ordering or paging, for counting
    pub fn unpaged(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ..Default::default()
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// Filter, order and slice an in-memory collection
    pub fn apply<E: Serialize>(&self, entities: Vec<E>) -> Result<Vec<E>, DomainError> {
        let mut matched = Vec::new();

        for entity in entities {
            let document = serde_json::to_value(&entity)
                .map_err(|e| DomainError::storage(format!("Failed to serialize document: {}", e)))?;

            if self.matches(&document) {
                matched.push((document, entity));
            }
        }

        if let Some((field, direction)) = self.order_by {
            matched.sort_by(|(a, _), (b, _)| {
                let ordering = timestamp(a, field).cmp(&timestamp(b, field));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        Ok(matched
            .into_iter()
            .map(|(_, entity)| entity)
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect())
    }
}

fn timestamp(document: &Value, field: &str) -> Option<DateTime<Utc>> {
    document.get(field)?.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        name: &'static str,
        status: &'static str,
        seen_at: DateTime<Utc>,
    }

    fn docs() -> Vec<Doc> {
        let now = Utc::now();
        vec![
            Doc { name: "a", status: "open", seen_at: now - Duration::hours(3) },
            Doc { name: "b", status: "closed", seen_at: now - Duration::hours(2) },
            Doc { name: "c", status: "open", seen_at: now - Duration::hours(1) },
            Doc { name: "d", status: "held", seen_at: now },
        ]
    }

    fn names(docs: Vec<Doc>) -> Vec<&'static str> {
        docs.into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_one_of_and_ordering() {
        let query = DocumentQuery::new()
            .one_of("status", ["open", "held"])
            .order_by("seenAt", SortDirection::Descending);

        assert_eq!(names(query.apply(docs()).unwrap()), vec!["d", "c", "a"]);
    }

    #[test]
    fn test_since_and_paging() {
        let cutoff = Utc::now() - Duration::minutes(150);
        let query = DocumentQuery::new()
            .since("seenAt", cutoff)
            .order_by("seenAt", SortDirection::Ascending)
            .offset(1)
            .limit(1);

        assert_eq!(names(query.apply(docs()).unwrap()), vec!["c"]);
        assert_eq!(query.unpaged().apply(docs()).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_or_non_string_field_never_matches() {
        let query = DocumentQuery::new().equals("owner", "x");
        assert!(!query.matches(&json!({ "name": "a" })));
        assert!(!query.matches(&json!({ "owner": 7 })));
        assert!(query.matches(&json!({ "owner": "x" })));
    }

    #[test]
    fn test_empty_value_set_matches_nothing() {
        let query = DocumentQuery::new().one_of("status", Vec::<String>::new());
        assert!(query.apply(docs()).unwrap().is_empty());
    }

    #[test]
    fn test_huge_offset_yields_nothing() {
        let query = DocumentQuery::new().offset(usize::MAX).limit(10);
        assert!(query.apply(docs()).unwrap().is_empty());
    }
}
