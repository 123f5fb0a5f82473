//! Reviewable item kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Kind of artifact a workflow record reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    Procedure,
    PlanningProcedure,
    DocumentRequest,
    ChecklistItem,
    Pbc,
    Kyc,
    IsqmDocument,
    WorkingPaper,
}

impl ItemType {
    pub const ALL: [ItemType; 8] = [
        ItemType::Procedure,
        ItemType::PlanningProcedure,
        ItemType::DocumentRequest,
        ItemType::ChecklistItem,
        ItemType::Pbc,
        ItemType::Kyc,
        ItemType::IsqmDocument,
        ItemType::WorkingPaper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Procedure => "procedure",
            ItemType::PlanningProcedure => "planning-procedure",
            ItemType::DocumentRequest => "document-request",
            ItemType::ChecklistItem => "checklist-item",
            ItemType::Pbc => "pbc",
            ItemType::Kyc => "kyc",
            ItemType::IsqmDocument => "isqm-document",
            ItemType::WorkingPaper => "working-paper",
        }
    }

    /// Human readable label used in notification text
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Procedure => "Procedure",
            ItemType::PlanningProcedure => "Planning procedure",
            ItemType::DocumentRequest => "Document request",
            ItemType::ChecklistItem => "Checklist item",
            ItemType::Pbc => "PBC request",
            ItemType::Kyc => "KYC record",
            ItemType::IsqmDocument => "ISQM document",
            ItemType::WorkingPaper => "Working paper",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "Invalid item type '{}'. Expected one of: {}",
                    s,
                    ItemType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!("procedure".parse::<ItemType>().unwrap(), ItemType::Procedure);
        assert_eq!("isqm-document".parse::<ItemType>().unwrap(), ItemType::IsqmDocument);
        assert_eq!("pbc".parse::<ItemType>().unwrap(), ItemType::Pbc);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = "invoice".parse::<ItemType>().unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("working-paper"));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&ItemType::PlanningProcedure).unwrap();
        assert_eq!(json, "\"planning-procedure\"");

        for item_type in ItemType::ALL {
            let encoded = serde_json::to_value(item_type).unwrap();
            assert_eq!(encoded, serde_json::Value::String(item_type.to_string()));
        }
    }
}
