//! Raw records as the calling UI layer assembles them.
//!
//! Nothing here is validated. Numbers may arrive as JSON numbers or as the
//! strings a form field produced; the model builder coerces them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A JSON scalar that may hold a number either natively or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// The textual form, trimmed. Native numbers use their JSON spelling.
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Number(v.into())
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

/// Everything one slip is generated from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipInput {
    pub item: InventoryRecord,
    /// The person the item is currently assigned to, if any.
    #[serde(default)]
    pub assignee: Option<PersonnelRecord>,
    /// The school or office that owns the item.
    #[serde(default)]
    pub entity: Option<OrganizationRecord>,
    #[serde(default)]
    pub custody: CustodyMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryRecord {
    pub id: Option<Scalar>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Scalar>,
    pub unit: Option<String>,
    pub unit_price: Option<Scalar>,
    /// Caller-supplied total. Trusted as-is when it parses.
    pub total_cost: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonnelRecord {
    pub name: Option<String>,
    pub position: Option<String>,
}

impl PersonnelRecord {
    pub fn new(name: &str, position: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            position: Some(position.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationRecord {
    pub name: Option<String>,
}

/// Custody details the user typed into the slip form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustodyMetadata {
    pub fund_cluster: Option<String>,
    pub estimated_useful_life: Option<String>,
    pub transfer_date: Option<NaiveDate>,
    /// Generated when blank.
    pub document_number: Option<String>,
    /// Issuer. Signs the "Received from" block.
    pub received_from: Option<PersonnelRecord>,
    /// Recipient. Overrides the assignee record when present.
    pub received_by: Option<PersonnelRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_as_strings_or_numbers() {
        let item: InventoryRecord = serde_json::from_str(
            r#"{ "code": "LAP-01", "quantity": "3", "unitPrice": 150.5 }"#,
        )
        .unwrap();
        assert_eq!(item.quantity.unwrap().as_text(), "3");
        assert_eq!(item.unit_price.unwrap().as_text(), "150.5");
    }

    #[test]
    fn test_minimal_input() {
        let input: SlipInput = serde_json::from_str(r#"{ "item": {} }"#).unwrap();
        assert!(input.assignee.is_none());
        assert!(input.custody.transfer_date.is_none());
    }

    #[test]
    fn test_transfer_date_parses() {
        let custody: CustodyMetadata =
            serde_json::from_str(r#"{ "transferDate": "2025-03-15", "fundCluster": "01" }"#).unwrap();
        assert_eq!(
            custody.transfer_date,
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
    }
}
