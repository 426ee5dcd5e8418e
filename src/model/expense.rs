use crate::model::{Amount, AttachmentRef, ExpenseCategory, PaymentMethod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single business expense, usually backed by one or more receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: Amount,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}
