use crate::model::{Amount, AttachmentRef, IncomeCategory, PaymentMethod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single business income entry, e.g. an invoiced transport job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: Amount,
    #[serde(default)]
    pub category: IncomeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}
