//! Types that represent the core data model: the `AppDocument` and the records it owns.
mod amount;
mod attachment;
mod category;
mod customer;
mod expense;
mod income;
mod trip;

pub(crate) use amount::parse_decimal;
pub use amount::{number, Amount, AmountError};
pub use attachment::{Attachment, AttachmentRef};
pub use category::{ExpenseCategory, IncomeCategory, PaymentMethod};
pub use customer::Customer;
pub use expense::ExpenseEntry;
pub use income::IncomeEntry;
pub use trip::TripEntry;

use chrono::{Datelike, Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The single document that holds every record and setting of an installation. It is always
/// persisted whole. Fields missing from the stored JSON take their default values, so older files
/// keep loading as fields are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDocument {
    pub income_entries: Vec<IncomeEntry>,
    pub expense_entries: Vec<ExpenseEntry>,
    pub customers: Vec<Customer>,
    pub trip_log_entries: Vec<TripEntry>,
    pub fiscal_year: i32,
    pub company_name: String,
    pub tax_id: String,
    pub small_business_exempt: bool,
}

impl Default for AppDocument {
    fn default() -> Self {
        Self {
            income_entries: Vec::new(),
            expense_entries: Vec::new(),
            customers: Vec::new(),
            trip_log_entries: Vec::new(),
            fiscal_year: current_year(),
            company_name: String::new(),
            tax_id: String::new(),
            small_business_exempt: true,
        }
    }
}

/// The calendar year, in local time, at the moment of the call.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// A document with any subset of its top-level fields present. Used by import, which merges the
/// present fields over the current document and leaves the rest alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_entries: Option<Vec<IncomeEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_entries: Option<Vec<ExpenseEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<Vec<Customer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_log_entries: Option<Vec<TripEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_business_exempt: Option<bool>,
}

impl PartialDocument {
    /// Shallow merge: each present field replaces the corresponding field of `doc` wholesale.
    pub fn apply(self, doc: &mut AppDocument) {
        if let Some(v) = self.income_entries {
            doc.income_entries = v;
        }
        if let Some(v) = self.expense_entries {
            doc.expense_entries = v;
        }
        if let Some(v) = self.customers {
            doc.customers = v;
        }
        if let Some(v) = self.trip_log_entries {
            doc.trip_log_entries = v;
        }
        if let Some(v) = self.fiscal_year {
            doc.fiscal_year = v;
        }
        if let Some(v) = self.company_name {
            doc.company_name = v;
        }
        if let Some(v) = self.tax_id {
            doc.tax_id = v;
        }
        if let Some(v) = self.small_business_exempt {
            doc.small_business_exempt = v;
        }
    }
}

impl From<AppDocument> for PartialDocument {
    fn from(doc: AppDocument) -> Self {
        Self {
            income_entries: Some(doc.income_entries),
            expense_entries: Some(doc.expense_entries),
            customers: Some(doc.customers),
            trip_log_entries: Some(doc.trip_log_entries),
            fiscal_year: Some(doc.fiscal_year),
            company_name: Some(doc.company_name),
            tax_id: Some(doc.tax_id),
            small_business_exempt: Some(doc.small_business_exempt),
        }
    }
}

/// The settings part of the document. `None` leaves a setting unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub small_business_exempt: Option<bool>,
    pub fiscal_year: Option<i32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &SettingsUpdate::default()
    }
}

impl From<SettingsUpdate> for PartialDocument {
    fn from(s: SettingsUpdate) -> Self {
        Self {
            company_name: s.company_name,
            tax_id: s.tax_id,
            small_business_exempt: s.small_business_exempt,
            fiscal_year: s.fiscal_year,
            ..PartialDocument::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Income,
    Expense,
    Customer,
    Trip,
}

serde_plain::derive_display_from_serialize!(RecordKind);

/// Implemented by the four record types the document owns. It tells the document store which list
/// a record lives in so add, update and delete can be written once.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    fn list(doc: &AppDocument) -> &[Self];

    fn list_mut(doc: &mut AppDocument) -> &mut Vec<Self>;

    /// The year the record is booked in, for records that carry a date.
    fn year(&self) -> Option<i32> {
        None
    }

    fn attachments(&self) -> &[AttachmentRef] {
        &[]
    }

    /// `None` for record kinds that cannot carry attachments.
    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentRef>> {
        None
    }
}

fn year_of(date: &NaiveDate) -> Option<i32> {
    Some(date.year())
}

impl Record for IncomeEntry {
    const KIND: RecordKind = RecordKind::Income;

    fn id(&self) -> &str {
        &self.id
    }

    fn list(doc: &AppDocument) -> &[Self] {
        &doc.income_entries
    }

    fn list_mut(doc: &mut AppDocument) -> &mut Vec<Self> {
        &mut doc.income_entries
    }

    fn year(&self) -> Option<i32> {
        year_of(&self.date)
    }

    fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentRef>> {
        Some(&mut self.attachments)
    }
}

impl Record for ExpenseEntry {
    const KIND: RecordKind = RecordKind::Expense;

    fn id(&self) -> &str {
        &self.id
    }

    fn list(doc: &AppDocument) -> &[Self] {
        &doc.expense_entries
    }

    fn list_mut(doc: &mut AppDocument) -> &mut Vec<Self> {
        &mut doc.expense_entries
    }

    fn year(&self) -> Option<i32> {
        year_of(&self.date)
    }

    fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentRef>> {
        Some(&mut self.attachments)
    }
}

impl Record for Customer {
    const KIND: RecordKind = RecordKind::Customer;

    fn id(&self) -> &str {
        &self.id
    }

    fn list(doc: &AppDocument) -> &[Self] {
        &doc.customers
    }

    fn list_mut(doc: &mut AppDocument) -> &mut Vec<Self> {
        &mut doc.customers
    }
}

impl Record for TripEntry {
    const KIND: RecordKind = RecordKind::Trip;

    fn id(&self) -> &str {
        &self.id
    }

    fn list(doc: &AppDocument) -> &[Self] {
        &doc.trip_log_entries
    }

    fn list_mut(doc: &mut AppDocument) -> &mut Vec<Self> {
        &mut doc.trip_log_entries
    }

    fn year(&self) -> Option<i32> {
        year_of(&self.date)
    }
}

/// Generates a new record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let doc: AppDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, AppDocument::default());
        assert!(doc.small_business_exempt);
        assert_eq!(doc.fiscal_year, current_year());
    }

    #[test]
    fn test_missing_fields_fall_back_and_unknown_keys_ignored() {
        let json = r#"{
            "companyName": "Kurier Nord",
            "fiscalYear": 2023,
            "someFutureField": [1, 2, 3],
            "customers": [{"id": "c1", "company": "ACME"}]
        }"#;
        let doc: AppDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.company_name, "Kurier Nord");
        assert_eq!(doc.fiscal_year, 2023);
        assert_eq!(doc.customers.len(), 1);
        assert!(doc.income_entries.is_empty());
        assert!(doc.small_business_exempt);
        assert_eq!(doc.tax_id, "");
    }

    #[test]
    fn test_document_keys_are_camel_case() {
        let value = serde_json::to_value(AppDocument::default()).unwrap();
        for key in [
            "incomeEntries",
            "expenseEntries",
            "customers",
            "tripLogEntries",
            "fiscalYear",
            "companyName",
            "taxId",
            "smallBusinessExempt",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_partial_apply_is_shallow() {
        let mut doc = AppDocument {
            company_name: "Old".into(),
            tax_id: "12/345".into(),
            ..AppDocument::default()
        };
        let partial: PartialDocument =
            serde_json::from_str(r#"{"companyName": "New", "customers": []}"#).unwrap();
        partial.apply(&mut doc);
        assert_eq!(doc.company_name, "New");
        assert_eq!(doc.tax_id, "12/345");
    }

    #[test]
    fn test_settings_update_is_empty() {
        assert!(SettingsUpdate::default().is_empty());
        let s = SettingsUpdate {
            fiscal_year: Some(2024),
            ..SettingsUpdate::default()
        };
        assert!(!s.is_empty());
    }

    #[test]
    fn test_record_years() {
        let trip: TripEntry = serde_json::from_str(
            r#"{"id": "t1", "date": "2024-03-01", "kilometers": 12.5}"#,
        )
        .unwrap();
        assert_eq!(trip.year(), Some(2024));
        let customer = Customer::default();
        assert_eq!(customer.year(), None);
        assert!(customer.attachments().is_empty());
    }
}
