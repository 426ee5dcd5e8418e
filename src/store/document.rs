//! The document store: the in-memory source of truth for the `AppDocument` and its bridge to the
//! active document backend.
//!
//! Mutations apply to memory immediately. Persisting is debounced: every mutation raises a pending
//! flag and pokes a single background task, which waits until a full window passes without another
//! mutation and then writes the latest document. However many mutations land inside the window,
//! exactly one write happens and it carries the state after the last one.

use crate::model::{
    AppDocument, Customer, ExpenseEntry, IncomeEntry, PartialDocument, Record, SettingsUpdate,
    TripEntry,
};
use crate::store::backend::DocumentBackend;
use crate::store::context::StorageContext;
use crate::Result;
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// The quiet period used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Loads the document from the backends in `context`.
///
/// This never fails. Missing data yields the default document. Data that cannot be read or parsed
/// also yields the default document, after a warning in the log. When the primary backend is empty
/// and a legacy location is configured, a document found there is copied to the primary backend,
/// removed from the legacy location and returned.
pub async fn load_document(context: &StorageContext) -> AppDocument {
    let primary = context.documents();
    match primary.read().await {
        Ok(Some(text)) => return parse_or_default(&text, primary.as_ref()),
        Ok(None) => trace!("No document in {}", primary.describe()),
        Err(e) => {
            warn!("Unable to read the document, starting from defaults: {e:#}");
            return AppDocument::default();
        }
    }

    if let Some(legacy) = context.legacy_documents() {
        if let Some(doc) = migrate_legacy(primary.as_ref(), legacy.as_ref()).await {
            return doc;
        }
    }

    debug!("Starting with a new default document");
    AppDocument::default()
}

fn parse_or_default(text: &str, backend: &dyn DocumentBackend) -> AppDocument {
    match serde_json::from_str(text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(
                "The document in {} could not be parsed, starting from defaults: {e}",
                backend.describe()
            );
            AppDocument::default()
        }
    }
}

async fn migrate_legacy(
    primary: &dyn DocumentBackend,
    legacy: &dyn DocumentBackend,
) -> Option<AppDocument> {
    let text = match legacy.read().await {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            warn!("Unable to check {} for older data: {e:#}", legacy.describe());
            return None;
        }
    };
    let doc: AppDocument = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Ignoring unparseable data in {}: {e}", legacy.describe());
            return None;
        }
    };
    if let Err(e) = save_document(primary, &doc).await {
        // The legacy copy stays where it is so the next start can try again.
        error!("Unable to migrate older data: {e:#}");
        return Some(doc);
    }
    if let Err(e) = legacy.remove().await {
        warn!("Migrated older data but could not remove it from {}: {e:#}", legacy.describe());
    }
    info!(
        "Migrated data from {} to {}",
        legacy.describe(),
        primary.describe()
    );
    Some(doc)
}

/// Serializes the whole document and overwrites whatever `backend` held.
pub async fn save_document(backend: &dyn DocumentBackend, doc: &AppDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(doc).context("Unable to serialize the document")?;
    backend
        .write(&json)
        .await
        .with_context(|| format!("Unable to write the document to {}", backend.describe()))
}

/// State shared between the store handle and its background persist task.
#[derive(Debug)]
struct Shared {
    document: Mutex<AppDocument>,
    backend: Arc<dyn DocumentBackend>,
    /// Set under the document lock by every mutation, cleared when a write takes its snapshot.
    pending: AtomicBool,
    notify: Notify,
    /// Serializes writes so an older snapshot can never land after a newer one.
    write_gate: Mutex<()>,
    window: Duration,
}

impl Shared {
    /// Writes the current document if a mutation is waiting to be persisted.
    async fn persist_pending(&self) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let doc = self.document.lock().await;
            if !self.pending.swap(false, Ordering::SeqCst) {
                return Ok(false);
            }
            doc.clone()
        };
        if let Err(e) = save_document(self.backend.as_ref(), &snapshot).await {
            // Still unsaved, so the next flush tries again.
            self.pending.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(true)
    }
}

async fn run_persist_loop(shared: Arc<Shared>) {
    loop {
        shared.notify.notified().await;
        // Keep waiting while mutations keep arriving inside the window.
        while tokio::time::timeout(shared.window, shared.notify.notified())
            .await
            .is_ok()
        {}
        match shared.persist_pending().await {
            Ok(true) => trace!("Persisted document to {}", shared.backend.describe()),
            Ok(false) => {}
            Err(e) => error!("Unable to save the document, changes are only in memory: {e:#}"),
        }
    }
}

/// The single owner of the in-memory `AppDocument`.
///
/// Call [`DocumentStore::close`] before dropping the store to make sure the last mutations reach
/// the backend.
#[derive(Debug)]
pub struct DocumentStore {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl DocumentStore {
    /// Loads the document (see [`load_document`]) and starts the persist task.
    pub async fn open(context: &StorageContext, window: Duration) -> Self {
        let document = load_document(context).await;
        Self::with_document(document, context.documents(), window)
    }

    /// Wraps an already loaded document.
    pub fn with_document(
        document: AppDocument,
        backend: Arc<dyn DocumentBackend>,
        window: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            document: Mutex::new(document),
            backend,
            pending: AtomicBool::new(false),
            notify: Notify::new(),
            write_gate: Mutex::new(()),
            window,
        });
        let task = tokio::spawn(run_persist_loop(shared.clone()));
        Self { shared, task }
    }

    /// A copy of the current in-memory document.
    pub async fn snapshot(&self) -> AppDocument {
        self.shared.document.lock().await.clone()
    }

    /// Applies `f` to the in-memory document and schedules a debounced write. Returns whatever `f`
    /// returns.
    pub async fn mutate<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut AppDocument) -> T,
    {
        let out = {
            let mut doc = self.shared.document.lock().await;
            let out = f(&mut doc);
            self.shared.pending.store(true, Ordering::SeqCst);
            out
        };
        self.shared.notify.notify_one();
        out
    }

    /// True while a mutation has not been written yet.
    pub fn is_dirty(&self) -> bool {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Writes the current document right away, whether or not anything is pending.
    pub async fn save(&self) -> Result<()> {
        self.shared.pending.store(true, Ordering::SeqCst);
        self.shared.persist_pending().await.map(|_| ())
    }

    /// Writes now if a mutation is pending. Unlike the debounced write, a failure here is returned.
    pub async fn flush(&self) -> Result<()> {
        if self.shared.persist_pending().await? {
            debug!("Flushed document to {}", self.shared.backend.describe());
        }
        Ok(())
    }

    /// Flushes and stops the background task.
    pub async fn close(self) -> Result<()> {
        let result = self.flush().await;
        self.task.abort();
        result
    }

    /// Appends `record` to its list.
    pub async fn add<R: Record>(&self, record: R) {
        self.mutate(|doc| R::list_mut(doc).push(record)).await
    }

    /// Replaces the record with the same id. Returns `false`, and changes nothing, if no record
    /// has that id.
    pub async fn update<R: Record>(&self, record: R) -> bool {
        let replaced = self
            .mutate(|doc| {
                match R::list_mut(doc).iter_mut().find(|r| r.id() == record.id()) {
                    Some(slot) => {
                        *slot = record;
                        true
                    }
                    None => false,
                }
            })
            .await;
        if !replaced {
            debug!("update of unknown {} ignored", R::KIND);
        }
        replaced
    }

    /// Removes the record with `id`. Returns `false` if there was none. Attachment blobs the record
    /// referenced are left in the attachment store.
    pub async fn delete<R: Record>(&self, id: &str) -> bool {
        self.mutate(|doc| {
            let list = R::list_mut(doc);
            let before = list.len();
            list.retain(|r| r.id() != id);
            list.len() != before
        })
        .await
    }

    /// Returns a copy of the record with `id`.
    pub async fn find<R: Record>(&self, id: &str) -> Option<R> {
        let doc = self.shared.document.lock().await;
        R::list(&doc).iter().find(|r| r.id() == id).cloned()
    }

    /// Returns all records of a kind, optionally only those booked in `year`.
    pub async fn list<R: Record>(&self, year: Option<i32>) -> Vec<R> {
        let doc = self.shared.document.lock().await;
        R::list(&doc)
            .iter()
            .filter(|r| year.is_none() || r.year() == year)
            .cloned()
            .collect()
    }

    pub async fn add_income(&self, entry: IncomeEntry) {
        self.add(entry).await
    }

    pub async fn update_income(&self, entry: IncomeEntry) -> bool {
        self.update(entry).await
    }

    pub async fn delete_income(&self, id: &str) -> bool {
        self.delete::<IncomeEntry>(id).await
    }

    pub async fn add_expense(&self, entry: ExpenseEntry) {
        self.add(entry).await
    }

    pub async fn update_expense(&self, entry: ExpenseEntry) -> bool {
        self.update(entry).await
    }

    pub async fn delete_expense(&self, id: &str) -> bool {
        self.delete::<ExpenseEntry>(id).await
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.add(customer).await
    }

    pub async fn update_customer(&self, customer: Customer) -> bool {
        self.update(customer).await
    }

    pub async fn delete_customer(&self, id: &str) -> bool {
        self.delete::<Customer>(id).await
    }

    pub async fn add_trip(&self, trip: TripEntry) {
        self.add(trip).await
    }

    pub async fn update_trip(&self, trip: TripEntry) -> bool {
        self.update(trip).await
    }

    pub async fn delete_trip(&self, id: &str) -> bool {
        self.delete::<TripEntry>(id).await
    }

    pub async fn income_for_year(&self, year: i32) -> Vec<IncomeEntry> {
        self.list(Some(year)).await
    }

    pub async fn expenses_for_year(&self, year: i32) -> Vec<ExpenseEntry> {
        self.list(Some(year)).await
    }

    pub async fn trips_for_year(&self, year: i32) -> Vec<TripEntry> {
        self.list(Some(year)).await
    }

    /// Merges the supplied settings over the current ones.
    pub async fn update_settings(&self, settings: SettingsUpdate) {
        self.import_document(settings.into()).await
    }

    /// Shallow-merges every field present in `partial` over the current document.
    pub async fn import_document(&self, partial: PartialDocument) {
        self.mutate(|doc| partial.apply(doc)).await
    }

    /// Parses `text` as a (possibly partial) document and imports it. If the text does not parse,
    /// the in-memory document is left exactly as it was and the error is returned for display.
    pub async fn import_json(&self, text: &str) -> Result<()> {
        let partial: PartialDocument =
            serde_json::from_str(text).context("The file is not a valid haulbook backup")?;
        self.import_document(partial).await;
        Ok(())
    }

    /// The whole document as pretty JSON, suitable for `import_json`.
    pub async fn export_json(&self) -> Result<String> {
        let doc = self.snapshot().await;
        serde_json::to_string_pretty(&doc).context("Unable to serialize the document")
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!("Document store dropped with unsaved changes; call close() to persist them");
        }
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, AttachmentRef, IncomeCategory, PaymentMethod};
    use crate::store::memory::{MemoryAttachmentBackend, MemoryDocumentBackend};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn income(id: &str, amount: &str) -> IncomeEntry {
        IncomeEntry {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            description: "Pallet run Hamburg".to_string(),
            amount: Amount::from_str(amount).unwrap(),
            category: IncomeCategory::Transport,
            customer: Some("ACME".to_string()),
            invoice_number: Some("R-2024-001".to_string()),
            payment_method: PaymentMethod::BankTransfer,
            notes: None,
            attachments: Vec::new(),
        }
    }

    fn trip(id: &str, year: i32) -> TripEntry {
        TripEntry {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(year, 1, 2).unwrap(),
            origin: "Bremen".to_string(),
            destination: "Kiel".to_string(),
            kilometers: rust_decimal::Decimal::from(210),
            purpose: "Delivery".to_string(),
            customer: None,
            vehicle: None,
            license_plate: None,
            notes: None,
        }
    }

    fn memory_context(backend: Arc<MemoryDocumentBackend>) -> StorageContext {
        StorageContext::new(backend, Arc::new(MemoryAttachmentBackend::new()))
    }

    #[tokio::test]
    async fn test_load_empty_backend_gives_defaults() {
        let context = memory_context(Arc::new(MemoryDocumentBackend::new()));
        let doc = load_document(&context).await;
        assert_eq!(doc, AppDocument::default());
        assert!(doc.small_business_exempt);
        assert_eq!(doc.fiscal_year, crate::model::current_year());
    }

    #[tokio::test]
    async fn test_load_garbage_gives_defaults() {
        let backend = Arc::new(MemoryDocumentBackend::with_contents("{not json"));
        let doc = load_document(&memory_context(backend)).await;
        assert_eq!(doc, AppDocument::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let mut doc = AppDocument {
            company_name: "Kurier Nord".to_string(),
            tax_id: "12/345/67890".to_string(),
            fiscal_year: 2024,
            small_business_exempt: false,
            ..AppDocument::default()
        };
        let mut entry = income("a", "100.10");
        entry.attachments.push(AttachmentRef::for_upload("x.png", &[1, 2, 3]));
        doc.income_entries.push(entry);
        doc.trip_log_entries.push(trip("t", 2024));

        save_document(backend.as_ref(), &doc).await.unwrap();
        let loaded = load_document(&memory_context(backend)).await;
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_legacy_document_is_migrated_once() {
        let primary = Arc::new(MemoryDocumentBackend::new());
        let legacy = Arc::new(MemoryDocumentBackend::with_contents(
            r#"{"companyName": "Old Books"}"#,
        ));
        let context = memory_context(primary.clone()).with_legacy_documents(legacy.clone());

        let doc = load_document(&context).await;
        assert_eq!(doc.company_name, "Old Books");
        assert!(doc.small_business_exempt);
        assert_eq!(primary.writes(), 1);
        assert!(legacy.contents().await.is_none());

        let again = load_document(&context).await;
        assert_eq!(again, doc);
        assert_eq!(primary.writes(), 1);
    }

    #[tokio::test]
    async fn test_failed_migration_keeps_legacy_copy() {
        let primary = Arc::new(MemoryDocumentBackend::new());
        primary.set_fail_writes(true);
        let legacy_json = r#"{"companyName": "Old Books", "fiscalYear": 2022}"#;
        let legacy = Arc::new(MemoryDocumentBackend::with_contents(legacy_json));
        let context = memory_context(primary.clone()).with_legacy_documents(legacy.clone());

        let doc = load_document(&context).await;
        assert_eq!(doc.company_name, "Old Books");
        assert_eq!(doc.fiscal_year, 2022);
        assert_eq!(primary.writes(), 0);
        assert!(primary.contents().await.is_none());
        assert_eq!(legacy.contents().await.as_deref(), Some(legacy_json));

        // Once the primary accepts writes the next load finishes the move.
        primary.set_fail_writes(false);
        assert_eq!(load_document(&context).await, doc);
        assert_eq!(primary.writes(), 1);
        assert!(legacy.contents().await.is_none());
    }

    #[tokio::test]
    async fn test_high_precision_amounts_round_trip() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let mut doc = AppDocument::default();
        doc.income_entries.push(income("a", "1234567890123.45"));
        doc.income_entries.push(income("b", "0.07"));
        let mut long_trip = trip("t", 2024);
        long_trip.kilometers = rust_decimal::Decimal::from_str("98765.4321").unwrap();
        doc.trip_log_entries.push(long_trip);

        save_document(backend.as_ref(), &doc).await.unwrap();
        let loaded = load_document(&memory_context(backend)).await;
        assert_eq!(loaded, doc);

        // Amounts a JSON number cannot hold exactly never get into the document.
        assert!(Amount::from_str("12345678901234567.89").is_err());
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        let import = r#"{"incomeEntries": [{"id": "x", "date": "2024-01-01",
            "amount": "12345678901234567.89"}]}"#;
        assert!(store.import_json(import).await.is_err());
        assert!(store.snapshot().await.income_entries.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_is_ignored_when_primary_has_data() {
        let primary = Arc::new(MemoryDocumentBackend::with_contents(
            r#"{"companyName": "Current"}"#,
        ));
        let legacy = Arc::new(MemoryDocumentBackend::with_contents(
            r#"{"companyName": "Old"}"#,
        ));
        let context = memory_context(primary).with_legacy_documents(legacy.clone());
        assert_eq!(load_document(&context).await.company_name, "Current");
        assert!(legacy.contents().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_inside_window_coalesce_into_one_write() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let store = DocumentStore::open(&memory_context(backend.clone()), DEFAULT_DEBOUNCE).await;

        for i in 0..5 {
            store
                .mutate(|doc| doc.company_name = format!("name {i}"))
                .await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(backend.writes(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.writes(), 1);
        let persisted: AppDocument =
            serde_json::from_str(&backend.contents().await.unwrap()).unwrap();
        assert_eq!(persisted.company_name, "name 4");
        assert!(!store.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_in_separate_windows_write_separately() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let store = DocumentStore::open(&memory_context(backend.clone()), DEFAULT_DEBOUNCE).await;

        store.add_income(income("a", "1")).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        store.add_income(income("b", "2")).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(backend.writes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_debounced_write_keeps_memory_state() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        backend.set_fail_writes(true);
        let store = DocumentStore::open(&memory_context(backend.clone()), DEFAULT_DEBOUNCE).await;

        store.add_income(income("a", "100")).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(backend.writes(), 0);
        assert_eq!(store.snapshot().await.income_entries.len(), 1);
        assert!(store.is_dirty());
        assert!(store.flush().await.is_err());

        backend.set_fail_writes(false);
        store.close().await.unwrap();
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_close_flushes_pending_mutation() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let store =
            DocumentStore::open(&memory_context(backend.clone()), Duration::from_secs(60)).await;
        store
            .add_customer(Customer {
                id: "c1".into(),
                company: "ACME".into(),
                ..Customer::default()
            })
            .await;
        assert!(store.is_dirty());
        store.close().await.unwrap();
        assert_eq!(backend.writes(), 1);
        let persisted: AppDocument =
            serde_json::from_str(&backend.contents().await.unwrap()).unwrap();
        assert_eq!(persisted.customers.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_without_pending_does_not_write() {
        let backend = Arc::new(MemoryDocumentBackend::new());
        let store = DocumentStore::open(&memory_context(backend.clone()), DEFAULT_DEBOUNCE).await;
        store.flush().await.unwrap();
        assert_eq!(backend.writes(), 0);
        store.save().await.unwrap();
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_add_then_edit_income() {
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_income(income("a", "100.00")).await;
        assert!(store.update_income(income("a", "150.00")).await);

        let doc = store.snapshot().await;
        assert_eq!(doc.income_entries.len(), 1);
        assert_eq!(
            doc.income_entries[0].amount,
            Amount::from_str("150.00").unwrap()
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_of_unknown_id_change_nothing() {
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_income(income("a", "100")).await;
        let before = store.snapshot().await;

        assert!(!store.update_income(income("zzz", "5")).await);
        assert!(!store.delete_income("zzz").await);
        assert!(!store.update_trip(trip("nope", 2024)).await);
        assert!(!store.delete_customer("nope").await);

        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_delete_each_kind() {
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_income(income("i", "1")).await;
        store.add_trip(trip("t", 2024)).await;
        store
            .add_customer(Customer {
                id: "c".into(),
                ..Customer::default()
            })
            .await;
        assert!(store.delete_income("i").await);
        assert!(store.delete_trip("t").await);
        assert!(store.delete_customer("c").await);
        let doc = store.snapshot().await;
        assert!(doc.income_entries.is_empty());
        assert!(doc.trip_log_entries.is_empty());
        assert!(doc.customers.is_empty());
    }

    #[tokio::test]
    async fn test_year_filters() {
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_trip(trip("old", 2023)).await;
        store.add_trip(trip("new", 2024)).await;
        store.add_income(income("a", "1")).await;

        let trips = store.trips_for_year(2024).await;
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id, "new");
        assert_eq!(store.income_for_year(2024).await.len(), 1);
        assert!(store.income_for_year(2023).await.is_empty());
        assert!(store.expenses_for_year(2024).await.is_empty());
        assert_eq!(store.list::<TripEntry>(None).await.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_import_leaves_document_unchanged() {
        let store = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_income(income("a", "100")).await;
        let before = store.snapshot().await;

        let err = store.import_json("this is not json").await.unwrap_err();
        assert!(err.to_string().contains("not a valid haulbook backup"));
        let err = store
            .import_json(r#"{"incomeEntries": 5}"#)
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());

        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_export_then_import_is_lossless() {
        let source = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        source.add_income(income("a", "99.99")).await;
        source.add_trip(trip("t", 2024)).await;
        source
            .update_settings(SettingsUpdate {
                company_name: Some("Kurier Nord".into()),
                small_business_exempt: Some(false),
                ..SettingsUpdate::default()
            })
            .await;
        let exported = source.export_json().await.unwrap();

        let target = DocumentStore::with_document(
            AppDocument::default(),
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        target.import_json(&exported).await.unwrap();
        assert_eq!(target.snapshot().await, source.snapshot().await);
    }

    #[tokio::test]
    async fn test_partial_import_merges_shallowly() {
        let store = DocumentStore::with_document(
            AppDocument {
                tax_id: "keep-me".into(),
                ..AppDocument::default()
            },
            Arc::new(MemoryDocumentBackend::new()),
            DEFAULT_DEBOUNCE,
        );
        store.add_income(income("a", "1")).await;
        store
            .import_json(r#"{"companyName": "Imported", "customers": [{"id": "c1"}]}"#)
            .await
            .unwrap();
        let doc = store.snapshot().await;
        assert_eq!(doc.company_name, "Imported");
        assert_eq!(doc.tax_id, "keep-me");
        assert_eq!(doc.customers.len(), 1);
        assert_eq!(doc.income_entries.len(), 1);
    }
}
