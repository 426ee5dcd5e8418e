//! These structs provide the CLI interface for the haulbook CLI.

use crate::model::{
    Amount, Customer, ExpenseCategory, ExpenseEntry, IncomeCategory, IncomeEntry, PaymentMethod,
    SettingsUpdate, TripEntry,
};
use crate::Backend;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// haulbook: bookkeeping for small transport businesses.
///
/// Keeps income, expenses, customers and a vehicle trip log in a single local document, with
/// receipts and invoices stored next to it. Everything lives in one directory, so a copy of that
/// directory is a complete backup.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and its configuration file.
    ///
    /// Run this once before anything else. The data directory is --haulbook-home, which defaults
    /// to a `haulbook-data` directory next to the executable.
    Init(InitArgs),
    /// Add, change, remove or list income entries.
    #[command(subcommand)]
    Income(IncomeCommand),
    /// Add, change, remove or list expense entries.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Add, change, remove or list customers.
    #[command(subcommand)]
    Customer(CustomerCommand),
    /// Add, change, remove or list trip log entries.
    #[command(subcommand)]
    Trip(TripCommand),
    /// Attach receipts and invoices to income and expense entries.
    #[command(subcommand)]
    Attach(AttachCommand),
    /// Show or change the company settings.
    Settings(SettingsArgs),
    /// Merge a previously exported JSON file into the current data. A backup is written first.
    Import(ImportArgs),
    /// Write all data to a JSON file.
    Export(ExportArgs),
    /// Print the profit and loss summary for a year.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where haulbook data and configuration is held.
    #[arg(long, env = "HAULBOOK_HOME", default_value_t = default_haulbook_home())]
    haulbook_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, haulbook_home: PathBuf) -> Self {
        Self {
            log_level,
            haulbook_home: haulbook_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn haulbook_home(&self) -> &DisplayPath {
        &self.haulbook_home
    }
}

/// (Not shown): Args for the `haulbook init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where the data is kept: `desktop` for plain files, `embedded` for a single SQLite file.
    #[arg(long, value_enum, default_value_t = Backend::Desktop)]
    backend: Backend,

    /// The namespace for this installation's rows in the embedded store.
    #[arg(long)]
    origin: Option<String>,
}

impl InitArgs {
    pub fn new(backend: Backend, origin: Option<String>) -> Self {
        Self { backend, origin }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

/// (Not shown): Selects a record by id.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The id of the record.
    #[arg(long)]
    id: String,
}

impl IdArgs {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the list subcommands.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// Only list records dated in this year.
    #[arg(long)]
    year: Option<i32>,
}

impl ListArgs {
    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// (Not shown): Replaces an existing record. Every field is taken from the command line; the
/// record's attachments are kept.
#[derive(Debug, clap::Args, Clone)]
pub struct UpdateArgs<F: clap::Args> {
    /// The id of the record to replace.
    #[arg(long)]
    id: String,

    #[command(flatten)]
    fields: F,
}

impl<F: clap::Args> UpdateArgs<F> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum IncomeCommand {
    /// Add an income entry.
    Add(IncomeFields),
    /// Replace an income entry.
    Update(UpdateArgs<IncomeFields>),
    /// Delete an income entry. Its attachments are kept.
    Delete(IdArgs),
    /// List income entries.
    List(ListArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct IncomeFields {
    /// Booking date, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    #[arg(long, default_value = "")]
    description: String,

    /// The amount, e.g. 1250.00 or 1.250,00.
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    #[arg(long, default_value_t = IncomeCategory::default())]
    category: IncomeCategory,

    #[arg(long)]
    customer: Option<String>,

    #[arg(long)]
    invoice_number: Option<String>,

    #[arg(long, default_value_t = PaymentMethod::default())]
    payment_method: PaymentMethod,

    #[arg(long)]
    notes: Option<String>,
}

impl IncomeFields {
    pub fn to_record(&self, id: impl Into<String>) -> IncomeEntry {
        IncomeEntry {
            id: id.into(),
            date: self.date,
            description: self.description.clone(),
            amount: self.amount,
            category: self.category,
            customer: self.customer.clone(),
            invoice_number: self.invoice_number.clone(),
            payment_method: self.payment_method,
            notes: self.notes.clone(),
            attachments: Vec::new(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseCommand {
    /// Add an expense entry.
    Add(ExpenseFields),
    /// Replace an expense entry.
    Update(UpdateArgs<ExpenseFields>),
    /// Delete an expense entry. Its attachments are kept.
    Delete(IdArgs),
    /// List expense entries.
    List(ListArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ExpenseFields {
    /// Booking date, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    #[arg(long, default_value = "")]
    description: String,

    /// The amount, e.g. 80.00 or 80,00.
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    #[arg(long, default_value_t = ExpenseCategory::default())]
    category: ExpenseCategory,

    #[arg(long)]
    receipt_number: Option<String>,

    #[arg(long, default_value_t = PaymentMethod::default())]
    payment_method: PaymentMethod,

    #[arg(long)]
    notes: Option<String>,
}

impl ExpenseFields {
    pub fn to_record(&self, id: impl Into<String>) -> ExpenseEntry {
        ExpenseEntry {
            id: id.into(),
            date: self.date,
            description: self.description.clone(),
            amount: self.amount,
            category: self.category,
            receipt_number: self.receipt_number.clone(),
            payment_method: self.payment_method,
            notes: self.notes.clone(),
            attachments: Vec::new(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CustomerCommand {
    /// Add a customer.
    Add(CustomerFields),
    /// Replace a customer.
    Update(UpdateArgs<CustomerFields>),
    /// Delete a customer.
    Delete(IdArgs),
    /// List customers.
    List,
}

#[derive(Debug, Parser, Clone)]
pub struct CustomerFields {
    #[arg(long)]
    company: String,

    #[arg(long)]
    contact_person: Option<String>,

    #[arg(long)]
    street: Option<String>,

    #[arg(long)]
    postal_code: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    tax_id: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl CustomerFields {
    pub fn to_record(&self, id: impl Into<String>) -> Customer {
        Customer {
            id: id.into(),
            company: self.company.clone(),
            contact_person: self.contact_person.clone(),
            street: self.street.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            tax_id: self.tax_id.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TripCommand {
    /// Add a trip log entry.
    Add(TripFields),
    /// Replace a trip log entry.
    Update(UpdateArgs<TripFields>),
    /// Delete a trip log entry.
    Delete(IdArgs),
    /// List trip log entries.
    List(ListArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct TripFields {
    /// Date of the trip, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    #[arg(long, default_value = "")]
    origin: String,

    #[arg(long, default_value = "")]
    destination: String,

    /// Distance driven, e.g. 212.5 or 212,5.
    #[arg(long, value_parser = parse_kilometers)]
    kilometers: Decimal,

    #[arg(long, default_value = "")]
    purpose: String,

    #[arg(long)]
    customer: Option<String>,

    #[arg(long)]
    vehicle: Option<String>,

    #[arg(long)]
    license_plate: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl TripFields {
    pub fn to_record(&self, id: impl Into<String>) -> TripEntry {
        TripEntry {
            id: id.into(),
            date: self.date,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            kilometers: self.kilometers,
            purpose: self.purpose.clone(),
            customer: self.customer.clone(),
            vehicle: self.vehicle.clone(),
            license_plate: self.license_plate.clone(),
            notes: self.notes.clone(),
        }
    }
}

fn parse_kilometers(s: &str) -> Result<Decimal, String> {
    let km = crate::model::parse_decimal(s).map_err(|e| e.to_string())?;
    if km.is_sign_negative() {
        return Err("kilometers cannot be negative".to_string());
    }
    Ok(km)
}

/// The record kinds that can carry attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AttachTarget {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(AttachTarget);
serde_plain::derive_fromstr_from_deserialize!(AttachTarget);

#[derive(Subcommand, Debug, Clone)]
pub enum AttachCommand {
    /// Store a file and attach it to an income or expense entry.
    Add(AttachAddArgs),
    /// Write an attachment's bytes to a file.
    Export(AttachExportArgs),
    /// Detach a file from an entry and delete the stored bytes.
    Remove(AttachRemoveArgs),
}

/// (Not shown): Args for `haulbook attach add`.
#[derive(Debug, Parser, Clone)]
pub struct AttachAddArgs {
    #[arg(long, value_enum)]
    record_kind: AttachTarget,

    #[arg(long)]
    record_id: String,

    /// The file to attach. Its name becomes the display name unless --name is given.
    #[arg(long)]
    file: PathBuf,

    #[arg(long)]
    name: Option<String>,
}

impl AttachAddArgs {
    pub fn record_kind(&self) -> AttachTarget {
        self.record_kind
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// (Not shown): Args for `haulbook attach export`.
#[derive(Debug, Parser, Clone)]
pub struct AttachExportArgs {
    /// The attachment id.
    #[arg(long)]
    id: String,

    /// Where to write the bytes.
    #[arg(long)]
    out: PathBuf,
}

impl AttachExportArgs {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn out(&self) -> &Path {
        &self.out
    }
}

/// (Not shown): Args for `haulbook attach remove`.
#[derive(Debug, Parser, Clone)]
pub struct AttachRemoveArgs {
    #[arg(long, value_enum)]
    record_kind: AttachTarget,

    #[arg(long)]
    record_id: String,

    /// The attachment id.
    #[arg(long)]
    id: String,
}

impl AttachRemoveArgs {
    pub fn record_kind(&self) -> AttachTarget {
        self.record_kind
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for `haulbook settings`. Without any option the current settings are shown.
#[derive(Debug, Parser, Clone)]
pub struct SettingsArgs {
    #[arg(long)]
    company_name: Option<String>,

    #[arg(long)]
    tax_id: Option<String>,

    /// true or false
    #[arg(long)]
    small_business_exempt: Option<bool>,

    #[arg(long)]
    fiscal_year: Option<i32>,
}

impl SettingsArgs {
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            company_name: self.company_name.clone(),
            tax_id: self.tax_id.clone(),
            small_business_exempt: self.small_business_exempt,
            fiscal_year: self.fiscal_year,
        }
    }
}

/// (Not shown): Args for `haulbook import`.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// A JSON file written by `haulbook export`. Top-level fields it contains replace the current
    /// ones; fields it lacks are left alone.
    #[arg(long)]
    file: PathBuf,
}

impl ImportArgs {
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// (Not shown): Args for `haulbook export`.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[arg(long)]
    out: PathBuf,
}

impl ExportArgs {
    pub fn out(&self) -> &Path {
        &self.out
    }
}

/// (Not shown): Args for `haulbook report`.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Defaults to the fiscal year from the settings.
    #[arg(long)]
    year: Option<i32>,
}

impl ReportArgs {
    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// `haulbook-data` next to the executable, so a portable install keeps its data with it. Falls
/// back to `$HOME/haulbook` when the executable's location is unknown.
fn default_haulbook_home() -> DisplayPath {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("haulbook-data")));
    if let Some(path) = beside_exe {
        return DisplayPath(path);
    }
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("haulbook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --haulbook-home or HAULBOOK_HOME instead of relying on the \
                default directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("haulbook")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
