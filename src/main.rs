use clap::Parser;
use haulbook::args::{
    Args, AttachCommand, Command, CustomerCommand, ExpenseCommand, IncomeCommand, TripCommand,
};
use haulbook::model::{new_id, Customer, ExpenseEntry, IncomeEntry, TripEntry};
use haulbook::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().haulbook_home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.backend(), init_args.origin())
                .await?
                .print()
        }

        Command::Income(income) => {
            let config = Config::load(home).await?;
            match income {
                IncomeCommand::Add(f) => commands::add(config, f.to_record(new_id()))
                    .await?
                    .print(),
                IncomeCommand::Update(u) => commands::update(config, u.fields().to_record(u.id()))
                    .await?
                    .print(),
                IncomeCommand::Delete(d) => commands::delete::<IncomeEntry>(config, d.id())
                    .await?
                    .print(),
                IncomeCommand::List(l) => commands::list::<IncomeEntry>(config, l.year())
                    .await?
                    .print(),
            }
        }

        Command::Expense(expense) => {
            let config = Config::load(home).await?;
            match expense {
                ExpenseCommand::Add(f) => commands::add(config, f.to_record(new_id()))
                    .await?
                    .print(),
                ExpenseCommand::Update(u) => {
                    commands::update(config, u.fields().to_record(u.id()))
                        .await?
                        .print()
                }
                ExpenseCommand::Delete(d) => commands::delete::<ExpenseEntry>(config, d.id())
                    .await?
                    .print(),
                ExpenseCommand::List(l) => commands::list::<ExpenseEntry>(config, l.year())
                    .await?
                    .print(),
            }
        }

        Command::Customer(customer) => {
            let config = Config::load(home).await?;
            match customer {
                CustomerCommand::Add(f) => commands::add(config, f.to_record(new_id()))
                    .await?
                    .print(),
                CustomerCommand::Update(u) => {
                    commands::update(config, u.fields().to_record(u.id()))
                        .await?
                        .print()
                }
                CustomerCommand::Delete(d) => commands::delete::<Customer>(config, d.id())
                    .await?
                    .print(),
                CustomerCommand::List => commands::list::<Customer>(config, None)
                    .await?
                    .print(),
            }
        }

        Command::Trip(trip) => {
            let config = Config::load(home).await?;
            match trip {
                TripCommand::Add(f) => commands::add(config, f.to_record(new_id()))
                    .await?
                    .print(),
                TripCommand::Update(u) => commands::update(config, u.fields().to_record(u.id()))
                    .await?
                    .print(),
                TripCommand::Delete(d) => commands::delete::<TripEntry>(config, d.id())
                    .await?
                    .print(),
                TripCommand::List(l) => commands::list::<TripEntry>(config, l.year())
                    .await?
                    .print(),
            }
        }

        Command::Attach(attach) => {
            let config = Config::load(home).await?;
            match attach {
                AttachCommand::Add(a) => commands::attach_add(
                    config,
                    a.record_kind(),
                    a.record_id(),
                    a.file(),
                    a.name(),
                )
                .await?
                .print(),
                AttachCommand::Export(e) => commands::attach_export(config, e.id(), e.out())
                    .await?
                    .print(),
                AttachCommand::Remove(r) => {
                    commands::attach_remove(config, r.record_kind(), r.record_id(), r.id())
                        .await?
                        .print()
                }
            }
        }

        Command::Settings(settings_args) => {
            let config = Config::load(home).await?;
            commands::settings(config, settings_args.to_update())
                .await?
                .print()
        }

        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            commands::import(config, import_args.file()).await?.print()
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, export_args.out()).await?.print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(config, report_args.year()).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        // Without RUST_LOG, only this crate logs, at the requested level.
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
