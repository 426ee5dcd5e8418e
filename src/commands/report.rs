use crate::commands::{Out, Session};
use crate::report::ProfitLoss;
use crate::{Config, Result};

/// Builds the profit and loss summary for `year`, or for the configured fiscal year.
pub async fn report(config: Config, year: Option<i32>) -> Result<Out<ProfitLoss>> {
    let session = Session::open(&config).await?;
    let doc = session.documents().snapshot().await;
    session.close().await?;

    let year = year.unwrap_or(doc.fiscal_year);
    let summary = ProfitLoss::for_year(&doc, year)?;
    let message = format!(
        "{year}: income {}, expenses {}, profit {}",
        summary.total_income, summary.total_expenses, summary.profit
    );
    Ok(Out::new(message, summary))
}
