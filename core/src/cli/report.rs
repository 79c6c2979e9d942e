use std::{fs, sync::Arc};

use anyhow::Context;
use owo_colors::{OwoColorize, Style};
use spinners_rs::{Spinner, Spinners};
use tabled::{Table, Tabled};
use tracing::info;
use walkdir::WalkDir;

use super::shared::{format_currency, load_rates};
use crate::services::{report::Report, shared::env::Settings};

pub struct ReportArgs {
    pub path: String,
    pub currency: String,
    pub use_deemed_acquisition_cost: bool,
    pub json: bool,
}

#[derive(Debug, Tabled)]
struct StringifiedTradeDetails {
    symbol: String,
    quantity: String,
    buy_date: String,
    sell_date: String,
    price: String,
    realized: String,
}

pub async fn report(settings: &Settings, args: ReportArgs) -> anyhow::Result<()> {
    let rates = if args.json {
        load_rates(settings, false).await
    } else {
        let mut sp = Spinner::new(Spinners::Point, "Loading exchange rates...");
        sp.start();
        let rates = load_rates(settings, false).await;
        sp.stop();
        println!();
        rates
    };
    let rates = rates?;

    let mut report = Report::new(
        &args.currency,
        args.use_deemed_acquisition_cost,
        Arc::new(rates),
    );

    for entry in WalkDir::new(&args.path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_path = entry.path();
        info!("Adding trades from {:?}", file_path);

        let buffer = fs::read(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        report
            .add_trades(&buffer)
            .with_context(|| format!("Failed to process {}", file_path.display()))?;
    }

    let summary = report.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let currency = summary.report_currency.as_str();
    let rows: Vec<StringifiedTradeDetails> = summary
        .details
        .iter()
        .map(|details| StringifiedTradeDetails {
            symbol: details.symbol.clone(),
            quantity: details.quantity.normalize().to_string(),
            buy_date: details.buy_date.to_string(),
            sell_date: details.sell_date.to_string(),
            price: format_currency(details.price, currency),
            realized: format_currency(details.realized, currency),
        })
        .collect();

    println!("{}", Table::new(&rows));
    println!("====");
    let total_style = Style::new().black().on_white().bold();
    println!(
        "Total selling prices: {}",
        format_currency(summary.prices, currency).style(total_style)
    );
    println!(
        "Total capital gains: {}",
        format_currency(summary.gains, currency).green()
    );
    println!(
        "Total capital losses: {}",
        format_currency(summary.losses, currency).red()
    );
    if !summary.use_deemed_acquisition_cost {
        println!("Deemed acquisition cost not used.");
    }
    Ok(())
}
