use spinners_rs::{Spinner, Spinners};

use super::shared::load_rates;
use crate::services::shared::env::Settings;

pub async fn refresh_rates(settings: &Settings) -> anyhow::Result<()> {
    let mut sp = Spinner::new(Spinners::Point, "Refreshing exchange rates...");
    sp.start();
    let rates = load_rates(settings, true).await;
    sp.stop();

    let rates = rates?;
    let table = rates.table();
    println!("\n");
    match table.latest_date() {
        Some(latest) => println!(
            "Exchange rates for {} days available, latest from {}.",
            table.len(),
            latest
        ),
        None => println!("No exchange rates available."),
    }
    Ok(())
}

pub async fn exchange_rate(
    settings: &Settings,
    currency_from: &str,
    currency_to: &str,
    date: &str,
) -> anyhow::Result<()> {
    let currency_from = currency_from.to_uppercase();
    let currency_to = currency_to.to_uppercase();

    let rates = load_rates(settings, false).await?;
    let rate = rates.get_rate(&currency_from, &currency_to, date)?;
    println!("1 {} = {} {} on {}", currency_from, rate, currency_to, date);
    Ok(())
}
