pub mod rates;
pub mod report;
pub mod shared;

use clap::{Parser, Subcommand};
use rates::{exchange_rate, refresh_rates};
use report::{report, ReportArgs};

use crate::{
    api,
    services::shared::{constants::DEFAULT_REPORT_CURRENCY, env::Settings},
};

/// Capital gains and losses from Interactive Brokers trade exports
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Calculate selling prices, gains and losses from a CSV export or a
    /// directory of exports
    Report {
        path: String,
        #[arg(short, long, default_value = DEFAULT_REPORT_CURRENCY)]
        currency: String,
        /// Always use the real acquisition cost
        #[arg(long)]
        no_deemed_cost: bool,
        #[arg(long)]
        json: bool,
    },
    /// Download today's exchange rates and save them to the configured storage
    Rates,
    /// Print the exchange rate between two currencies on a date
    Rate {
        from: String,
        to: String,
        date: String,
    },
    /// Start the HTTP API
    Serve,
}

pub async fn cli() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env()?;
    settings.log_summary();

    match args.cmd {
        Command::Report {
            path,
            currency,
            no_deemed_cost,
            json,
        } => {
            report(
                &settings,
                ReportArgs {
                    path,
                    currency,
                    use_deemed_acquisition_cost: !no_deemed_cost,
                    json,
                },
            )
            .await?;
        }
        Command::Rates => {
            refresh_rates(&settings).await?;
        }
        Command::Rate { from, to, date } => {
            exchange_rate(&settings, &from, &to, &date).await?;
        }
        Command::Serve => {
            println!("Starting web server...");
            api::api(settings).await?;
        }
    }
    Ok(())
}
