use ibkr_report::{cli::cli, services::shared::logger::init_logger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();
    cli().await?;
    Ok(())
}
