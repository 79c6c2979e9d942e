pub mod exchange_rates;
pub mod fx_rates;
pub mod rate_table;
