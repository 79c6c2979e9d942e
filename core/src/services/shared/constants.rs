pub const DEFAULT_EXCHANGE_RATES_URL: &str =
    "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-hist.zip";
pub const DEFAULT_STORAGE_DIR: &str = ".ibkr_storage";
pub const DEFAULT_REPORT_CURRENCY: &str = "EUR";
pub const DEFAULT_PORT: u16 = 8080;

pub const MAX_BACKTRACK_DAYS: u32 = 7;
pub const MAX_HTTP_RETRIES: u32 = 5;
pub const CACHE_SIZE: usize = 10;

pub const SAVED_RATES_PREFIX: &str = "official_ecb_exchange_rates";
pub const SAVED_RATES_EXTENSION: &str = "json.gz";
