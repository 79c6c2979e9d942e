use tracing::Level;

use super::env::get_env_variable;

pub fn init_logger() {
    let logging_level = get_env_variable("LOGGING_LEVEL").unwrap_or_else(|| "INFO".to_string());
    let level = match logging_level.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid logging level '{}', defaulting to INFO",
                logging_level
            );
            Level::INFO
        }
    };

    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}
