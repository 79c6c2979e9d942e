pub mod report;
pub mod trade;
