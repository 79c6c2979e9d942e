pub mod importers;
pub mod market_data;
pub mod parsers;
pub mod report;
pub mod shared;
pub mod storage;
pub mod taxation;
