pub mod ibkr;
