pub mod rest;
pub mod symbol;
pub mod types;

pub use rest::BinanceOptionsClient;
pub use symbol::binance_symbol;
pub use types::*;
