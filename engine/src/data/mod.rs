// Synthetic market data: randomness, the random walk and the candle window.
pub mod market_data;
pub mod random;
pub mod walk;
