pub mod coingecko;

pub use coingecko::CoinGeckoClient;
