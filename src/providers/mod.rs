pub mod coingecko;
pub mod smtp;

pub use coingecko::CoinGeckoProvider;
pub use smtp::SmtpMailer;
