use rust_decimal::Decimal;

pub mod yahoo;

/// Source of market prices. Implementations perform a fresh lookup on every
/// call; unavailability (unknown symbol, empty history, transport failure) is
/// an absence, never an error the caller has to unwrap.
pub trait MarketData {
    async fn latest_close(&self, symbol: &str) -> Option<Decimal>;
}
