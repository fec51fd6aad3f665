use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::marketplace::MarketData;
use crate::portfolio::{Holding, Portfolio};

/// Everything that can stop a buy or sell. All of these are recovered within
/// the loop turn that produced them; the Display strings are what the user
/// sees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeError {
    #[error("Error fetching stock price. Try again.")]
    QuoteUnavailable,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Not enough shares to sell")]
    InsufficientShares,
}

/// A filled trade, for the confirmation line.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub symbol: String,
    pub shares: u64,
    pub price: Decimal,
}

/// The holding ledger with its injected price source. Every mutating
/// operation performs all validation and the price fetch before touching the
/// portfolio, so a failed operation leaves no partial state behind.
pub struct Trader<M: MarketData> {
    pub portfolio: Portfolio,
    market: M,
}

impl<M: MarketData> Trader<M> {
    pub fn new(portfolio: Portfolio, market: M) -> Self {
        Self { portfolio, market }
    }

    pub async fn buy(&mut self, symbol: &str, shares: u64) -> Result<Execution, TradeError> {
        let price = self
            .market
            .latest_close(symbol)
            .await
            .ok_or(TradeError::QuoteUnavailable)?;
        let cost = price * Decimal::from(shares);
        if self.portfolio.balance < cost {
            return Err(TradeError::InsufficientFunds);
        }
        self.portfolio.balance -= cost;
        match self.portfolio.holdings.get_mut(symbol) {
            Some(holding) => {
                // The new lot contributes its total cost to the weighted sum,
                // not its per-share price. Keep this form.
                let held = Decimal::from(holding.shares);
                holding.avg_price =
                    (held * holding.avg_price + cost) / (held + Decimal::from(shares));
                holding.shares += shares;
            }
            None => {
                self.portfolio.holdings.insert(
                    symbol.to_string(),
                    Holding {
                        symbol: symbol.to_string(),
                        shares,
                        avg_price: price,
                    },
                );
            }
        }
        info!("Bought {} {} at {}", shares, symbol, price);
        Ok(Execution {
            symbol: symbol.to_string(),
            shares,
            price,
        })
    }

    pub async fn sell(&mut self, symbol: &str, shares: u64) -> Result<Execution, TradeError> {
        let held = match self.portfolio.holdings.get(symbol) {
            Some(holding) => holding.shares,
            None => return Err(TradeError::InsufficientShares),
        };
        if held < shares {
            return Err(TradeError::InsufficientShares);
        }
        let price = self
            .market
            .latest_close(symbol)
            .await
            .ok_or(TradeError::QuoteUnavailable)?;
        self.portfolio.balance += price * Decimal::from(shares);
        if held == shares {
            self.portfolio.holdings.remove(symbol);
        } else if let Some(holding) = self.portfolio.holdings.get_mut(symbol) {
            holding.shares -= shares;
        }
        info!("Sold {} {} at {}", shares, symbol, price);
        Ok(Execution {
            symbol: symbol.to_string(),
            shares,
            price,
        })
    }
}
