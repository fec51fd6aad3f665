use std::{collections::HashMap, fmt::Display};

use colored::Colorize;
use rust_decimal::Decimal;

/// A position in one symbol. Present in the ledger only while shares > 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub shares: u64,
    /// Weighted-average cost basis; recomputed on buy, untouched on sell.
    pub avg_price: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
    pub balance: Decimal,
    pub holdings: HashMap<String, Holding>,
}

impl Portfolio {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance,
            holdings: HashMap::new(),
        }
    }

    pub fn shares_held(&self, symbol: &str) -> u64 {
        self.holdings
            .get(symbol)
            .map(|holding| holding.shares)
            .unwrap_or(0)
    }
}

impl Display for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Portfolio:")?;
        let mut symbols: Vec<&String> = self.holdings.keys().collect();
        symbols.sort();
        for symbol in symbols {
            let holding = &self.holdings[symbol];
            writeln!(
                f,
                "{}: {} shares, Avg Price: ${}",
                holding.symbol,
                holding.shares.to_string().purple(),
                format!("{:.2}", holding.avg_price)
            )?;
        }
        write!(
            f,
            "Balance: ${}",
            format!("{:.2}", self.balance).yellow()
        )
    }
}
