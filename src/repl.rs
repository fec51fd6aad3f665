use std::str::FromStr;

use anyhow::Result;
use strum_macros::EnumString;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::marketplace::MarketData;
use crate::trader::Trader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Buy,
    Sell,
    View,
    Exit,
}

/// Runs the interactive session until `exit` or end of input. One line of
/// input per turn; every error is reported and the loop keeps going.
pub async fn run<M, R, W>(trader: &mut Trader<M>, input: R, mut output: W) -> Result<()>
where
    M: MarketData,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        say(&mut output, "\nOptions: buy, sell, view, exit").await?;
        let Some(line) = prompt(&mut lines, &mut output, "Enter action: ").await? else {
            break;
        };
        let Ok(action) = Action::from_str(line.trim()) else {
            say(&mut output, "Invalid action").await?;
            continue;
        };
        match action {
            Action::Buy | Action::Sell => {
                let Some(symbol) = prompt(&mut lines, &mut output, "Enter stock symbol: ").await?
                else {
                    break;
                };
                let symbol = symbol.trim().to_uppercase();
                let Some(raw_shares) =
                    prompt(&mut lines, &mut output, "Enter number of shares: ").await?
                else {
                    break;
                };
                // Reject before the ledger is called; a bad count must not
                // trigger a quote fetch.
                let shares = match raw_shares.trim().parse::<u64>() {
                    Ok(shares) if shares > 0 => shares,
                    _ => {
                        say(&mut output, "Invalid number of shares").await?;
                        continue;
                    }
                };
                let (verb, result) = match action {
                    Action::Buy => ("Bought", trader.buy(&symbol, shares).await),
                    _ => ("Sold", trader.sell(&symbol, shares).await),
                };
                match result {
                    Ok(execution) => {
                        say(
                            &mut output,
                            &format!(
                                "{} {} of {} at ${:.2}",
                                verb, execution.shares, execution.symbol, execution.price
                            ),
                        )
                        .await?;
                    }
                    Err(err) => say(&mut output, &err.to_string()).await?,
                }
            }
            Action::View => {
                say(&mut output, &format!("\n{}", trader.portfolio)).await?;
            }
            Action::Exit => {
                say(&mut output, "Exiting...").await?;
                break;
            }
        }
    }
    Ok(())
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

async fn prompt<R, W>(lines: &mut Lines<R>, output: &mut W, text: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(lines.next_line().await?)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::marketplace::testing::FakeMarket;
    use crate::portfolio::Portfolio;

    async fn run_session(trader: &mut Trader<&FakeMarket>, script: &str) -> String {
        colored::control::set_override(false);
        let mut output = Vec::new();
        run(trader, script.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_buy_view_sell_round_trip() {
        let market = FakeMarket::quoting("XYZ", dec!(100));
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output = run_session(&mut trader, "buy\nXYZ\n2\nview\nexit\n").await;

        assert!(output.contains("Bought 2 of XYZ at $100.00"));
        assert!(output.contains("XYZ: 2 shares, Avg Price: $100.00"));
        assert!(output.contains("Balance: $800.00"));
        assert!(output.contains("Exiting..."));
    }

    #[tokio::test]
    async fn test_symbol_is_trimmed_and_uppercased() {
        let market = FakeMarket::quoting("XYZ", dec!(50));
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output = run_session(&mut trader, "BUY\n  xyz \n3\nexit\n").await;

        assert!(output.contains("Bought 3 of XYZ at $50.00"));
        assert_eq!(trader.portfolio.shares_held("XYZ"), 3);
    }

    #[tokio::test]
    async fn test_invalid_action_reloops() {
        let market = FakeMarket::new();
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output = run_session(&mut trader, "hold\nexit\n").await;

        assert!(output.contains("Invalid action"));
        assert!(output.contains("Exiting..."));
    }

    #[tokio::test]
    async fn test_invalid_share_count_never_fetches() {
        let market = FakeMarket::quoting("XYZ", dec!(100));
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output = run_session(&mut trader, "buy\nXYZ\nabc\nsell\nXYZ\n-2\nexit\n").await;

        assert_eq!(output.matches("Invalid number of shares").count(), 2);
        assert_eq!(market.fetches(), 0);
        assert_eq!(trader.portfolio.balance, dec!(1000));
        assert!(trader.portfolio.holdings.is_empty());
    }

    #[tokio::test]
    async fn test_zero_shares_rejected() {
        let market = FakeMarket::quoting("XYZ", dec!(100));
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output = run_session(&mut trader, "buy\nXYZ\n0\nexit\n").await;

        assert!(output.contains("Invalid number of shares"));
        assert_eq!(market.fetches(), 0);
    }

    #[tokio::test]
    async fn test_trade_errors_are_reported_and_recovered() {
        let market = FakeMarket::quoting("XYZ", dec!(600));
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        let output =
            run_session(&mut trader, "buy\nXYZ\n2\nsell\nXYZ\n1\nbuy\nNOPE\n1\nexit\n").await;

        assert!(output.contains("Insufficient funds"));
        assert!(output.contains("Not enough shares to sell"));
        assert!(output.contains("Error fetching stock price. Try again."));
        assert_eq!(trader.portfolio.balance, dec!(1000));
    }

    #[tokio::test]
    async fn test_end_of_input_is_clean_shutdown() {
        let market = FakeMarket::new();
        let mut trader = Trader::new(Portfolio::new(dec!(1000)), &market);

        // No exit command; input just ends, mid-prompt on the second turn.
        let output = run_session(&mut trader, "view\nbuy\n").await;

        assert!(output.contains("Balance: $1000.00"));
        assert!(output.ends_with("Enter stock symbol: "));
    }
}
