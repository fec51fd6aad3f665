use anyhow::Result;
use clap::Parser;
use rust_decimal::Decimal;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paper_trader::marketplace::yahoo::{YahooFinance, DEFAULT_ENDPOINT};
use paper_trader::portfolio::Portfolio;
use paper_trader::repl;
use paper_trader::trader::Trader;

#[derive(Parser, Debug)]
struct Args {
    /// Starting cash balance
    #[arg(long, default_value = "1000")]
    balance: Decimal,

    /// Quote API base url
    #[arg(long, env = "QUOTE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paper_trader=warn")),
        )
        .with(fmt::layer())
        .init();

    let args = Args::parse();

    let market = YahooFinance::new(&args.endpoint);
    let mut trader = Trader::new(Portfolio::new(args.balance), market);

    let input = BufReader::new(tokio::io::stdin());
    repl::run(&mut trader, input, tokio::io::stdout()).await
}
