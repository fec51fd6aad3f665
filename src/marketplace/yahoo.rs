use anyhow::{anyhow, Result};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::marketplace::MarketData;

pub const DEFAULT_ENDPOINT: &str = "https://query1.finance.yahoo.com";

/// Yahoo v8 chart payload, trimmed to the fields we read.
#[derive(Deserialize, Debug, Clone)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChartResult {
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Indicators {
    pub quote: Vec<QuoteBars>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct QuoteBars {
    // Bars with no trade come back as nulls.
    #[serde(default)]
    pub close: Vec<Option<Decimal>>,
}

impl ChartResult {
    /// Last recorded close of the day's bars, skipping trailing nulls.
    pub fn last_close(&self) -> Option<Decimal> {
        self.indicators
            .quote
            .iter()
            .flat_map(|bars| bars.close.iter())
            .rev()
            .find_map(|close| *close)
    }
}

#[derive(Clone)]
pub struct YahooFinance {
    client: Client,
    endpoint: String,
}

impl YahooFinance {
    pub fn new(endpoint: &str) -> Self {
        // Yahoo rejects requests without a browser-ish user agent.
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; paper-trader)")
            .build()
            .unwrap();
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn day_chart(&self, symbol: &str) -> Result<ChartResult> {
        let params = [("interval", "1d"), ("range", "1d")];
        let url = Url::parse_with_params(
            format!("{}/v8/finance/chart/{}", self.endpoint, symbol).as_str(),
            &params,
        )?;
        debug!("Fetching chart {}", url);
        let r = self.client.get(url).send().await?.error_for_status()?;
        let r: ChartResponse = r.json().await?;
        if let Some(err) = r.chart.error {
            return Err(anyhow!("Chart error for {}: {}", symbol, err));
        }
        r.chart
            .result
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| anyhow!("No chart rows for {}", symbol))
    }
}

impl MarketData for YahooFinance {
    async fn latest_close(&self, symbol: &str) -> Option<Decimal> {
        match self.day_chart(symbol).await {
            Ok(chart) => chart.last_close(),
            Err(err) => {
                warn!("Price fetch failed for {}: {}", symbol, err);
                None
            }
        }
    }
}
