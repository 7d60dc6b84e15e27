use {
    super::get,
    crate::{
        config,
        fetch::{FetchError, Outcome},
    },
    reqwest::blocking::Client,
    serde_json::{Map, Value},
    std::collections::BTreeMap,
};

/// the latest known usd price of each tracked asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prices {
    prices: BTreeMap<String, f64>,
}

// === impl Prices ===

impl Prices {
    /// returns the price of an asset, or `0.0` if it is unknown.
    pub fn price(&self, asset: &str) -> f64 {
        self.prices.get(asset).copied().unwrap_or(0.0)
    }

    /// returns `true` if no prices are known.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, f64)> for Prices {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// the price endpoint for every tracked asset, in one request.
pub fn url() -> String {
    let ids = config::CRYPTO_ASSETS
        .iter()
        .map(|(id, _)| *id)
        .collect::<Vec<_>>()
        .join(",");

    format!("{}?ids={ids}&vs_currencies=usd", config::CRYPTO_ENDPOINT)
}

/// fetches the price of every tracked asset.
pub fn fetch(client: &Client) -> Outcome<Prices> {
    get(client, &url()).and_then(|body| parse(&body))
}

/// parses a price response body, e.g. `{"bitcoin": {"usd": 64000.5}}`.
///
/// tracked assets missing from the response are priced at `0.0`.
pub fn parse(body: &str) -> Outcome<Prices> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }

    let quotes = serde_json::from_str::<Map<String, Value>>(body)?;

    let prices = config::CRYPTO_ASSETS
        .iter()
        .map(|(id, _)| {
            let price = quotes
                .get(*id)
                .and_then(|quote| quote.get("usd"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            ((*id).to_owned(), price)
        })
        .collect();

    Ok(prices)
}
