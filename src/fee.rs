//! Fee estimation over HTTP.
//!
//! The payload's hex form is POSTed as `{"tx": "0x.."}` to the estimation
//! endpoint. A `partialFee` in the reply becomes the new quote; a reply
//! without one, or with an empty string or zero, leaves the current quote alone.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoder::Payload;
use crate::error::ExplorerError;

/// An estimated execution fee, kept as the service reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeQuote(pub String);

impl std::fmt::Display for FeeQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The displayed quote. Whichever estimate response lands last overwrites it.
#[derive(Debug, Default)]
pub struct FeeQuoteSlot(Mutex<Option<FeeQuote>>);

impl FeeQuoteSlot {
    pub fn current(&self) -> Option<FeeQuote> {
        self.0.lock().clone()
    }

    pub fn set(&self, quote: FeeQuote) {
        *self.0.lock() = Some(quote);
    }
}

#[derive(Serialize)]
struct FeeEstimateRequest<'a> {
    tx: &'a str,
}

#[derive(Deserialize)]
struct FeeEstimateResponse {
    #[serde(rename = "partialFee", default)]
    partial_fee: Option<Value>,
}

pub struct FeeEstimator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl FeeEstimator {
    /// `base_url` is the service root; the fixed estimate path is appended.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: crate::paths::fee_estimate_url(base_url),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask for a quote. `Ok(None)` means the service answered without a fee.
    pub async fn estimate(&self, payload: &Payload) -> Result<Option<FeeQuote>, ExplorerError> {
        let tx = payload.to_hex();
        tracing::info!(
            group = payload.group(),
            operation = payload.operation(),
            url = %self.url,
            "requesting fee estimate"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&FeeEstimateRequest { tx: &tx })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ExplorerError::Estimate {
                message: format!("Failed to reach fee estimator: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ExplorerError::Estimate {
                message: format!("Fee estimator returned {status}: {text}"),
            });
        }

        let body: FeeEstimateResponse = response.json().await.map_err(|e| ExplorerError::Estimate {
            message: format!("Malformed fee estimate response: {e}"),
        })?;

        match body.partial_fee {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(fee)) if fee.is_empty() => Ok(None),
            Some(Value::String(fee)) => Ok(Some(FeeQuote(fee))),
            Some(Value::Number(fee)) if is_zero(&fee) => Ok(None),
            Some(Value::Number(fee)) => Ok(Some(FeeQuote(fee.to_string()))),
            Some(other) => Err(ExplorerError::Estimate {
                message: format!("Unexpected partialFee value: {other}"),
            }),
        }
    }

    /// Estimate and, on arrival, publish the quote into `slot`.
    /// Overlapping calls publish in the order their responses arrive.
    pub async fn estimate_into(
        &self,
        payload: &Payload,
        slot: &FeeQuoteSlot,
    ) -> Result<Option<FeeQuote>, ExplorerError> {
        let quote = self.estimate(payload).await?;
        match &quote {
            Some(q) => {
                tracing::info!(fee = %q, "fee estimate updated");
                slot.set(q.clone());
            }
            None => tracing::debug!("fee estimate response had no partialFee; keeping previous quote"),
        }
        Ok(quote)
    }
}

fn is_zero(fee: &serde_json::Number) -> bool {
    fee.as_f64()
        .is_some_and(|f| f.classify() == std::num::FpCategory::Zero)
}
