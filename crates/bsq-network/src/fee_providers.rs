//! Blocking fee providers backed by public block explorers.
//!
//! A provider answers "what fee did this transaction pay" or fails with a
//! transient error. Retrying is the lookup client's job, not the provider's.

use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Transient provider failure. Always retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeProviderError {
    /// Connection or protocol failure
    Http(String),
    /// Non-success HTTP status
    Status(u16),
    /// Response lacks the fee field or it is not a non-negative integer
    MissingField(String),
    /// The blocking task running the request died
    Task(String),
}

impl fmt::Display for FeeProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Fee provider request failed: {}", e),
            Self::Status(code) => write!(f, "Fee provider returned HTTP {}", code),
            Self::MissingField(field) => write!(f, "Fee provider response has no usable '{}'", field),
            Self::Task(e) => write!(f, "Fee provider task failed: {}", e),
        }
    }
}

impl std::error::Error for FeeProviderError {}

impl From<reqwest::Error> for FeeProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FeeProviderError::Status(status.as_u16()),
            None => FeeProviderError::Http(e.to_string()),
        }
    }
}

/// Anything that can look up the fee of a transaction.
pub trait FeeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fee paid by `tx_id`, in satoshis. May block.
    fn get_fee(&self, tx_id: &str) -> Result<u64, FeeProviderError>;
}

/// JSON-over-HTTP explorer: GET `<base_url><tx_id>`, read an integer field.
#[derive(Debug, Clone)]
pub struct HttpFeeProvider {
    name: String,
    base_url: String,
    fee_field: String,
}

impl HttpFeeProvider {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, fee_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            fee_field: fee_field.into(),
        }
    }

    pub fn blocktrail() -> Self {
        Self::new(
            "blocktrail",
            "https://www.blocktrail.com/BTC/json/blockchain/tx/",
            "fee",
        )
    }

    pub fn blockcypher() -> Self {
        Self::new(
            "blockcypher",
            "https://api.blockcypher.com/v1/btc/main/txs/",
            "fees",
        )
    }

    /// Built-in provider by config name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "blocktrail" => Some(Self::blocktrail()),
            "blockcypher" => Some(Self::blockcypher()),
            _ => None,
        }
    }

    pub fn url_for(&self, tx_id: &str) -> String {
        format!("{}{}", self.base_url, tx_id)
    }

    /// Pull the fee out of a decoded response body.
    pub fn parse_fee(&self, body: &serde_json::Value) -> Result<u64, FeeProviderError> {
        body.get(self.fee_field.as_str())
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| FeeProviderError::MissingField(self.fee_field.clone()))
    }
}

impl FeeProvider for HttpFeeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_fee(&self, tx_id: &str) -> Result<u64, FeeProviderError> {
        // Built per call: the blocking client must live and die off the
        // async runtime threads.
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let body: serde_json::Value = client
            .get(self.url_for(tx_id))
            .header("User-Agent", "")
            .send()?
            .error_for_status()?
            .json()?;
        self.parse_fee(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_fields() {
        let blocktrail = HttpFeeProvider::blocktrail();
        assert_eq!(blocktrail.parse_fee(&json!({"fee": 2260})), Ok(2260));
        assert!(blocktrail.parse_fee(&json!({"fees": 2260})).is_err());

        let blockcypher = HttpFeeProvider::blockcypher();
        assert_eq!(blockcypher.parse_fee(&json!({"fees": 10000, "size": 225})), Ok(10000));
    }

    #[test]
    fn test_rejects_non_integer_fee() {
        let provider = HttpFeeProvider::blocktrail();
        assert_eq!(
            provider.parse_fee(&json!({"fee": "12"})),
            Err(FeeProviderError::MissingField("fee".to_string()))
        );
        assert!(provider.parse_fee(&json!({"fee": -1})).is_err());
    }

    #[test]
    fn test_url_and_lookup_by_name() {
        let provider = HttpFeeProvider::by_name("blockcypher").unwrap();
        assert_eq!(provider.name(), "blockcypher");
        assert_eq!(
            provider.url_for("abcd"),
            "https://api.blockcypher.com/v1/btc/main/txs/abcd"
        );
        assert!(HttpFeeProvider::by_name("unknown").is_none());
    }
}
