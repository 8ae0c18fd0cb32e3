//! Native-token transfer payloads returned to frame clients.

use serde::Serialize;
use thiserror::Error;

const WEI_DECIMALS: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("amount `{0}` is not a valid ether decimal")]
    InvalidAmount(String),
    #[error("chain id `{0}` is not a valid decimal or hex number")]
    InvalidChain(String),
    #[error("recipient address `{0}` is not a 20-byte hex address")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub chain_id: String,
    pub method: &'static str,
    pub params: TransactionParams,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionParams {
    pub abi: Vec<serde_json::Value>,
    pub to: String,
    pub data: &'static str,
    pub value: String,
}

impl TransactionPayload {
    /// Build an `eth_sendTransaction` request moving `amount` ether to `address`.
    pub fn native_transfer(address: &str, amount: &str, chain: &str) -> Result<Self, TxError> {
        let to = validate_address(address)?;
        let value = parse_ether(amount)?;
        let chain_id = parse_chain_id(chain)?;

        Ok(Self {
            chain_id: format!("eip155:{chain_id}"),
            method: "eth_sendTransaction",
            params: TransactionParams {
                abi: Vec::new(),
                to,
                data: "0x",
                value: value.to_string(),
            },
        })
    }
}

/// Convert a decimal ether amount into wei.
pub fn parse_ether(amount: &str) -> Result<u128, TxError> {
    let invalid = || TxError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || fraction.len() > WEI_DECIMALS
    {
        return Err(invalid());
    }

    let padded = format!("{fraction:0<WEI_DECIMALS$}");
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u128 = padded.parse().map_err(|_| invalid())?;

    whole
        .checked_mul(10u128.pow(WEI_DECIMALS as u32))
        .and_then(|wei| wei.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Accept `0x`-prefixed hex or plain decimal chain identifiers.
pub fn parse_chain_id(chain: &str) -> Result<u64, TxError> {
    let trimmed = chain.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| TxError::InvalidChain(chain.to_string()))
}

fn validate_address(address: &str) -> Result<String, TxError> {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| TxError::InvalidAddress(address.to_string()))?;
    match hex::decode(body) {
        Ok(bytes) if bytes.len() == 20 => Ok(trimmed.to_string()),
        _ => Err(TxError::InvalidAddress(address.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x01Ca6f13E48fC5E231351bA38e7E51A1a7835d8D";

    #[test]
    fn parse_ether_handles_fractions() {
        assert_eq!(parse_ether("1").unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(parse_ether("0.1").unwrap(), 100_000_000_000_000_000);
        assert_eq!(parse_ether(".5").unwrap(), 500_000_000_000_000_000);
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn parse_ether_rejects_garbage() {
        assert!(parse_ether("").is_err());
        assert!(parse_ether("1.2.3").is_err());
        assert!(parse_ether("-1").is_err());
        assert!(parse_ether("0.0000000000000000001").is_err());
    }

    #[test]
    fn chain_ids_accept_hex_and_decimal() {
        assert_eq!(parse_chain_id("666666666").unwrap(), 666_666_666);
        assert_eq!(parse_chain_id("0x2105").unwrap(), 8453);
        assert!(parse_chain_id("base").is_err());
    }

    #[test]
    fn native_transfer_payload_shape() {
        let payload = TransactionPayload::native_transfer(ADDRESS, "0.1", "0x2105").unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chainId"], "eip155:8453");
        assert_eq!(json["method"], "eth_sendTransaction");
        assert_eq!(json["params"]["to"], ADDRESS);
        assert_eq!(json["params"]["data"], "0x");
        assert_eq!(json["params"]["value"], "100000000000000000");
        assert_eq!(json["params"]["abi"], serde_json::json!([]));
    }

    #[test]
    fn rejects_short_addresses() {
        assert!(matches!(
            TransactionPayload::native_transfer("0x1234", "1", "1"),
            Err(TxError::InvalidAddress(_))
        ));
    }
}
