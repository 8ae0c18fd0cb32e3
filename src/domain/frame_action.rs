//! Payload posted by frame clients when a button is pressed.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameActionBody {
    pub untrusted_data: UntrustedData,
    #[serde(default)]
    pub trusted_data: Option<TrustedData>,
}

/// Client-reported fields. Only trustworthy once the signed message has been
/// verified.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UntrustedData {
    pub fid: u64,
    pub url: Option<String>,
    pub message_hash: Option<String>,
    pub timestamp: Option<u64>,
    pub network: Option<u64>,
    pub button_index: Option<u8>,
    pub input_text: Option<String>,
    pub cast_id: Option<CastId>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CastId {
    pub fid: u64,
    pub hash: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrustedData {
    /// Hex-encoded protobuf message signed by the caller.
    pub message_bytes: String,
}

impl FrameActionBody {
    pub fn fid(&self) -> u64 {
        self.untrusted_data.fid
    }

    pub fn input_text(&self) -> Option<&str> {
        self.untrusted_data
            .input_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn cast_hash(&self) -> Option<&str> {
        self.untrusted_data
            .cast_id
            .as_ref()
            .map(|cast| cast.hash.as_str())
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.untrusted_data
            .transaction_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    pub fn message_bytes(&self) -> Option<&str> {
        self.trusted_data
            .as_ref()
            .map(|trusted| trusted.message_bytes.as_str())
    }
}
