use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// One cached aggregate per logical key.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAggregateRecord {
    pub key: String,
    pub value: Value,
    pub updated_at: OffsetDateTime,
}

/// A generated roast. Rows double as the quota event log: the tracker counts
/// them, nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoastRecord {
    pub id: Uuid,
    pub username: String,
    pub fid: String,
    pub cast_hash: Option<String>,
    pub roast: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoastRecord {
    pub username: String,
    pub fid: String,
    pub cast_hash: Option<String>,
    pub roast: String,
}
