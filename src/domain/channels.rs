//! Channel directory aggregate statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, macros::datetime};

const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 7 * DAY_SECS;
const MONTH_SECS: i64 = 30 * DAY_SECS;
const TOP_N: usize = 10;
const CHANNEL_PRICE_USD: u64 = 25;
const MONTHLY_BREAKDOWN_SINCE: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

/// Envelope returned by the channel directory endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDirectory {
    pub result: ChannelList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub lead_fid: Option<u64>,
    #[serde(default)]
    pub moderator_fids: Vec<u64>,
    /// Unix seconds.
    pub created_at: i64,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub member_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_channels: usize,
    #[serde(rename = "totalUSDChannelPrice")]
    pub total_usd_channel_price: u64,
    pub avg_followers: f64,
    pub avg_members: f64,
    pub total_followers: u64,
    pub total_members: u64,
    pub avg_members_per_follower: f64,
    pub top10_channels_by_followers: Vec<String>,
    pub top10_channels_by_members: Vec<String>,
    pub avg_moderators: f64,
    pub channel_creation_growth: CreationGrowth,
    /// Month number (1-12) to channel count, for channels created since 2024.
    pub channels_created_by_month: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreationGrowth {
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
}

impl ChannelStats {
    pub fn compute(channels: &[Channel], now: OffsetDateTime) -> Self {
        let total_channels = channels.len();
        let total_followers: u64 = channels.iter().map(|c| c.follower_count).sum();
        let total_members: u64 = channels.iter().map(|c| c.member_count).sum();
        let total_moderators: usize = channels.iter().map(|c| c.moderator_fids.len()).sum();

        // Members are ranked from the follower ordering so ties keep the same order.
        let mut ranked: Vec<&Channel> = channels.iter().collect();
        ranked.sort_by(|a, b| b.follower_count.cmp(&a.follower_count));
        let top10_channels_by_followers = ranked
            .iter()
            .take(TOP_N)
            .map(|c| format!("{} - {} - [{}]", c.id, c.name, c.follower_count))
            .collect();
        ranked.sort_by(|a, b| b.member_count.cmp(&a.member_count));
        let top10_channels_by_members = ranked
            .iter()
            .take(TOP_N)
            .map(|c| format!("{} - {} - [{}]", c.id, c.name, c.member_count))
            .collect();

        let now_secs = now.unix_timestamp();
        let created_since = |secs: i64| {
            channels
                .iter()
                .filter(|c| c.created_at > now_secs - secs)
                .count()
        };

        let since = MONTHLY_BREAKDOWN_SINCE.unix_timestamp();
        let mut channels_created_by_month = BTreeMap::new();
        for channel in channels.iter().filter(|c| c.created_at > since) {
            if let Ok(created) = OffsetDateTime::from_unix_timestamp(channel.created_at) {
                *channels_created_by_month
                    .entry(u8::from(created.month()))
                    .or_insert(0) += 1;
            }
        }

        Self {
            total_channels,
            total_usd_channel_price: total_channels as u64 * CHANNEL_PRICE_USD,
            avg_followers: ratio(total_followers as f64, total_channels as f64),
            avg_members: ratio(total_members as f64, total_channels as f64),
            total_followers,
            total_members,
            avg_members_per_follower: ratio(total_members as f64, total_followers as f64),
            top10_channels_by_followers,
            top10_channels_by_members,
            avg_moderators: ratio(total_moderators as f64, total_channels as f64),
            channel_creation_growth: CreationGrowth {
                daily: created_since(DAY_SECS),
                weekly: created_since(WEEK_SECS),
                monthly: created_since(MONTH_SECS),
            },
            channels_created_by_month,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn channel(id: &str, followers: u64, members: u64, created_at: i64) -> Channel {
        Channel {
            id: id.to_string(),
            name: id.to_uppercase(),
            url: String::new(),
            lead_fid: None,
            moderator_fids: vec![1],
            created_at,
            follower_count: followers,
            member_count: members,
        }
    }

    #[test]
    fn empty_directory_yields_zeroes() {
        let stats = ChannelStats::compute(&[], datetime!(2024-06-01 00:00 UTC));
        assert_eq!(stats.total_channels, 0);
        assert_eq!(stats.avg_followers, 0.0);
        assert_eq!(stats.avg_members_per_follower, 0.0);
        assert!(stats.top10_channels_by_followers.is_empty());
    }

    #[test]
    fn aggregates_and_rankings() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let now_secs = now.unix_timestamp();
        let channels = vec![
            channel("a", 10, 5, now_secs - 3_600),
            channel("b", 30, 1, now_secs - 3 * DAY_SECS),
            channel("c", 20, 9, now_secs - 20 * DAY_SECS),
            channel("d", 0, 0, datetime!(2023-05-01 00:00 UTC).unix_timestamp()),
        ];

        let stats = ChannelStats::compute(&channels, now);

        assert_eq!(stats.total_channels, 4);
        assert_eq!(stats.total_usd_channel_price, 100);
        assert_eq!(stats.total_followers, 60);
        assert_eq!(stats.total_members, 15);
        assert_eq!(stats.avg_followers, 15.0);
        assert_eq!(stats.avg_members_per_follower, 0.25);
        assert_eq!(stats.avg_moderators, 1.0);
        assert_eq!(
            stats.top10_channels_by_followers,
            vec!["b - B - [30]", "c - C - [20]", "a - A - [10]", "d - D - [0]"]
        );
        assert_eq!(stats.top10_channels_by_members[0], "c - C - [9]");
        assert_eq!(
            stats.channel_creation_growth,
            CreationGrowth {
                daily: 1,
                weekly: 2,
                monthly: 3
            }
        );
        assert_eq!(stats.channels_created_by_month.get(&6), Some(&2));
        assert_eq!(stats.channels_created_by_month.get(&5), Some(&1));
        assert_eq!(stats.channels_created_by_month.values().sum::<u64>(), 3);
    }

    #[test]
    fn serializes_with_directory_field_names() {
        let stats = ChannelStats::compute(&[], datetime!(2024-06-01 00:00 UTC));
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalUSDChannelPrice").is_some());
        assert!(json.get("top10ChannelsByFollowers").is_some());
        assert!(json.get("channelCreationGrowth").is_some());
    }
}
