//! In-memory data provider over a JSON snapshot.
//!
//! A [`Snapshot`] is a frozen export of relationship aggregates plus guild
//! activity as of one instant. [`InMemoryProvider`] answers the
//! [`DataProvider`] queries from it, which makes analyses reproducible from a
//! file and keeps tests free of a database.

use crate::provider::DataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use econgraph_compliance::types::{ActiveMember, TransferAggregate};
use econgraph_core::error::{AnalysisError, ProviderError, Result};
use econgraph_graph::types::RelationshipRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// One use of a guild by a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildUsage {
    /// Guild ID.
    pub guild_id: String,
    /// Member account.
    pub user_id: String,
    /// When the usage happened.
    pub used_at: DateTime<Utc>,
}

/// Directional transfers between two members inside a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildTransfer {
    /// Guild ID.
    pub guild_id: String,
    /// Sender.
    pub from_user_id: String,
    /// Receiver.
    pub to_user_id: String,
    /// Transfers in this direction.
    pub transaction_count: u64,
    /// Amount moved in this direction.
    pub total_amount: f64,
}

/// Frozen export of the data an analysis reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Reference time for windows and account age.
    pub as_of: DateTime<Utc>,
    /// Undirected pairwise aggregates.
    #[serde(default)]
    pub relationships: Vec<RelationshipRow>,
    /// Guild usage events.
    #[serde(default)]
    pub guild_usage: Vec<GuildUsage>,
    /// Guild transfer aggregates.
    #[serde(default)]
    pub guild_transfers: Vec<GuildTransfer>,
}

impl Snapshot {
    /// Empty snapshot at `as_of`.
    pub fn empty(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            relationships: Vec::new(),
            guild_usage: Vec::new(),
            guild_transfers: Vec::new(),
        }
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a snapshot from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content).map_err(|e| {
            AnalysisError::SerializationError(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// [`DataProvider`] answering from a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    snapshot: Snapshot,
}

impl InMemoryProvider {
    /// Create a provider over `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Snapshot::from_file(path)?))
    }

    /// Reference time of the snapshot.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.snapshot.as_of
    }

    /// Underlying snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn counterparts(&self, user_id: &str) -> HashSet<&str> {
        self.snapshot
            .relationships
            .iter()
            .filter_map(|row| row.counterpart(user_id))
            .filter(|&other| other != user_id)
            .collect()
    }
}

fn by_count_desc(a: &RelationshipRow, b: &RelationshipRow) -> std::cmp::Ordering {
    b.transaction_count
        .cmp(&a.transaction_count)
        .then_with(|| a.user_id.cmp(&b.user_id))
        .then_with(|| a.related_user_id.cmp(&b.related_user_id))
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn get_direct_relationships(
        &self,
        user_id: &str,
    ) -> std::result::Result<Vec<RelationshipRow>, ProviderError> {
        let mut rows: Vec<RelationshipRow> = self
            .snapshot
            .relationships
            .iter()
            .filter(|row| matches!(row.counterpart(user_id), Some(other) if other != user_id))
            .map(|row| row.clone().oriented_to(user_id))
            .collect();
        rows.sort_by(by_count_desc);
        Ok(rows)
    }

    async fn get_indirect_relationships(
        &self,
        user_id: &str,
        exclude_ids: &[String],
    ) -> std::result::Result<Vec<RelationshipRow>, ProviderError> {
        let direct = self.counterparts(user_id);
        let excluded: HashSet<&str> = exclude_ids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(user_id))
            .collect();

        let mut rows: Vec<RelationshipRow> = self
            .snapshot
            .relationships
            .iter()
            .filter_map(|row| {
                let (a, b) = (row.user_id.as_str(), row.related_user_id.as_str());
                let anchor = if direct.contains(a) && !excluded.contains(b) {
                    a
                } else if direct.contains(b) && !excluded.contains(a) {
                    b
                } else {
                    return None;
                };
                Some(row.clone().oriented_to(anchor))
            })
            .collect();
        rows.sort_by(by_count_desc);
        Ok(rows)
    }

    async fn get_guild_active_members(
        &self,
        guild_id: &str,
        window_days: u32,
        min_usage: u64,
        limit: usize,
    ) -> std::result::Result<Vec<ActiveMember>, ProviderError> {
        let since = Duration::try_days(i64::from(window_days))
            .and_then(|window| self.snapshot.as_of.checked_sub_signed(window))
            .ok_or_else(|| {
                ProviderError::Query(format!(
                    "activity window of {} days reaches before the earliest timestamp",
                    window_days
                ))
            })?;

        let mut usage: HashMap<&str, u64> = HashMap::new();
        for event in &self.snapshot.guild_usage {
            if event.guild_id == guild_id
                && event.used_at >= since
                && event.used_at <= self.snapshot.as_of
            {
                *usage.entry(event.user_id.as_str()).or_insert(0) += 1;
            }
        }

        let mut members: Vec<ActiveMember> = usage
            .into_iter()
            .filter(|&(_, count)| count >= min_usage)
            .map(|(user_id, count)| ActiveMember::new(user_id, count))
            .collect();
        members.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        members.truncate(limit);
        Ok(members)
    }

    async fn get_member_transaction_matrix(
        &self,
        guild_id: &str,
        member_ids: &[String],
    ) -> std::result::Result<Vec<TransferAggregate>, ProviderError> {
        let members: HashSet<&str> = member_ids.iter().map(String::as_str).collect();

        let mut matrix: BTreeMap<(&str, &str), (u64, f64)> = BTreeMap::new();
        for transfer in &self.snapshot.guild_transfers {
            let from = transfer.from_user_id.as_str();
            let to = transfer.to_user_id.as_str();
            if transfer.guild_id != guild_id || !members.contains(from) || !members.contains(to) {
                continue;
            }
            let entry = matrix.entry((from, to)).or_insert((0, 0.0));
            entry.0 += transfer.transaction_count;
            entry.1 += transfer.total_amount;
        }

        Ok(matrix
            .into_iter()
            .map(|((from, to), (count, amount))| TransferAggregate::new(from, to, count, amount))
            .collect())
    }
}
