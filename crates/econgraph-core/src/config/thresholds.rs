//! Detection thresholds.
//!
//! These constants are the entire fraud model: every score, cap and cutoff
//! the kernels apply is read from here. The set is versioned so a result can
//! be traced back to the model that produced it; bump
//! [`THRESHOLDS_VERSION`] whenever a default changes.

use serde::{Deserialize, Serialize};

/// Version of the default threshold set.
pub const THRESHOLDS_VERSION: u32 = 1;

/// Complete, versioned threshold set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Threshold set version.
    pub version: u32,
    /// Relationship strength scoring.
    pub strength: StrengthWeights,
    /// PageRank parameters.
    pub pagerank: PageRankParams,
    /// Community detection parameters and scores.
    pub community: CommunityRules,
    /// Cycle enumeration limits and scores.
    pub cycles: CycleRules,
    /// Direct-relationship cluster rules.
    pub clusters: ClusterRules,
    /// Guild correlation rules.
    pub guild: GuildRules,
    /// Orchestrator fetch limits.
    pub network: NetworkLimits,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            version: THRESHOLDS_VERSION,
            strength: StrengthWeights::default(),
            pagerank: PageRankParams::default(),
            community: CommunityRules::default(),
            cycles: CycleRules::default(),
            clusters: ClusterRules::default(),
            guild: GuildRules::default(),
            network: NetworkLimits::default(),
        }
    }
}

/// Relationship strength: `round(f + a + d)`, each term capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthWeights {
    /// Transaction count at which the frequency term saturates.
    pub count_scale: f64,
    /// Maximum frequency contribution.
    pub count_weight: f64,
    /// Total amount at which the amount term saturates.
    pub amount_scale: f64,
    /// Maximum amount contribution.
    pub amount_weight: f64,
    /// Relationship age in days at which the duration term saturates.
    pub duration_scale_days: f64,
    /// Maximum duration contribution.
    pub duration_weight: f64,
}

impl Default for StrengthWeights {
    fn default() -> Self {
        Self {
            count_scale: 100.0,
            count_weight: 40.0,
            amount_scale: 1_000_000.0,
            amount_weight: 30.0,
            duration_scale_days: 365.0,
            duration_weight: 30.0,
        }
    }
}

/// PageRank parameters. Iteration count is fixed, not convergence-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankParams {
    /// Damping factor.
    pub damping: f64,
    /// Number of power iterations.
    pub iterations: u32,
    /// Number of ranked nodes reported as key nodes.
    pub key_node_limit: usize,
}

impl Default for PageRankParams {
    fn default() -> Self {
        Self {
            damping: 0.85,
            iterations: 20,
            key_node_limit: 10,
        }
    }
}

/// Community detection passes and suspicion scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityRules {
    /// Maximum local-move passes.
    pub max_passes: u32,
    /// Smallest community reported.
    pub min_size: usize,
    /// Density ratio above which a community counts as closed.
    pub high_density_ratio: f64,
    /// Minimum size for the density bonus.
    pub high_density_min_size: usize,
    /// Score added for a closed community.
    pub high_density_score: u32,
    /// Size band considered typical for an alt farm.
    pub small_group_min: usize,
    /// Upper end of the size band.
    pub small_group_max: usize,
    /// Score added for a community in the size band.
    pub small_group_score: u32,
    /// Average internal edge weight per member above which the group trades heavily.
    pub heavy_internal_per_member: f64,
    /// Score added for heavy internal trading.
    pub heavy_internal_score: u32,
    /// External share of edge weight below which the group is isolated.
    pub isolation_ratio: f64,
    /// Score added for isolation.
    pub isolation_score: u32,
}

impl Default for CommunityRules {
    fn default() -> Self {
        Self {
            max_passes: 10,
            min_size: 2,
            high_density_ratio: 0.8,
            high_density_min_size: 3,
            high_density_score: 30,
            small_group_min: 3,
            small_group_max: 10,
            small_group_score: 20,
            heavy_internal_per_member: 20.0,
            heavy_internal_score: 25,
            isolation_ratio: 0.2,
            isolation_score: 25,
        }
    }
}

/// Cycle enumeration limits and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleRules {
    /// Longest cycle enumerated, in nodes.
    pub max_cycle_length: usize,
    /// Number of cycles reported.
    pub max_results: usize,
    /// Base score for a 3-cycle.
    pub triangle_score: u32,
    /// Base score for a 4-cycle.
    pub square_score: u32,
    /// Base score for longer cycles.
    pub long_cycle_score: u32,
    /// Total amount above which the amount bonus applies.
    pub high_amount: f64,
    /// Amount bonus.
    pub high_amount_score: u32,
    /// Total transaction count above which the frequency bonus applies.
    pub high_count: u64,
    /// Frequency bonus.
    pub high_count_score: u32,
}

impl Default for CycleRules {
    fn default() -> Self {
        Self {
            max_cycle_length: 5,
            max_results: 10,
            triangle_score: 40,
            square_score: 35,
            long_cycle_score: 30,
            high_amount: 100_000.0,
            high_amount_score: 30,
            high_count: 50,
            high_count_score: 30,
        }
    }
}

/// Rule-based cluster heuristics over direct relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterRules {
    /// High-frequency rule: count must exceed this.
    pub high_frequency_count: u64,
    /// High-frequency rule: strength must exceed this.
    pub high_frequency_strength: u8,
    /// High-frequency rule: partners required to fire.
    pub high_frequency_min_partners: usize,
    /// High-frequency cluster score.
    pub high_frequency_score: u32,
    /// High-amount rule: total amount must exceed this.
    pub high_amount_total: f64,
    /// High-amount rule: average amount must exceed this.
    pub high_amount_average: f64,
    /// High-amount rule: partners required to fire.
    pub high_amount_min_partners: usize,
    /// High-amount cluster score.
    pub high_amount_score: u32,
    /// New-account rule: first transaction younger than this many days.
    pub new_account_max_age_days: i64,
    /// New-account rule: count must exceed this.
    pub new_account_count: u64,
    /// New-account rule: partners required to fire.
    pub new_account_min_partners: usize,
    /// New-account burst cluster score.
    pub new_account_score: u32,
}

impl Default for ClusterRules {
    fn default() -> Self {
        Self {
            high_frequency_count: 50,
            high_frequency_strength: 70,
            high_frequency_min_partners: 2,
            high_frequency_score: 85,
            high_amount_total: 1_000_000.0,
            high_amount_average: 10_000.0,
            high_amount_min_partners: 1,
            high_amount_score: 75,
            new_account_max_age_days: 7,
            new_account_count: 20,
            new_account_min_partners: 2,
            new_account_score: 90,
        }
    }
}

/// Guild correlation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildRules {
    /// Guilds analyzed per request.
    pub max_guilds: usize,
    /// Activity window in days.
    pub window_days: u32,
    /// Minimum in-window usage for a member to be sampled.
    pub min_usage: u64,
    /// Maximum sampled members per guild.
    pub member_limit: usize,
    /// Guilds with fewer qualifying members are skipped.
    pub min_members: usize,
    /// Circular pair: combined two-way count must exceed this.
    pub circular_min_count: u64,
    /// Circular pair: relative amount imbalance must stay below this.
    pub circular_max_imbalance: f64,
    /// Score for a member in a circular pair.
    pub circular_member_score: u32,
    /// High-frequency member: aggregated count must exceed this.
    pub high_frequency_count: u64,
    /// Score for a high-frequency member.
    pub high_frequency_member_score: u32,
    /// Circular pairs for the major bonus.
    pub circular_pairs_major: usize,
    /// Major circular bonus.
    pub circular_major_score: u32,
    /// Circular pairs for the minor bonus.
    pub circular_pairs_minor: usize,
    /// Minor circular bonus.
    pub circular_minor_score: u32,
    /// High-frequency members for the major bonus.
    pub high_frequency_major: usize,
    /// Major high-frequency bonus.
    pub high_frequency_major_score: u32,
    /// High-frequency members for the minor bonus.
    pub high_frequency_minor: usize,
    /// Minor high-frequency bonus.
    pub high_frequency_minor_score: u32,
    /// Suspicious-member ratio above which the major bonus applies.
    pub suspicious_ratio_major: f64,
    /// Major ratio bonus.
    pub suspicious_ratio_major_score: u32,
    /// Suspicious-member ratio above which the minor bonus applies.
    pub suspicious_ratio_minor: f64,
    /// Minor ratio bonus.
    pub suspicious_ratio_minor_score: u32,
    /// Guild score ceiling.
    pub max_score: u32,
}

impl Default for GuildRules {
    fn default() -> Self {
        Self {
            max_guilds: 3,
            window_days: 30,
            min_usage: 10,
            member_limit: 50,
            min_members: 3,
            circular_min_count: 30,
            circular_max_imbalance: 0.15,
            circular_member_score: 85,
            high_frequency_count: 100,
            high_frequency_member_score: 70,
            circular_pairs_major: 3,
            circular_major_score: 40,
            circular_pairs_minor: 1,
            circular_minor_score: 20,
            high_frequency_major: 5,
            high_frequency_major_score: 30,
            high_frequency_minor: 2,
            high_frequency_minor_score: 15,
            suspicious_ratio_major: 0.3,
            suspicious_ratio_major_score: 30,
            suspicious_ratio_minor: 0.1,
            suspicious_ratio_minor_score: 15,
            max_score: 100,
        }
    }
}

/// Fetch limits used by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkLimits {
    /// Direct relationships kept, by descending count.
    pub direct_limit: usize,
    /// Indirect relationships kept, by descending count.
    pub indirect_limit: usize,
    /// Indirect relationships need at least this many transactions.
    pub indirect_min_count: u64,
}

impl Default for NetworkLimits {
    fn default() -> Self {
        Self {
            direct_limit: 50,
            indirect_limit: 20,
            indirect_min_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_model() {
        let t = DetectionThresholds::default();
        assert_eq!(t.version, THRESHOLDS_VERSION);
        assert_eq!(t.pagerank.iterations, 20);
        assert!((t.pagerank.damping - 0.85).abs() < f64::EPSILON);
        assert_eq!(t.community.max_passes, 10);
        assert_eq!(t.cycles.max_cycle_length, 5);
        assert_eq!(t.clusters.high_frequency_score, 85);
        assert_eq!(t.clusters.high_amount_score, 75);
        assert_eq!(t.clusters.new_account_score, 90);
        assert_eq!(t.guild.high_frequency_member_score, 70);
        assert_eq!(t.network.direct_limit, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let t: DetectionThresholds = toml::from_str(
            r#"
            [cycles]
            max_cycle_length = 4
            "#,
        )
        .unwrap();
        assert_eq!(t.cycles.max_cycle_length, 4);
        assert_eq!(t.cycles.max_results, 10);
        assert_eq!(t.clusters, ClusterRules::default());
    }
}
