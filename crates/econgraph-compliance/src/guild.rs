//! Guild correlation analysis.
//!
//! Applies scaled-down cluster and cycle heuristics to the transfers among a
//! guild's active members:
//!
//! - a **circular-flow pair** is an unordered pair with transfers in both
//!   directions, a combined count above 30 and an amount imbalance
//!   `|ab - ba| / (ab + ba)` below 0.15; both members are flagged (85)
//! - a **high-frequency member** sends and receives more than 100 transfers
//!   in the window (70)
//!
//! A member flagged by both rules keeps the higher score and both reasons.
//! The guild score adds tiered bonuses for circular pairs, high-frequency
//! members and the share of flagged members, capped at `max_score`.

use crate::messages::{GuildInput, GuildOutput};
use crate::types::{GuildCorrelation, GuildSample, GuildStatistics, SuspiciousMember};
use async_trait::async_trait;
use econgraph_core::{
    config::GuildRules,
    deadline::DeadlineContext,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ratio,
    traits::{AnalysisKernel, BatchKernel},
};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

#[derive(Debug, Default)]
struct MemberFlow {
    transaction_count: u64,
    inflow: f64,
    outflow: f64,
    score: u32,
    reasons: Vec<String>,
}

impl MemberFlow {
    fn flag(&mut self, score: u32, reason: String) {
        self.score = self.score.max(score);
        self.reasons.push(reason);
    }
}

/// Guild correlation kernel.
#[derive(Debug, Clone)]
pub struct GuildCorrelationAnalyzer {
    metadata: KernelMetadata,
    rules: GuildRules,
}

impl Default for GuildCorrelationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GuildCorrelationAnalyzer {
    /// Create an analyzer with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(GuildRules::default())
    }

    /// Create an analyzer with explicit rules.
    #[must_use]
    pub fn with_rules(rules: GuildRules) -> Self {
        Self {
            metadata: KernelMetadata::new("compliance/guild-correlation", Domain::Compliance)
                .with_description("Circular pairs and high-frequency members among guild members")
                .with_complexity("O(members + transfers)"),
            rules,
        }
    }

    /// Whether a guild has enough active members to be analyzed.
    #[must_use]
    pub fn has_sufficient_sample(member_count: usize, rules: &GuildRules) -> bool {
        member_count >= rules.min_members
    }

    /// Analyze every sample, most suspicious guild first.
    ///
    /// Samples with too few members are skipped. The deadline is checked once
    /// per guild.
    pub fn compute_all(
        samples: &[GuildSample],
        rules: &GuildRules,
        deadline: &DeadlineContext,
    ) -> Result<Vec<GuildCorrelation>> {
        let mut correlations = Vec::with_capacity(samples.len());
        for sample in samples {
            deadline.check()?;
            if !Self::has_sufficient_sample(sample.members.len(), rules) {
                tracing::warn!(
                    guild_id = %sample.guild_id,
                    members = sample.members.len(),
                    "Skipping guild with insufficient active members"
                );
                continue;
            }
            correlations.push(Self::compute(sample, rules));
        }
        correlations.sort_by(|a, b| b.suspicion_score.cmp(&a.suspicion_score));
        Ok(correlations)
    }

    /// Analyze one guild.
    ///
    /// Transfers with an endpoint outside the member list are ignored.
    pub fn compute(sample: &GuildSample, rules: &GuildRules) -> GuildCorrelation {
        let member_ids: HashSet<&str> = sample.members.iter().map(|m| m.user_id.as_str()).collect();

        let mut directed: BTreeMap<(&str, &str), (u64, f64)> = BTreeMap::new();
        for transfer in &sample.transfers {
            let from = transfer.from_user_id.as_str();
            let to = transfer.to_user_id.as_str();
            if from == to || !member_ids.contains(from) || !member_ids.contains(to) {
                continue;
            }
            let entry = directed.entry((from, to)).or_insert((0, 0.0));
            entry.0 += transfer.transaction_count;
            entry.1 += transfer.total_amount;
        }

        let mut flows: BTreeMap<&str, MemberFlow> = sample
            .members
            .iter()
            .map(|m| (m.user_id.as_str(), MemberFlow::default()))
            .collect();
        let mut total_transactions = 0u64;
        let mut total_amount = 0.0;

        for (&(from, to), &(count, amount)) in &directed {
            total_transactions += count;
            total_amount += amount;
            if let Some(flow) = flows.get_mut(from) {
                flow.transaction_count += count;
                flow.outflow += amount;
            }
            if let Some(flow) = flows.get_mut(to) {
                flow.transaction_count += count;
                flow.inflow += amount;
            }
        }

        let mut circular_flow_pairs = 0usize;
        for (&(a, b), &(count_ab, amount_ab)) in &directed {
            if a > b {
                continue;
            }
            let Some(&(count_ba, amount_ba)) = directed.get(&(b, a)) else {
                continue;
            };
            let imbalance = ratio((amount_ab - amount_ba).abs(), amount_ab + amount_ba);
            if count_ab + count_ba > rules.circular_min_count
                && imbalance < rules.circular_max_imbalance
            {
                circular_flow_pairs += 1;
                for (member, partner) in [(a, b), (b, a)] {
                    if let Some(flow) = flows.get_mut(member) {
                        flow.flag(
                            rules.circular_member_score,
                            format!("Participates in circular-flow with {}", partner),
                        );
                    }
                }
            }
        }

        let mut high_frequency_members = 0usize;
        for flow in flows.values_mut() {
            if flow.transaction_count > rules.high_frequency_count {
                high_frequency_members += 1;
                let reason = format!(
                    "High transaction frequency: {} transfers in {} days",
                    flow.transaction_count, rules.window_days
                );
                flow.flag(rules.high_frequency_member_score, reason);
            }
        }

        let mut suspicious_members: Vec<SuspiciousMember> = flows
            .into_iter()
            .filter(|(_, flow)| flow.score > 0)
            .map(|(user_id, flow)| SuspiciousMember {
                user_id: user_id.to_string(),
                suspicion_score: flow.score,
                reasons: flow.reasons,
                transaction_count: flow.transaction_count,
                total_amount: flow.inflow + flow.outflow,
                net_flow: flow.inflow - flow.outflow,
            })
            .collect();
        suspicious_members.sort_by(|a, b| {
            b.suspicion_score
                .cmp(&a.suspicion_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let member_count = sample.members.len();
        let flagged_share = ratio(suspicious_members.len() as f64, member_count as f64);

        let mut score = 0u32;
        let mut patterns = Vec::new();

        if circular_flow_pairs >= rules.circular_pairs_major {
            score += rules.circular_major_score;
        } else if circular_flow_pairs >= rules.circular_pairs_minor {
            score += rules.circular_minor_score;
        }
        if circular_flow_pairs > 0 {
            patterns.push(format!(
                "{} balanced circular-flow pairs among members",
                circular_flow_pairs
            ));
        }

        if high_frequency_members >= rules.high_frequency_major {
            score += rules.high_frequency_major_score;
        } else if high_frequency_members >= rules.high_frequency_minor {
            score += rules.high_frequency_minor_score;
        }
        if high_frequency_members > 0 {
            patterns.push(format!(
                "{} members exceed {} transfers in the window",
                high_frequency_members, rules.high_frequency_count
            ));
        }

        if flagged_share > rules.suspicious_ratio_major {
            score += rules.suspicious_ratio_major_score;
        } else if flagged_share > rules.suspicious_ratio_minor {
            score += rules.suspicious_ratio_minor_score;
        }
        if !suspicious_members.is_empty() {
            patterns.push(format!(
                "{:.0}% of active members flagged",
                flagged_share * 100.0
            ));
        }

        tracing::debug!(
            guild_id = %sample.guild_id,
            circular_flow_pairs,
            high_frequency_members,
            score,
            "Guild correlation computed"
        );

        GuildCorrelation {
            guild_id: sample.guild_id.clone(),
            suspicion_score: score.min(rules.max_score),
            member_count,
            suspicious_members,
            patterns,
            statistics: GuildStatistics {
                total_transactions,
                total_amount,
                avg_transactions_per_member: ratio(total_transactions as f64, member_count as f64),
                high_frequency_members,
                circular_flow_pairs,
            },
        }
    }
}

impl AnalysisKernel for GuildCorrelationAnalyzer {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<GuildInput, GuildOutput> for GuildCorrelationAnalyzer {
    async fn execute(&self, input: GuildInput) -> Result<GuildOutput> {
        let start = Instant::now();
        let correlations =
            Self::compute_all(&input.samples, &self.rules, &DeadlineContext::unbounded())?;
        Ok(GuildOutput {
            correlations,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActiveMember, TransferAggregate};
    use econgraph_core::error::AnalysisError;

    fn members(ids: &[&str]) -> Vec<ActiveMember> {
        ids.iter().map(|id| ActiveMember::new(*id, 12)).collect()
    }

    fn sample(ids: &[&str], transfers: Vec<TransferAggregate>) -> GuildSample {
        GuildSample {
            guild_id: "g1".into(),
            members: members(ids),
            transfers,
        }
    }

    fn analyze(sample: &GuildSample) -> GuildCorrelation {
        GuildCorrelationAnalyzer::compute(sample, &GuildRules::default())
    }

    #[test]
    fn test_metadata() {
        assert_eq!(
            GuildCorrelationAnalyzer::new().id(),
            "compliance/guild-correlation"
        );
    }

    #[test]
    fn test_quiet_guild_scores_zero() {
        let result = analyze(&sample(
            &["a", "b", "c"],
            vec![TransferAggregate::new("a", "b", 3, 300.0)],
        ));
        assert_eq!(result.suspicion_score, 0);
        assert!(result.suspicious_members.is_empty());
        assert!(result.patterns.is_empty());
        assert_eq!(result.member_count, 3);
        assert_eq!(result.statistics.total_transactions, 3);
        assert!((result.statistics.avg_transactions_per_member - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_pair_is_circular() {
        let result = analyze(&sample(
            &["a", "b", "c", "d"],
            vec![
                TransferAggregate::new("a", "b", 16, 10_000.0),
                TransferAggregate::new("b", "a", 16, 9_500.0),
            ],
        ));

        assert_eq!(result.statistics.circular_flow_pairs, 1);
        assert_eq!(result.suspicious_members.len(), 2);
        let a = &result.suspicious_members[0];
        assert_eq!(a.user_id, "a");
        assert_eq!(a.suspicion_score, 85);
        assert_eq!(a.transaction_count, 32);
        assert!((a.net_flow - (-500.0)).abs() < 1e-9);
        assert!((a.total_amount - 19_500.0).abs() < 1e-9);
        // one pair (+20) and half the members flagged (+30)
        assert_eq!(result.suspicion_score, 50);
    }

    #[test]
    fn test_unbalanced_or_light_pair_is_not_circular() {
        let unbalanced = analyze(&sample(
            &["a", "b", "c"],
            vec![
                TransferAggregate::new("a", "b", 20, 10_000.0),
                TransferAggregate::new("b", "a", 20, 5_000.0),
            ],
        ));
        assert_eq!(unbalanced.statistics.circular_flow_pairs, 0);

        let light = analyze(&sample(
            &["a", "b", "c"],
            vec![
                TransferAggregate::new("a", "b", 15, 1_000.0),
                TransferAggregate::new("b", "a", 15, 1_000.0),
            ],
        ));
        assert_eq!(light.statistics.circular_flow_pairs, 0);

        let one_way = analyze(&sample(
            &["a", "b", "c"],
            vec![TransferAggregate::new("a", "b", 90, 1_000.0)],
        ));
        assert_eq!(one_way.statistics.circular_flow_pairs, 0);
    }

    #[test]
    fn test_high_frequency_members() {
        let result = analyze(&sample(
            &["hub", "a", "b", "c", "d", "e", "f", "g", "h", "i"],
            vec![
                TransferAggregate::new("hub", "a", 60, 100.0),
                TransferAggregate::new("hub", "b", 60, 100.0),
            ],
        ));

        assert_eq!(result.statistics.high_frequency_members, 1);
        let hub = &result.suspicious_members[0];
        assert_eq!(hub.user_id, "hub");
        assert_eq!(hub.suspicion_score, 70);
        assert!((hub.net_flow + 200.0).abs() < 1e-9);
        // 1 of 10 flagged is not above the 0.1 ratio; one high-frequency member earns nothing.
        assert_eq!(result.suspicion_score, 0);
        assert_eq!(result.patterns.len(), 2);
    }

    #[test]
    fn test_member_in_both_rules_keeps_highest_score() {
        let result = analyze(&sample(
            &["a", "b", "c"],
            vec![
                TransferAggregate::new("a", "b", 60, 50_000.0),
                TransferAggregate::new("b", "a", 60, 50_000.0),
            ],
        ));
        let a = &result.suspicious_members[0];
        assert_eq!(a.suspicion_score, 85);
        assert_eq!(a.reasons.len(), 2);
        // one pair (+20), two high-frequency members (+15), 2/3 flagged (+30)
        assert_eq!(result.suspicion_score, 65);
    }

    #[test]
    fn test_score_is_capped() {
        let ids = ["a", "b", "c", "d", "e", "f"];
        let mut transfers = Vec::new();
        for pair in ids.chunks(2) {
            transfers.push(TransferAggregate::new(pair[0], pair[1], 60, 1_000.0));
            transfers.push(TransferAggregate::new(pair[1], pair[0], 60, 1_000.0));
        }
        let result = analyze(&sample(&ids, transfers));
        assert_eq!(result.statistics.circular_flow_pairs, 3);
        assert_eq!(result.statistics.high_frequency_members, 6);
        // 40 + 30 + 30 = 100
        assert_eq!(result.suspicion_score, 100);
    }

    #[test]
    fn test_zero_amount_pair_counts_as_balanced() {
        let result = analyze(&sample(
            &["a", "b", "c"],
            vec![
                TransferAggregate::new("a", "b", 20, 0.0),
                TransferAggregate::new("b", "a", 20, 0.0),
            ],
        ));
        assert_eq!(result.statistics.circular_flow_pairs, 1);
    }

    #[test]
    fn test_outside_transfers_ignored() {
        let result = analyze(&sample(
            &["a", "b", "c"],
            vec![TransferAggregate::new("a", "outsider", 500, 1e6)],
        ));
        assert_eq!(result.statistics.total_transactions, 0);
        assert!(result.suspicious_members.is_empty());
    }

    #[test]
    fn test_compute_all_skips_small_guilds_and_sorts() {
        let quiet = sample(&["a", "b", "c"], Vec::new());
        let small = GuildSample {
            guild_id: "small".into(),
            members: members(&["x", "y"]),
            transfers: Vec::new(),
        };
        let busy = GuildSample {
            guild_id: "busy".into(),
            ..sample(
                &["a", "b", "c"],
                vec![
                    TransferAggregate::new("a", "b", 20, 100.0),
                    TransferAggregate::new("b", "a", 20, 100.0),
                ],
            )
        };

        let results = GuildCorrelationAnalyzer::compute_all(
            &[quiet, small, busy],
            &GuildRules::default(),
            &DeadlineContext::unbounded(),
        )
        .unwrap();

        let ids: Vec<&str> = results.iter().map(|g| g.guild_id.as_str()).collect();
        assert_eq!(ids, vec!["busy", "g1"]);
    }

    #[test]
    fn test_compute_all_honors_cancellation() {
        let deadline = DeadlineContext::unbounded();
        deadline.cancel();
        let err = GuildCorrelationAnalyzer::compute_all(
            &[sample(&["a", "b", "c"], Vec::new())],
            &GuildRules::default(),
            &deadline,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
    }
}
