//! Suspicious cluster heuristics.
//!
//! Three independent rules over a target account's direct relationships.
//! Each rule yields at most one cluster of the target plus its qualifying
//! partners, and rules never suppress one another:
//!
//! | Rule | Partner qualifies when | Fires with |
//! |---|---|---|
//! | high frequency | `count > 50` and `strength > 70` | 2 partners |
//! | high amount | `total > 1_000_000` and `avg > 10_000` | 1 partner |
//! | new-account burst | first seen `< 7` days ago and `count > 20` | 2 partners |
//!
//! Every threshold and score lives in [`ClusterRules`].

use crate::messages::{ClusterInput, ClusterOutput};
use crate::types::{ClusterKind, SuspiciousCluster, TransactionPattern};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use econgraph_core::{
    config::ClusterRules,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ratio,
    traits::{AnalysisKernel, BatchKernel},
};
use econgraph_graph::types::UserRelationship;
use std::time::Instant;

/// Rule-based suspicious cluster detection kernel.
#[derive(Debug, Clone)]
pub struct SuspiciousClusterDetector {
    metadata: KernelMetadata,
    rules: ClusterRules,
}

impl Default for SuspiciousClusterDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SuspiciousClusterDetector {
    /// Create a detector with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(ClusterRules::default())
    }

    /// Create a detector with explicit rules.
    #[must_use]
    pub fn with_rules(rules: ClusterRules) -> Self {
        Self {
            metadata: KernelMetadata::new("compliance/suspicious-clusters", Domain::Compliance)
                .with_description("High-frequency, high-amount and new-account burst cluster rules")
                .with_complexity("O(direct relationships)"),
            rules,
        }
    }

    /// Configured rules.
    #[must_use]
    pub fn rules(&self) -> &ClusterRules {
        &self.rules
    }

    /// Run every rule against `relationships` as of `now`.
    ///
    /// Clusters come back in rule order: high frequency, high amount, new
    /// account burst.
    pub fn compute(
        target: &str,
        relationships: &[UserRelationship],
        rules: &ClusterRules,
        now: DateTime<Utc>,
    ) -> Vec<SuspiciousCluster> {
        let mut clusters = Vec::new();

        let frequent: Vec<&UserRelationship> = relationships
            .iter()
            .filter(|r| {
                r.transaction_count > rules.high_frequency_count
                    && r.relationship_strength > rules.high_frequency_strength
            })
            .collect();
        if frequent.len() >= rules.high_frequency_min_partners {
            clusters.push(Self::cluster(
                target,
                ClusterKind::HighFrequency,
                &frequent,
                rules.high_frequency_score,
                vec![
                    format!(
                        "{} partners with more than {} transactions and strength above {}",
                        frequent.len(),
                        rules.high_frequency_count,
                        rules.high_frequency_strength
                    ),
                    "Tight repeated trading suggests coordinated accounts".to_string(),
                ],
            ));
        }

        let heavy: Vec<&UserRelationship> = relationships
            .iter()
            .filter(|r| {
                r.total_amount > rules.high_amount_total && r.avg_amount > rules.high_amount_average
            })
            .collect();
        if heavy.len() >= rules.high_amount_min_partners {
            let moved: f64 = heavy.iter().map(|r| r.total_amount).sum();
            clusters.push(Self::cluster(
                target,
                ClusterKind::HighAmount,
                &heavy,
                rules.high_amount_score,
                vec![
                    format!(
                        "{} partners moved over {:.0} with average transfers above {:.0}",
                        heavy.len(),
                        rules.high_amount_total,
                        rules.high_amount_average
                    ),
                    format!("Combined volume of {:.0}", moved),
                ],
            ));
        }

        let cutoff = Duration::try_days(rules.new_account_max_age_days)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let fresh: Vec<&UserRelationship> = relationships
            .iter()
            .filter(|r| r.first_transaction > cutoff && r.transaction_count > rules.new_account_count)
            .collect();
        if fresh.len() >= rules.new_account_min_partners {
            clusters.push(Self::cluster(
                target,
                ClusterKind::NewAccountBurst,
                &fresh,
                rules.new_account_score,
                vec![
                    format!(
                        "{} partners first seen within {} days with more than {} transactions",
                        fresh.len(),
                        rules.new_account_max_age_days,
                        rules.new_account_count
                    ),
                    "Burst of activity from new accounts resembles an alt farm".to_string(),
                ],
            ));
        }

        tracing::debug!(target_user = target, clusters = clusters.len(), "Cluster rules evaluated");
        clusters
    }

    /// Run every rule with this detector's rules.
    pub fn detect(
        &self,
        target: &str,
        relationships: &[UserRelationship],
        now: DateTime<Utc>,
    ) -> Vec<SuspiciousCluster> {
        Self::compute(target, relationships, &self.rules, now)
    }

    fn cluster(
        target: &str,
        kind: ClusterKind,
        members: &[&UserRelationship],
        score: u32,
        reasons: Vec<String>,
    ) -> SuspiciousCluster {
        let mut user_ids = Vec::with_capacity(members.len() + 1);
        user_ids.push(target.to_string());
        user_ids.extend(members.iter().map(|r| partner_of(r, target).to_string()));

        SuspiciousCluster {
            cluster_id: format!("{}:{}", kind, target),
            kind,
            user_ids,
            suspicion_score: score.min(100),
            reasons,
            transaction_pattern: pattern_of(members),
        }
    }
}

fn partner_of<'a>(relationship: &'a UserRelationship, target: &str) -> &'a str {
    if relationship.user_id == target {
        &relationship.related_user_id
    } else {
        &relationship.user_id
    }
}

fn pattern_of(members: &[&UserRelationship]) -> TransactionPattern {
    let total_transactions: u64 = members.iter().map(|r| r.transaction_count).sum();
    let total_amount: f64 = members.iter().map(|r| r.total_amount).sum();

    let first = members.iter().map(|r| r.first_transaction).min();
    let last = members.iter().map(|r| r.last_transaction).max();
    let time_span_days = match (first, last) {
        (Some(first), Some(last)) => (last - first).num_seconds().max(0) as f64 / 86_400.0,
        _ => 0.0,
    };

    TransactionPattern {
        total_transactions,
        total_amount,
        time_span_days,
        avg_interval_hours: ratio(time_span_days * 24.0, total_transactions as f64),
    }
}

impl AnalysisKernel for SuspiciousClusterDetector {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<ClusterInput, ClusterOutput> for SuspiciousClusterDetector {
    async fn execute(&self, input: ClusterInput) -> Result<ClusterOutput> {
        let start = Instant::now();
        let clusters = self.detect(&input.target_user_id, &input.relationships, input.as_of);
        Ok(ClusterOutput {
            clusters,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(
        partner: &str,
        count: u64,
        amount: f64,
        strength: u8,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    ) -> UserRelationship {
        UserRelationship {
            user_id: "T".into(),
            related_user_id: partner.into(),
            transaction_count: count,
            total_amount: amount,
            avg_amount: ratio(amount, count as f64),
            first_transaction: first,
            last_transaction: last,
            relationship_strength: strength,
        }
    }

    fn old(partner: &str, count: u64, amount: f64, strength: u8) -> UserRelationship {
        let now = Utc::now();
        rel(partner, count, amount, strength, now - Duration::days(400), now)
    }

    fn kinds(clusters: &[SuspiciousCluster]) -> Vec<ClusterKind> {
        clusters.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_metadata() {
        let detector = SuspiciousClusterDetector::new();
        assert_eq!(detector.id(), "compliance/suspicious-clusters");
        assert_eq!(detector.rules().new_account_score, 90);
    }

    #[test]
    fn test_no_relationships_no_clusters() {
        assert!(SuspiciousClusterDetector::new().detect("T", &[], Utc::now()).is_empty());
    }

    #[test]
    fn test_new_account_burst_needs_two_partners() {
        let now = Utc::now();
        let three_days_ago = now - Duration::days(3);
        let one = vec![rel("N1", 25, 500.0, 30, three_days_ago, now)];
        let two = vec![
            rel("N1", 25, 500.0, 30, three_days_ago, now),
            rel("N2", 25, 500.0, 30, three_days_ago, now),
        ];
        let detector = SuspiciousClusterDetector::new();

        assert!(detector.detect("T", &one, now).is_empty());

        let clusters = detector.detect("T", &two, now);
        assert_eq!(kinds(&clusters), vec![ClusterKind::NewAccountBurst]);
        assert_eq!(clusters[0].suspicion_score, 90);
        assert_eq!(clusters[0].user_ids, vec!["T", "N1", "N2"]);
        assert_eq!(clusters[0].cluster_id, "new_account_burst:T");
        assert_eq!(clusters[0].transaction_pattern.total_transactions, 50);
    }

    #[test]
    fn test_out_of_range_max_age_admits_every_partner() {
        let now = Utc::now();
        let rels = vec![old("N1", 25, 500.0, 30), old("N2", 25, 500.0, 30)];

        for max_age in [100_000_000, i64::MAX] {
            let rules = ClusterRules {
                new_account_max_age_days: max_age,
                ..ClusterRules::default()
            };
            let clusters = SuspiciousClusterDetector::compute("T", &rels, &rules, now);
            assert_eq!(kinds(&clusters), vec![ClusterKind::NewAccountBurst]);
        }
    }

    #[test]
    fn test_old_partners_are_not_new_accounts() {
        let now = Utc::now();
        let rels = vec![
            rel("N1", 25, 500.0, 30, now - Duration::days(8), now),
            rel("N2", 25, 500.0, 30, now - Duration::days(8), now),
        ];
        assert!(SuspiciousClusterDetector::new().detect("T", &rels, now).is_empty());
    }

    #[test]
    fn test_high_amount_single_partner() {
        let rels = vec![old("B", 60, 2_000_000.0, 54), old("C", 5, 1_000.0, 0)];
        let clusters = SuspiciousClusterDetector::new().detect("T", &rels, Utc::now());

        assert_eq!(kinds(&clusters), vec![ClusterKind::HighAmount]);
        assert_eq!(clusters[0].user_ids, vec!["T", "B"]);
        assert_eq!(clusters[0].suspicion_score, 75);
        assert!((clusters[0].transaction_pattern.total_amount - 2_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_high_amount_requires_large_average() {
        // 2M spread over 1000 transfers averages 2000.
        let rels = vec![old("B", 1_000, 2_000_000.0, 80)];
        let clusters = SuspiciousClusterDetector::new().detect("T", &rels, Utc::now());
        assert!(clusters.iter().all(|c| c.kind != ClusterKind::HighAmount));
    }

    #[test]
    fn test_high_frequency_needs_strength_and_two_partners() {
        let detector = SuspiciousClusterDetector::new();
        let now = Utc::now();

        let one = vec![old("F1", 80, 100.0, 75), old("F2", 80, 100.0, 60)];
        assert!(detector.detect("T", &one, now).is_empty());

        let two = vec![old("F1", 80, 100.0, 75), old("F2", 51, 100.0, 71)];
        let clusters = detector.detect("T", &two, now);
        assert_eq!(kinds(&clusters), vec![ClusterKind::HighFrequency]);
        assert_eq!(clusters[0].suspicion_score, 85);
        assert_eq!(clusters[0].reasons.len(), 2);
    }

    #[test]
    fn test_rules_are_independent() {
        let now = Utc::now();
        let recent = now - Duration::days(2);
        let rels = vec![
            rel("X", 100, 3_000_000.0, 90, recent, now),
            rel("Y", 100, 3_000_000.0, 90, recent, now),
        ];
        let clusters = SuspiciousClusterDetector::new().detect("T", &rels, now);
        assert_eq!(
            kinds(&clusters),
            vec![
                ClusterKind::HighFrequency,
                ClusterKind::HighAmount,
                ClusterKind::NewAccountBurst
            ]
        );
    }

    #[test]
    fn test_pattern_guards_zero_span() {
        let now = Utc::now();
        let rels = vec![rel("B", 0, 5_000_000.0, 0, now, now)];
        let pattern = pattern_of(&rels.iter().collect::<Vec<_>>());
        assert_eq!(pattern.time_span_days, 0.0);
        assert_eq!(pattern.avg_interval_hours, 0.0);
    }

    #[test]
    fn test_partner_resolved_from_either_side() {
        let mut r = old("B", 60, 2_000_000.0, 54);
        std::mem::swap(&mut r.user_id, &mut r.related_user_id);
        let clusters = SuspiciousClusterDetector::new().detect("T", &[r], Utc::now());
        assert_eq!(clusters[0].user_ids, vec!["T", "B"]);
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let output = SuspiciousClusterDetector::new()
            .execute(ClusterInput {
                target_user_id: "T".into(),
                relationships: vec![old("B", 60, 2_000_000.0, 54)],
                as_of: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(output.clusters.len(), 1);
    }
}
