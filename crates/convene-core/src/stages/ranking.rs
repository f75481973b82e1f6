//! Ranking stage configuration and Condorcet winner resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{BaseStageConfig, RevealAudience};
use crate::types::generate_id;

/// How (and whether) a winner is resolved from the rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStrategy {
    /// Not an election.
    None,
    /// Condorcet resolution.
    Condorcet,
}

/// What participants are ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rankingType", rename_all = "camelCase")]
pub enum RankingTarget {
    /// Rank a fixed list of items.
    Items { ranking_items: Vec<RankingItem> },
    /// Rank fellow participants (e.g. electing a leader).
    Participants { enable_self_voting: bool },
}

/// An item to rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingItem {
    pub id: String,
    /// Image reference, or empty if none.
    #[serde(default)]
    pub image_id: String,
    pub text: String,
}

impl RankingItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            image_id: String::new(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingStageConfig {
    #[serde(flatten)]
    pub base: BaseStageConfig,
    #[serde(flatten)]
    pub target: RankingTarget,
    pub strategy: ElectionStrategy,
    pub reveal_audience: RevealAudience,
}

impl RankingStageConfig {
    pub fn items(name: impl Into<String>, ranking_items: Vec<RankingItem>) -> Self {
        Self {
            base: BaseStageConfig::new(name),
            target: RankingTarget::Items { ranking_items },
            strategy: ElectionStrategy::Condorcet,
            reveal_audience: RevealAudience::AllParticipants,
        }
    }

    pub fn participants(name: impl Into<String>, enable_self_voting: bool) -> Self {
        Self {
            base: BaseStageConfig::new(name),
            target: RankingTarget::Participants { enable_self_voting },
            strategy: ElectionStrategy::Condorcet,
            reveal_audience: RevealAudience::AllParticipants,
        }
    }
}

/// One participant's ordered ranking (best first) of candidate ids —
/// item ids or participant public ids, depending on the ranking target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingAnswer {
    /// Stage id this answer belongs to.
    pub id: String,
    pub ranking_list: Vec<String>,
}

/// Map of participant public id to that participant's ranking list.
pub type ParticipantRankingMap = HashMap<String, Vec<String>>;

/// Resolve the Condorcet winner from all participants' rankings.
///
/// A candidate ranked above every other candidate in head-to-head majority
/// comparisons wins outright. When no strict Condorcet winner exists the
/// candidate with the most pairwise wins (Copeland score) is chosen,
/// breaking remaining ties by candidate id for determinism. Returns None
/// when there are no rankings at all.
pub fn condorcet_winner(rankings: &ParticipantRankingMap) -> Option<String> {
    let mut candidates: Vec<&str> = rankings
        .values()
        .flat_map(|list| list.iter().map(String::as_str))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    if candidates.is_empty() {
        return None;
    }

    // prefer_count[(a, b)] = number of voters ranking a above b.
    let mut prefer_count: HashMap<(&str, &str), usize> = HashMap::new();
    for list in rankings.values() {
        for (i, above) in list.iter().enumerate() {
            for below in &list[i + 1..] {
                *prefer_count
                    .entry((above.as_str(), below.as_str()))
                    .or_default() += 1;
            }
        }
    }

    let beats = |a: &str, b: &str| {
        let a_over_b = prefer_count.get(&(a, b)).copied().unwrap_or(0);
        let b_over_a = prefer_count.get(&(b, a)).copied().unwrap_or(0);
        a_over_b > b_over_a
    };

    // Strict Condorcet winner, if one exists.
    if let Some(winner) = candidates
        .iter()
        .find(|&&a| candidates.iter().all(|&b| a == b || beats(a, b)))
    {
        return Some((*winner).to_string());
    }

    // Copeland fallback. max_by_key keeps the last maximum, so iterating
    // the sorted candidate list in reverse leaves the smallest id on ties.
    candidates
        .iter()
        .rev()
        .max_by_key(|&&a| candidates.iter().filter(|&&b| a != b && beats(a, b)).count())
        .map(|winner| (*winner).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rankings(entries: &[(&str, &[&str])]) -> ParticipantRankingMap {
        entries
            .iter()
            .map(|(participant, list)| {
                (
                    participant.to_string(),
                    list.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_item_ranking_builder() {
        let stage = RankingStageConfig::items(
            "Rank supplies",
            vec![RankingItem::new("compass"), RankingItem::new("mirror")],
        );
        assert_eq!(stage.strategy, ElectionStrategy::Condorcet);
        match &stage.target {
            RankingTarget::Items { ranking_items } => assert_eq!(ranking_items.len(), 2),
            _ => panic!("expected item ranking"),
        }
    }

    #[test]
    fn test_condorcet_unanimous() {
        let map = rankings(&[
            ("p1", &["a", "b", "c"]),
            ("p2", &["a", "c", "b"]),
            ("p3", &["a", "b", "c"]),
        ]);
        assert_eq!(condorcet_winner(&map).as_deref(), Some("a"));
    }

    #[test]
    fn test_condorcet_majority_beats_plurality() {
        // "b" is everyone's second choice and beats both "a" and "c"
        // head-to-head, despite never being ranked first by a majority.
        let map = rankings(&[
            ("p1", &["a", "b", "c"]),
            ("p2", &["c", "b", "a"]),
            ("p3", &["b", "a", "c"]),
        ]);
        assert_eq!(condorcet_winner(&map).as_deref(), Some("b"));
    }

    #[test]
    fn test_condorcet_cycle_falls_back_to_copeland() {
        // Classic rock-paper-scissors cycle: a > b, b > c, c > a.
        // Every candidate has one pairwise win; the smallest id breaks the tie.
        let map = rankings(&[
            ("p1", &["a", "b", "c"]),
            ("p2", &["b", "c", "a"]),
            ("p3", &["c", "a", "b"]),
        ]);
        assert_eq!(condorcet_winner(&map).as_deref(), Some("a"));
    }

    #[test]
    fn test_condorcet_empty() {
        assert_eq!(condorcet_winner(&ParticipantRankingMap::new()), None);
    }

    #[test]
    fn test_condorcet_single_voter() {
        let map = rankings(&[("p1", &["x", "y"])]);
        assert_eq!(condorcet_winner(&map).as_deref(), Some("x"));
    }
}
