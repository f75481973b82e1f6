//! Stage configuration model — the ordered building blocks of an experiment.
//!
//! Stage configs are plain data assembled by builder-style constructors,
//! mirroring how experiments are stored as per-stage documents.

pub mod chat;
pub mod ranking;
pub mod survey;

use serde::{Deserialize, Serialize};

use crate::types::generate_id;

/// Types of stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Info,
    Chat,
    Ranking,
    Survey,
}

/// Specific game associated with a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageGame {
    None,
    /// Lost at Sea
    Las,
    /// Reality TV Debate
    Rtv,
}

impl Default for StageGame {
    fn default() -> Self {
        StageGame::None
    }
}

/// Who gets to see revealed stage results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevealAudience {
    CurrentParticipant,
    AllParticipants,
}

/// Text blocks shown around a stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTextConfig {
    /// Shown at the top of the screen under the header.
    pub primary_text: String,
    /// For the info popup.
    pub info_text: String,
    /// For the help popup.
    pub help_text: String,
}

/// Gating and progress display for a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgressConfig {
    /// Min participants required for the stage.
    pub min_participants: usize,
    /// Wait for all participants to reach the stage before starting.
    pub wait_for_all_participants: bool,
    /// Show participants who completed the stage.
    pub show_participant_progress: bool,
}

impl Default for StageProgressConfig {
    fn default() -> Self {
        Self {
            min_participants: 0,
            wait_for_all_participants: false,
            show_participant_progress: true,
        }
    }
}

/// Fields shared by every stage config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStageConfig {
    pub id: String,
    #[serde(default)]
    pub game: StageGame,
    pub name: String,
    #[serde(default)]
    pub descriptions: StageTextConfig,
    #[serde(default)]
    pub progress: StageProgressConfig,
}

impl BaseStageConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            game: StageGame::None,
            name: name.into(),
            descriptions: StageTextConfig::default(),
            progress: StageProgressConfig::default(),
        }
    }
}

/// Info stage — static text lines shown to the participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoStageConfig {
    #[serde(flatten)]
    pub base: BaseStageConfig,
    pub info_lines: Vec<String>,
}

impl InfoStageConfig {
    pub fn new(name: impl Into<String>, info_lines: Vec<String>) -> Self {
        Self {
            base: BaseStageConfig::new(name),
            info_lines,
        }
    }
}

/// Any stage of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StageConfig {
    Info(InfoStageConfig),
    Chat(chat::ChatStageConfig),
    Ranking(ranking::RankingStageConfig),
    Survey(survey::SurveyStageConfig),
}

impl StageConfig {
    pub fn kind(&self) -> StageKind {
        match self {
            StageConfig::Info(_) => StageKind::Info,
            StageConfig::Chat(_) => StageKind::Chat,
            StageConfig::Ranking(_) => StageKind::Ranking,
            StageConfig::Survey(_) => StageKind::Survey,
        }
    }

    pub fn base(&self) -> &BaseStageConfig {
        match self {
            StageConfig::Info(stage) => &stage.base,
            StageConfig::Chat(stage) => &stage.base,
            StageConfig::Ranking(stage) => &stage.base,
            StageConfig::Survey(stage) => &stage.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_stage_defaults() {
        let base = BaseStageConfig::new("Welcome");
        assert_eq!(base.name, "Welcome");
        assert_eq!(base.game, StageGame::None);
        assert_eq!(base.progress.min_participants, 0);
        assert!(base.progress.show_participant_progress);
        assert!(!base.id.is_empty());
    }

    #[test]
    fn test_stage_config_accessors() {
        let stage = StageConfig::Info(InfoStageConfig::new("Intro", vec!["Welcome!".into()]));
        assert_eq!(stage.kind(), StageKind::Info);
        assert_eq!(stage.name(), "Intro");
    }

    #[test]
    fn test_stage_config_serializes_with_kind_tag() {
        let stage = StageConfig::Info(InfoStageConfig::new("Intro", vec![]));
        let value = serde_json::to_value(&stage).unwrap();
        assert_eq!(value["kind"], "info");
        assert_eq!(value["name"], "Intro");
    }
}
