//! Experiment metadata and cohort configuration.

use serde::{Deserialize, Serialize};

use crate::stages::StageConfig;
use crate::types::generate_id;

/// Participant limits for cohorts of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortParticipantConfig {
    pub min_participants_per_cohort: usize,
    pub max_participants_per_cohort: Option<usize>,
    /// Close the cohort to new joiners once a chat stage has started.
    #[serde(default)]
    pub include_all_participants_in_cohort_count: bool,
}

impl Default for CohortParticipantConfig {
    fn default() -> Self {
        Self {
            min_participants_per_cohort: 0,
            max_participants_per_cohort: None,
            include_all_participants_in_cohort_count: false,
        }
    }
}

/// An experiment: named, versioned metadata plus an ordered list of stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub cohort_config: CohortParticipantConfig,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: String::new(),
            stages: Vec::new(),
            cohort_config: CohortParticipantConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stage(mut self, stage: StageConfig) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    pub fn stage(&self, stage_id: &str) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.id() == stage_id)
    }

    /// Id of the stage after `stage_id`, if any.
    pub fn next_stage_id(&self, stage_id: &str) -> Option<&str> {
        let index = self.stages.iter().position(|s| s.id() == stage_id)?;
        self.stages.get(index + 1).map(|s| s.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{InfoStageConfig, StageKind};

    fn experiment() -> Experiment {
        Experiment::new("Lost at Sea")
            .with_description("Classic ranking study")
            .with_stage(StageConfig::Info(InfoStageConfig::new(
                "Welcome",
                vec!["Thanks for joining!".into()],
            )))
            .with_stage(StageConfig::Info(InfoStageConfig::new("Rules", vec![])))
    }

    #[test]
    fn test_experiment_builder() {
        let exp = experiment();
        assert_eq!(exp.name, "Lost at Sea");
        assert_eq!(exp.stages.len(), 2);
        assert_eq!(exp.stages[0].kind(), StageKind::Info);
    }

    #[test]
    fn test_stage_lookup_and_ordering() {
        let exp = experiment();
        let ids = exp.stage_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(exp.stage(ids[0]).unwrap().name(), "Welcome");
        assert_eq!(exp.next_stage_id(ids[0]), Some(ids[1]));
        assert_eq!(exp.next_stage_id(ids[1]), None);
        assert_eq!(exp.next_stage_id("missing"), None);
    }
}
