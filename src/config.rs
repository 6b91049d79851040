//! Planning request and capacity configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::category::{Category, SlotPool};
use crate::models::JobRequest;

/// Categories excluded from expansion, plus free-text item names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blacklist {
    pub intermediate_composite_reactions: bool,
    pub fuel_blocks: bool,
    pub composite_reactions: bool,
    pub biochemical_reactions: bool,
    pub hybrid_reactions: bool,
    pub construction_components: bool,
    pub advanced_components: bool,
    pub capital_components: bool,
    pub others: bool,
    /// Newline-delimited display names
    #[serde(rename = "customItems")]
    pub custom_items: String,
}

impl Blacklist {
    pub fn is_flagged(&self, category: Category) -> bool {
        match category {
            Category::IntermediateCompositeReactions => self.intermediate_composite_reactions,
            Category::FuelBlocks => self.fuel_blocks,
            Category::CompositeReactions => self.composite_reactions,
            Category::BiochemicalReactions => self.biochemical_reactions,
            Category::HybridReactions => self.hybrid_reactions,
            Category::ConstructionComponents => self.construction_components,
            Category::AdvancedComponents => self.advanced_components,
            Category::CapitalComponents => self.capital_components,
            Category::Others => self.others,
            Category::EndProductJobs => false,
        }
    }

    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom_items
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanConfig {
    pub reaction_slots: u32,
    pub manufacturing_slots: u32,
    /// Days; split pieces never go below this duration
    pub dont_split_shorter_than: f64,
    pub blacklist: Blacklist,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            reaction_slots: 10,
            manufacturing_slots: 10,
            dont_split_shorter_than: 1.0,
            blacklist: Blacklist::default(),
        }
    }
}

impl PlanConfig {
    /// Configured slots for a pool, never less than one
    pub fn slots(&self, pool: SlotPool) -> u32 {
        let configured = match pool {
            SlotPool::Reaction => self.reaction_slots,
            SlotPool::Manufacturing => self.manufacturing_slots,
        };
        configured.max(1)
    }

    pub fn min_split_seconds(&self) -> f64 {
        self.dont_split_shorter_than * 86_400.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub jobs: Vec<JobRequest>,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub config: PlanConfig,
}

impl PlanRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse planning request")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("In {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = PlanRequest::from_json(r#"{"jobs": [{"product": "Avatar", "runs": 1}]}"#).unwrap();
        assert_eq!(req.jobs[0].me, 0);
        assert_eq!(req.jobs[0].te, 0);
        assert!(req.stock.is_empty());
        assert_eq!(req.config, PlanConfig::default());
    }

    #[test]
    fn config_camel_case_and_blacklist_flags() {
        let req = PlanRequest::from_json(
            r#"{
                "jobs": [],
                "config": {
                    "reactionSlots": 0,
                    "manufacturingSlots": 4,
                    "dontSplitShorterThan": 2.5,
                    "blacklist": {"fuel_blocks": true, "customItems": "Tritanium\n  Morphite \n"}
                }
            }"#,
        )
        .unwrap();
        let config = req.config;
        assert_eq!(config.slots(SlotPool::Reaction), 1);
        assert_eq!(config.slots(SlotPool::Manufacturing), 4);
        assert_eq!(config.min_split_seconds(), 2.5 * 86_400.0);
        assert!(config.blacklist.is_flagged(Category::FuelBlocks));
        assert!(!config.blacklist.is_flagged(Category::CompositeReactions));
        assert!(!config.blacklist.is_flagged(Category::EndProductJobs));
        let names: Vec<_> = config.blacklist.custom_names().collect();
        assert_eq!(names, vec!["Tritanium", "Morphite"]);
    }
}
