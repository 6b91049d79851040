//! Data models for the item/recipe catalog and production plans

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// EVE type id
pub type ItemId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub group_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Manufacturing,
    Reaction,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Manufacturing => "manufacturing",
            ActivityKind::Reaction => "reaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manufacturing" => Some(ActivityKind::Manufacturing),
            "reaction" => Some(ActivityKind::Reaction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeMaterial {
    pub item_id: ItemId,
    pub quantity_per_run: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub product_id: ItemId,
    pub kind: ActivityKind,
    pub inputs: Vec<RecipeMaterial>,
    pub output_per_run: u32,
    pub base_duration_s: u32,
}

/// One line of a planning request, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub product: String,
    pub runs: u32,
    #[serde(default)]
    pub me: u8,
    #[serde(default)]
    pub te: u8,
}

impl JobRequest {
    pub fn new(product: impl Into<String>, runs: u32, me: u8, te: u8) -> Self {
        Self {
            product: product.into(),
            runs,
            me,
            te,
        }
    }
}

/// Records how a consolidated job was divided across slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitInfo {
    pub original_runs: u32,
    pub index: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMaterial {
    pub identifier: ItemId,
    pub quantity: u64,
}

/// A final, schedulable job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub identifier: ItemId,
    pub name: String,
    pub runs: u32,
    pub material_efficiency: u8,
    pub time_efficiency: u8,
    pub output_quantity: u64,
    pub duration_seconds: u64,
    /// Slot time the scheduler books for this job, never below `duration_seconds`
    pub reserved_seconds: u64,
    pub depth: u32,
    pub category: Category,
    pub is_end_product: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_info: Option<SplitInfo>,
    pub materials: Vec<ResolvedMaterial>,
}

/// A line of the purchase list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub identifier: ItemId,
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTiming {
    pub total_time_days: f64,
    pub slots_used: u32,
    pub job_count: usize,
}

/// A per-input problem surfaced to the caller without failing the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanError {
    pub input: String,
    pub error: String,
}

impl PlanError {
    pub fn new(input: impl Into<String>, error: impl ToString) -> Self {
        Self {
            input: input.into(),
            error: error.to_string(),
        }
    }
}

/// Result of a planning run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPlan {
    pub materials: Vec<PurchaseItem>,
    pub jobs: BTreeMap<Category, Vec<JobDescriptor>>,
    pub category_timings: BTreeMap<Category, CategoryTiming>,
    pub total_production_time_days: f64,
    pub total_jobs: usize,
    pub total_materials: usize,
    pub errors: Vec<PlanError>,
}

impl ProductionPlan {
    pub fn all_jobs(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.jobs.values().flatten()
    }

    pub fn material_quantity(&self, id: ItemId) -> Option<u64> {
        self.materials
            .iter()
            .find(|m| m.identifier == id)
            .map(|m| m.quantity)
    }
}
