//! Production categories and the slot pools they draw from

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    IntermediateCompositeReactions,
    FuelBlocks,
    CompositeReactions,
    BiochemicalReactions,
    HybridReactions,
    ConstructionComponents,
    AdvancedComponents,
    CapitalComponents,
    Others,
    EndProductJobs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotPool {
    Reaction,
    Manufacturing,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::IntermediateCompositeReactions,
        Category::FuelBlocks,
        Category::CompositeReactions,
        Category::BiochemicalReactions,
        Category::HybridReactions,
        Category::ConstructionComponents,
        Category::AdvancedComponents,
        Category::CapitalComponents,
        Category::Others,
        Category::EndProductJobs,
    ];

    /// Classify an item by its inventory group.
    pub fn from_group(group_id: u32) -> Self {
        match group_id {
            // Intermediate Materials
            428 => Category::IntermediateCompositeReactions,
            // Fuel Block
            1136 => Category::FuelBlocks,
            // Composite, Molecular-Forged Materials
            429 | 4096 => Category::CompositeReactions,
            // Biochemical Material
            712 => Category::BiochemicalReactions,
            // Hybrid Polymers
            974 => Category::HybridReactions,
            // Structure Components
            536 => Category::ConstructionComponents,
            // Construction Components (T2), Hybrid Tech Components
            334 | 964 => Category::AdvancedComponents,
            // Capital / Advanced Capital Construction Components
            873 | 913 => Category::CapitalComponents,
            _ => Category::Others,
        }
    }

    pub fn pool(&self) -> SlotPool {
        match self {
            Category::IntermediateCompositeReactions
            | Category::CompositeReactions
            | Category::BiochemicalReactions
            | Category::HybridReactions => SlotPool::Reaction,
            _ => SlotPool::Manufacturing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IntermediateCompositeReactions => "intermediate_composite_reactions",
            Category::FuelBlocks => "fuel_blocks",
            Category::CompositeReactions => "composite_reactions",
            Category::BiochemicalReactions => "biochemical_reactions",
            Category::HybridReactions => "hybrid_reactions",
            Category::ConstructionComponents => "construction_components",
            Category::AdvancedComponents => "advanced_components",
            Category::CapitalComponents => "capital_components",
            Category::Others => "others",
            Category::EndProductJobs => "end_product_jobs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_pool_categories() {
        let reaction: Vec<_> = Category::ALL
            .iter()
            .filter(|c| c.pool() == SlotPool::Reaction)
            .collect();
        assert_eq!(
            reaction,
            vec![
                &Category::IntermediateCompositeReactions,
                &Category::CompositeReactions,
                &Category::BiochemicalReactions,
                &Category::HybridReactions,
            ]
        );
        assert_eq!(Category::FuelBlocks.pool(), SlotPool::Manufacturing);
        assert_eq!(Category::EndProductJobs.pool(), SlotPool::Manufacturing);
    }

    #[test]
    fn unknown_group_is_others() {
        assert_eq!(Category::from_group(0), Category::Others);
        assert_eq!(Category::from_group(1136), Category::FuelBlocks);
        assert_eq!(Category::from_group(873), Category::CapitalComponents);
    }

    #[test]
    fn serializes_as_snake_case() {
        for c in Category::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
    }
}
