//! In-memory item and recipe catalog
//!
//! Built once (from SQLite or by hand in tests) and shared read-only between
//! planning calls.

use std::collections::{BTreeMap, HashMap};

use crate::category::Category;
use crate::models::{Item, ItemId, Recipe};

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
    recipes: HashMap<ItemId, Recipe>,
    by_lower_name: HashMap<String, ItemId>,
}

impl Catalog {
    /// Build a catalog. A later recipe for an already known product is ignored.
    pub fn new(items: Vec<Item>, recipes: Vec<Recipe>) -> Self {
        let mut catalog = Catalog::default();
        for item in items {
            catalog.insert_item(item);
        }
        for mut recipe in recipes {
            recipe.inputs.sort_by_key(|m| m.item_id);
            catalog.recipes.entry(recipe.product_id).or_insert(recipe);
        }
        catalog
    }

    fn insert_item(&mut self, item: Item) {
        // lowest id wins on duplicate names
        let key = item.name.to_lowercase();
        match self.by_lower_name.get(&key) {
            Some(existing) if *existing < item.id => {}
            _ => {
                self.by_lower_name.insert(key, item.id);
            }
        }
        self.items.insert(item.id, item);
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn recipe(&self, id: ItemId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// Items in ascending identifier order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Display name, falling back to the bare id for unknown items
    pub fn name(&self, id: ItemId) -> String {
        self.items
            .get(&id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }

    pub fn find_exact(&self, name: &str) -> Option<ItemId> {
        self.by_lower_name.get(&name.trim().to_lowercase()).copied()
    }

    /// Production category from the item's group; unknown items are `Others`.
    pub fn category_of(&self, id: ItemId) -> Category {
        self.items
            .get(&id)
            .map(|i| Category::from_group(i.group_id))
            .unwrap_or(Category::Others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, RecipeMaterial};

    fn item(id: ItemId, name: &str, group_id: u32) -> Item {
        Item {
            id,
            name: name.to_string(),
            group_id,
        }
    }

    #[test]
    fn exact_lookup_is_case_insensitive() {
        let catalog = Catalog::new(vec![item(34, "Tritanium", 18)], vec![]);
        assert_eq!(catalog.find_exact("tritanium"), Some(34));
        assert_eq!(catalog.find_exact("TRITANIUM "), Some(34));
        assert_eq!(catalog.find_exact("Pyerite"), None);
    }

    #[test]
    fn first_recipe_per_product_wins() {
        let a = Recipe {
            product_id: 1,
            kind: ActivityKind::Manufacturing,
            inputs: vec![RecipeMaterial {
                item_id: 34,
                quantity_per_run: 10,
            }],
            output_per_run: 1,
            base_duration_s: 60,
        };
        let mut b = a.clone();
        b.output_per_run = 5;
        let catalog = Catalog::new(vec![], vec![a, b]);
        assert_eq!(catalog.recipe(1).map(|r| r.output_per_run), Some(1));
    }

    #[test]
    fn unknown_item_name_falls_back_to_id() {
        let catalog = Catalog::default();
        assert_eq!(catalog.name(42), "#42");
        assert_eq!(catalog.category_of(42), Category::Others);
    }
}
