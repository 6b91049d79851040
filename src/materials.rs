//! Blueprint material and time formulas, and purchase list aggregation
//!
//! All rounding happens here, once per final job. Reactions ignore material
//! and time efficiency entirely.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::demand::StockMap;
use crate::models::{
    ActivityKind, ItemId, JobDescriptor, PurchaseItem, Recipe, ResolvedMaterial,
};

fn reduced_ceil(base: u64, percent_off: u8, runs: u32) -> u64 {
    let factor = 100 - u128::from(percent_off.min(100));
    let hundredths = u128::from(base) * factor * u128::from(runs);
    u64::try_from(hundredths.div_ceil(100)).unwrap_or(u64::MAX)
}

/// `ceil(base * (1 - me/100) * runs)`, ME ignored for reactions
pub fn material_quantity(kind: ActivityKind, base_per_run: u32, me: u8, runs: u32) -> u64 {
    let me = match kind {
        ActivityKind::Manufacturing => me,
        ActivityKind::Reaction => 0,
    };
    reduced_ceil(u64::from(base_per_run), me, runs)
}

/// `ceil(base_duration * (1 - te/100) * runs)` in seconds, TE ignored for reactions
pub fn job_duration(recipe: &Recipe, te: u8, runs: u32) -> u64 {
    let te = match recipe.kind {
        ActivityKind::Manufacturing => te,
        ActivityKind::Reaction => 0,
    };
    reduced_ceil(u64::from(recipe.base_duration_s), te, runs)
}

pub fn compute_materials(recipe: &Recipe, me: u8, runs: u32) -> Vec<ResolvedMaterial> {
    recipe
        .inputs
        .iter()
        .map(|input| ResolvedMaterial {
            identifier: input.item_id,
            quantity: material_quantity(recipe.kind, input.quantity_per_run, me, runs),
        })
        .collect()
}

/// Fill in materials, duration and output quantity of a final job.
pub fn materialize(recipe: &Recipe, job: &mut JobDescriptor) {
    job.materials = compute_materials(recipe, job.material_efficiency, job.runs);
    job.duration_seconds = job_duration(recipe, job.time_efficiency, job.runs);
    job.reserved_seconds = job.reserved_seconds.max(job.duration_seconds);
    job.output_quantity = u64::from(recipe.output_per_run) * u64::from(job.runs);
}

/// Aggregate bought materials into a purchase list.
///
/// `is_bought(material)` picks the job inputs that are never built (no
/// recipe or blacklisted). `depth_capped` holds buildable inputs the
/// expansion bought because they sat below the depth cap; a consolidated
/// job can mix capped and built branches, so those come from the expansion
/// rather than from job materials. Stock left over after expansion is
/// deducted here.
pub fn purchase_list<F>(
    catalog: &Catalog,
    jobs: &[JobDescriptor],
    depth_capped: &BTreeMap<ItemId, u64>,
    remaining_stock: &StockMap,
    is_bought: F,
) -> Vec<PurchaseItem>
where
    F: Fn(ItemId) -> bool,
{
    let mut totals: BTreeMap<ItemId, u64> = depth_capped.clone();
    for job in jobs {
        for material in &job.materials {
            if is_bought(material.identifier) {
                let total = totals.entry(material.identifier).or_default();
                *total = total.saturating_add(material.quantity);
            }
        }
    }

    totals
        .into_iter()
        .filter_map(|(id, quantity)| {
            let on_hand = remaining_stock.get(&id).copied().unwrap_or(0);
            let quantity = quantity.saturating_sub(on_hand);
            (quantity > 0).then(|| PurchaseItem {
                identifier: id,
                name: catalog.name(id),
                quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeMaterial;

    fn recipe(kind: ActivityKind) -> Recipe {
        Recipe {
            product_id: 1,
            kind,
            inputs: vec![RecipeMaterial {
                item_id: 2,
                quantity_per_run: 1000,
            }],
            output_per_run: 1,
            base_duration_s: 3600,
        }
    }

    #[test]
    fn manufacturing_material_efficiency() {
        let r = recipe(ActivityKind::Manufacturing);
        assert_eq!(compute_materials(&r, 0, 1)[0].quantity, 1000);
        assert_eq!(compute_materials(&r, 10, 1)[0].quantity, 900);
        assert_eq!(compute_materials(&r, 10, 3)[0].quantity, 2700);
    }

    #[test]
    fn rounding_is_ceiling() {
        // 7 * 0.9 * 1 = 6.3
        assert_eq!(material_quantity(ActivityKind::Manufacturing, 7, 10, 1), 7);
        // 7 * 0.9 * 10 = 63
        assert_eq!(material_quantity(ActivityKind::Manufacturing, 7, 10, 10), 63);
        assert_eq!(material_quantity(ActivityKind::Manufacturing, 1, 10, 1), 1);
    }

    #[test]
    fn manufacturing_time_efficiency() {
        let r = recipe(ActivityKind::Manufacturing);
        assert_eq!(job_duration(&r, 0, 1), 3600);
        assert_eq!(job_duration(&r, 20, 1), 2880);
        assert_eq!(job_duration(&r, 20, 5), 14400);
    }

    #[test]
    fn reactions_ignore_efficiency() {
        let r = recipe(ActivityKind::Reaction);
        assert_eq!(compute_materials(&r, 10, 1), compute_materials(&r, 0, 1));
        assert_eq!(job_duration(&r, 20, 2), 7200);
    }

    #[test]
    fn extreme_quantities_saturate_instead_of_overflowing() {
        let max = u64::from(u32::MAX);
        assert_eq!(
            material_quantity(ActivityKind::Manufacturing, u32::MAX, 0, u32::MAX),
            max * max
        );
        let researched = material_quantity(ActivityKind::Manufacturing, u32::MAX, 10, u32::MAX);
        assert!(researched < max * max);
        assert!(researched > max * max / 10 * 8);
    }

    #[test]
    fn purchase_list_adds_depth_capped_inputs() {
        use crate::category::Category;
        use crate::models::Item;

        let catalog = Catalog::new(
            vec![
                Item { id: 1, name: "Part".into(), group_id: 334 },
                Item { id: 2, name: "Ore".into(), group_id: 18 },
            ],
            vec![Recipe {
                product_id: 1,
                ..recipe(ActivityKind::Manufacturing)
            }],
        );
        let job = JobDescriptor {
            identifier: 1,
            name: "Part".into(),
            runs: 2,
            material_efficiency: 10,
            time_efficiency: 20,
            output_quantity: 2,
            duration_seconds: 0,
            reserved_seconds: 0,
            depth: 20,
            category: Category::AdvancedComponents,
            is_end_product: false,
            split_info: None,
            materials: vec![
                ResolvedMaterial { identifier: 1, quantity: 2 },
                ResolvedMaterial { identifier: 2, quantity: 5 },
            ],
        };
        let capped = BTreeMap::from([(1, 1)]);
        let stock = StockMap::from([(2, 3)]);

        let list = purchase_list(&catalog, &[job], &capped, &stock, |id| id == 2);
        let quantities: Vec<(ItemId, u64)> =
            list.iter().map(|p| (p.identifier, p.quantity)).collect();
        // the buildable input only counts what the expansion capped
        assert_eq!(quantities, vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn split_rounding_excess_is_bounded() {
        // 3 pieces of 1 run vs one job of 3 runs
        let whole = material_quantity(ActivityKind::Manufacturing, 7, 10, 3);
        let pieces = 3 * material_quantity(ActivityKind::Manufacturing, 7, 10, 1);
        assert!(pieces >= whole);
        assert!(pieces - whole <= 2);
    }
}
