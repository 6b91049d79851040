//! Consolidation of component demands and splitting across slots

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::Catalog;
use crate::category::Category;
use crate::config::PlanConfig;
use crate::expander::{Demand, DemandForest};
use crate::materials::job_duration;
use crate::models::{ItemId, JobDescriptor, Recipe, SplitInfo};

/// Merge component demands sharing `(identifier, ME, TE)`.
///
/// Runs are summed and the deepest occurrence is kept. End products are
/// never merged and are not returned here.
pub fn consolidate(forest: &DemandForest) -> Vec<Demand> {
    let mut groups: BTreeMap<(ItemId, u8, u8), Demand> = BTreeMap::new();
    for demand in forest.components() {
        let key = (
            demand.identifier,
            demand.material_efficiency,
            demand.time_efficiency,
        );
        groups
            .entry(key)
            .and_modify(|combined| {
                combined.runs = combined.runs.saturating_add(demand.runs);
                combined.depth = combined.depth.max(demand.depth);
                combined.parent = None;
            })
            .or_insert(Demand {
                parent: None,
                ..*demand
            });
    }

    let mut combined: Vec<Demand> = groups.into_values().collect();
    combined.sort_by(|a, b| b.depth.cmp(&a.depth).then(a.identifier.cmp(&b.identifier)));
    combined
}

/// Number of pieces a job of `runs` should be split into.
///
/// The largest `k` up to `slots` whose smallest piece still lasts at least
/// `min_seconds`; 1 when the whole job is already shorter than that.
pub fn piece_count(recipe: &Recipe, te: u8, runs: u32, slots: u32, min_seconds: f64) -> u32 {
    let max_pieces = slots.min(runs);
    if max_pieces < 2 || (job_duration(recipe, te, runs) as f64) < min_seconds {
        return 1;
    }
    (2..=max_pieces)
        .rev()
        .find(|&k| job_duration(recipe, te, runs / k) as f64 >= min_seconds)
        .unwrap_or(1)
}

/// Fewest runs lasting at least `min_seconds`, searched within `1..=runs`
fn floor_runs(recipe: &Recipe, te: u8, runs: u32, min_seconds: f64) -> u32 {
    let (mut lo, mut hi) = (1, runs.max(1));
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if job_duration(recipe, te, mid) as f64 >= min_seconds {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Runs of slot time booked for the longest piece of a job of `runs`.
///
/// Splitting only starts once two pieces each reach the floor, so a job just
/// below that point runs unsplit for up to `2 * floor_runs - 1` runs, longer
/// than the pieces just above it. The booking is the largest piece of any
/// job up to `runs`, which never decreases as `runs` grows and never
/// increases with more slots.
pub fn reserved_piece_runs(
    recipe: &Recipe,
    te: u8,
    runs: u32,
    slots: u32,
    min_seconds: f64,
) -> u32 {
    if slots < 2 || runs < 2 || (job_duration(recipe, te, runs) as f64) < min_seconds {
        return runs;
    }
    let longest_unsplit = floor_runs(recipe, te, runs, min_seconds)
        .saturating_mul(2)
        .saturating_sub(1);
    runs.min(longest_unsplit).max(runs.div_ceil(slots))
}

/// Spread runs as evenly as possible, remainder to the first pieces.
pub fn split_runs(runs: u32, pieces: u32) -> Vec<u32> {
    let pieces = pieces.max(1);
    let base = runs / pieces;
    let remainder = runs % pieces;
    (0..pieces)
        .map(|i| base + u32::from(i < remainder))
        .collect()
}

fn descriptor(
    catalog: &Catalog,
    demand: &Demand,
    runs: u32,
    category: Category,
    split_info: Option<SplitInfo>,
) -> JobDescriptor {
    JobDescriptor {
        identifier: demand.identifier,
        name: catalog.name(demand.identifier),
        runs,
        material_efficiency: demand.material_efficiency,
        time_efficiency: demand.time_efficiency,
        output_quantity: 0,
        duration_seconds: 0,
        depth: demand.depth,
        category,
        is_end_product: demand.is_end_product,
        split_info,
        reserved_seconds: 0,
        materials: Vec::new(),
    }
}

/// Turn a demand forest into final jobs (materials still unset).
///
/// End products come first in the caller's request order, followed by the
/// consolidated components, deepest first.
pub fn consolidate_and_split(
    catalog: &Catalog,
    forest: &DemandForest,
    config: &PlanConfig,
) -> Vec<JobDescriptor> {
    let mut end_products: Vec<&Demand> = forest.end_products().collect();
    end_products.sort_by_key(|d| d.request_index);

    let mut jobs: Vec<JobDescriptor> = end_products
        .into_iter()
        .map(|d| descriptor(catalog, d, d.runs, Category::EndProductJobs, None))
        .collect();

    let min_seconds = config.min_split_seconds();
    for demand in consolidate(forest) {
        let Some(recipe) = catalog.recipe(demand.identifier) else {
            continue;
        };
        let category = catalog.category_of(demand.identifier);
        let slots = config.slots(category.pool());
        let count = piece_count(recipe, demand.time_efficiency, demand.runs, slots, min_seconds);

        if count == 1 {
            jobs.push(descriptor(catalog, &demand, demand.runs, category, None));
            continue;
        }

        let reserved = reserved_piece_runs(
            recipe,
            demand.time_efficiency,
            demand.runs,
            slots,
            min_seconds,
        );
        debug!(
            item = demand.identifier,
            runs = demand.runs,
            pieces = count,
            reserved,
            "Splitting job"
        );
        for (index, runs) in split_runs(demand.runs, count).into_iter().enumerate() {
            let info = SplitInfo {
                original_runs: demand.runs,
                index: index as u32,
                count,
            };
            let mut job = descriptor(catalog, &demand, runs, category, Some(info));
            // the first piece is the longest one
            if index == 0 {
                job.reserved_seconds = job_duration(recipe, demand.time_efficiency, reserved);
            }
            jobs.push(job);
        }
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::{COMPONENT_ME, COMPONENT_TE};
    use crate::models::{ActivityKind, Item, RecipeMaterial};

    fn recipe(base_duration_s: u32) -> Recipe {
        Recipe {
            product_id: 2,
            kind: ActivityKind::Manufacturing,
            inputs: vec![RecipeMaterial {
                item_id: 34,
                quantity_per_run: 10,
            }],
            output_per_run: 1,
            base_duration_s,
        }
    }

    fn component(identifier: ItemId, runs: u32, depth: u32) -> Demand {
        Demand {
            identifier,
            runs,
            material_efficiency: COMPONENT_ME,
            time_efficiency: COMPONENT_TE,
            depth,
            is_end_product: false,
            parent: Some(0),
            request_index: None,
        }
    }

    fn end_product(identifier: ItemId, runs: u32, request_index: usize) -> Demand {
        Demand {
            identifier,
            runs,
            material_efficiency: 10,
            time_efficiency: 20,
            depth: 0,
            is_end_product: true,
            parent: None,
            request_index: Some(request_index),
        }
    }

    #[test]
    fn even_split_puts_remainder_first() {
        assert_eq!(split_runs(10, 3), vec![4, 3, 3]);
        assert_eq!(split_runs(9, 3), vec![3, 3, 3]);
        assert_eq!(split_runs(5, 1), vec![5]);
    }

    #[test]
    fn piece_count_respects_floor() {
        // one day per run at TE 0
        let r = recipe(86_400);
        assert_eq!(piece_count(&r, 0, 10, 4, 86_400.0), 4);
        // 10 runs / 4 = 2 runs per smallest piece, below 3 days
        assert_eq!(piece_count(&r, 0, 10, 4, 3.0 * 86_400.0), 3);
        assert_eq!(piece_count(&r, 0, 10, 1, 86_400.0), 1);
        assert_eq!(piece_count(&r, 0, 1, 10, 0.0), 1);
        // whole job shorter than the floor
        assert_eq!(piece_count(&r, 0, 2, 10, 5.0 * 86_400.0), 1);
        // never more pieces than runs
        assert_eq!(piece_count(&r, 0, 3, 10, 0.0), 3);
    }

    #[test]
    fn reserved_piece_never_shrinks_as_runs_grow() {
        // 0.6 days per run against a one day floor: pieces need two runs
        let r = recipe(64_800);
        let day = 86_400.0;
        let mut previous = 0;
        for runs in 1..=200 {
            let reserved = reserved_piece_runs(&r, COMPONENT_TE, runs, 10, day);
            let count = piece_count(&r, COMPONENT_TE, runs, 10, day);
            assert!(reserved >= previous, "{runs} runs reserved {reserved} < {previous}");
            assert!(reserved >= runs.div_ceil(count));
            assert!(reserved <= runs);
            previous = reserved;
        }
        // three runs stay whole; four split into two pieces of two
        assert_eq!(piece_count(&r, COMPONENT_TE, 4, 10, day), 2);
        assert_eq!(reserved_piece_runs(&r, COMPONENT_TE, 4, 10, day), 3);
        assert_eq!(reserved_piece_runs(&r, COMPONENT_TE, 200, 10, day), 20);
    }

    #[test]
    fn reserved_piece_never_grows_with_slots() {
        let r = recipe(64_800);
        let mut previous = u32::MAX;
        for slots in 0..=12 {
            let reserved = reserved_piece_runs(&r, COMPONENT_TE, 40, slots, 86_400.0);
            assert!(reserved <= previous);
            previous = reserved;
        }
        assert_eq!(previous, 4);
    }

    #[test]
    fn consolidation_sums_branches() {
        let forest = DemandForest {
            demands: vec![
                end_product(1, 1, 0),
                component(2, 4, 1),
                component(3, 2, 2),
                component(2, 5, 3),
            ],
            ..DemandForest::default()
        };
        let combined = consolidate(&forest);
        assert_eq!(combined.len(), 2);
        assert_eq!((combined[0].identifier, combined[0].runs, combined[0].depth), (2, 9, 3));
        assert_eq!((combined[1].identifier, combined[1].runs, combined[1].depth), (3, 2, 2));
    }

    #[test]
    fn duplicate_end_products_stay_separate_and_unsplit() {
        let catalog = Catalog::new(
            vec![Item { id: 1, name: "Avatar".into(), group_id: 30 }],
            vec![Recipe {
                product_id: 1,
                ..recipe(10 * 86_400)
            }],
        );
        let forest = DemandForest {
            demands: vec![end_product(1, 1, 1), end_product(1, 1, 0)],
            ..DemandForest::default()
        };
        let config = PlanConfig {
            dont_split_shorter_than: 0.0,
            ..PlanConfig::default()
        };
        let jobs = consolidate_and_split(&catalog, &forest, &config);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.runs == 1 && j.split_info.is_none()));
        assert!(jobs.iter().all(|j| j.category == Category::EndProductJobs));
    }

    #[test]
    fn split_pieces_conserve_runs() {
        let catalog = Catalog::new(
            vec![Item { id: 2, name: "Part".into(), group_id: 334 }],
            vec![recipe(86_400)],
        );
        let forest = DemandForest {
            demands: vec![component(2, 7, 1), component(2, 4, 2)],
            ..DemandForest::default()
        };
        let config = PlanConfig {
            manufacturing_slots: 3,
            dont_split_shorter_than: 1.0,
            ..PlanConfig::default()
        };
        let jobs = consolidate_and_split(&catalog, &forest, &config);
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs.iter().map(|j| j.runs).sum::<u32>(), 11);
        for (i, job) in jobs.iter().enumerate() {
            let info = job.split_info.unwrap();
            assert_eq!(info.original_runs, 11);
            assert_eq!(info.count, 3);
            assert_eq!(info.index, i as u32);
            assert_eq!(job.category, Category::AdvancedComponents);
        }
        // 11 runs across 3 slots: the first piece books 4 runs at TE 20
        assert_eq!(jobs[0].reserved_seconds, 4 * 69_120);
        assert!(jobs[1..].iter().all(|j| j.reserved_seconds == 0));
    }
}
