//! Bill-of-materials expansion
//!
//! Requested end products are expanded into a forest of demands kept in an
//! arena and processed through a worklist. Nothing is rounded for the final
//! plan here; expansion only decides which sub-jobs exist and how many runs
//! each branch asks for.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::Blacklist;
use crate::demand::{BlacklistFilter, StockMap};
use crate::materials::material_quantity;
use crate::models::ItemId;

/// Deepest level that may still become a job; anything below is bought.
pub const MAX_DEPTH: u32 = 20;

/// Research levels assumed for every intermediate blueprint
pub const COMPONENT_ME: u8 = 10;
pub const COMPONENT_TE: u8 = 20;

/// A validated end-product request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndProduct {
    pub identifier: ItemId,
    pub runs: u32,
    pub material_efficiency: u8,
    pub time_efficiency: u8,
    /// Position in the caller's job list
    pub request_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demand {
    pub identifier: ItemId,
    pub runs: u32,
    pub material_efficiency: u8,
    pub time_efficiency: u8,
    pub depth: u32,
    pub is_end_product: bool,
    /// Arena index of the demand that asked for this one
    pub parent: Option<usize>,
    pub request_index: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DemandForest {
    pub demands: Vec<Demand>,
    /// Buildable inputs bought only because they sit below `MAX_DEPTH`
    pub depth_capped: BTreeMap<ItemId, u64>,
    /// Stock not consumed by intermediate demands
    pub remaining_stock: StockMap,
}

impl DemandForest {
    fn push(&mut self, demand: Demand) -> usize {
        self.demands.push(demand);
        self.demands.len() - 1
    }

    pub fn end_products(&self) -> impl Iterator<Item = &Demand> {
        self.demands.iter().filter(|d| d.is_end_product)
    }

    pub fn components(&self) -> impl Iterator<Item = &Demand> {
        self.demands.iter().filter(|d| !d.is_end_product)
    }
}

pub struct Expander<'a> {
    catalog: &'a Catalog,
    blacklist: BlacklistFilter<'a>,
}

impl<'a> Expander<'a> {
    pub fn new(catalog: &'a Catalog, blacklist: &'a Blacklist) -> Self {
        Self {
            catalog,
            blacklist: BlacklistFilter::new(blacklist),
        }
    }

    /// Whether an item is bought wherever it appears
    pub fn is_bought(&self, id: ItemId) -> bool {
        self.catalog.recipe(id).is_none() || self.blacklist.contains(self.catalog, id)
    }

    /// Expand end products into demands, consuming `stock` along the way.
    ///
    /// Requests are visited in a canonical order so the caller's ordering
    /// never changes which branch gets the stock.
    pub fn expand(&self, requests: &[EndProduct], mut stock: StockMap) -> DemandForest {
        let mut roots: Vec<&EndProduct> = requests.iter().collect();
        roots.sort_by_key(|r| {
            (
                r.identifier,
                r.runs,
                r.material_efficiency,
                r.time_efficiency,
            )
        });

        let mut forest = DemandForest::default();
        let mut queue = VecDeque::new();
        for root in roots {
            queue.push_back(forest.push(Demand {
                identifier: root.identifier,
                runs: root.runs,
                material_efficiency: root.material_efficiency,
                time_efficiency: root.time_efficiency,
                depth: 0,
                is_end_product: true,
                parent: None,
                request_index: Some(root.request_index),
            }));
        }

        while let Some(idx) = queue.pop_front() {
            let demand = forest.demands[idx];
            let Some(recipe) = self.catalog.recipe(demand.identifier) else {
                continue;
            };
            let child_depth = demand.depth + 1;

            for input in &recipe.inputs {
                let needed =
                    material_quantity(recipe.kind, input.quantity_per_run, COMPONENT_ME, demand.runs);
                if needed == 0 {
                    continue;
                }

                if self.is_bought(input.item_id) {
                    continue;
                }
                if child_depth > MAX_DEPTH {
                    let capped = forest.depth_capped.entry(input.item_id).or_default();
                    *capped = capped.saturating_add(needed);
                    continue;
                }

                let residual = consume(&mut stock, input.item_id, needed);
                if residual == 0 {
                    continue;
                }
                let Some(child_recipe) = self.catalog.recipe(input.item_id) else {
                    continue;
                };

                let runs = residual.div_ceil(u64::from(child_recipe.output_per_run.max(1)));
                let runs = u32::try_from(runs).unwrap_or(u32::MAX);
                debug!(
                    item = input.item_id,
                    parent = demand.identifier,
                    depth = child_depth,
                    runs,
                    "Component demand"
                );
                queue.push_back(forest.push(Demand {
                    identifier: input.item_id,
                    runs,
                    material_efficiency: COMPONENT_ME,
                    time_efficiency: COMPONENT_TE,
                    depth: child_depth,
                    is_end_product: false,
                    parent: Some(idx),
                    request_index: None,
                }));
            }
        }

        forest.remaining_stock = stock;
        forest
    }
}

/// Take what stock there is; returns the part still needed.
fn consume(stock: &mut StockMap, id: ItemId, needed: u64) -> u64 {
    match stock.get_mut(&id) {
        Some(on_hand) => {
            let taken = (*on_hand).min(needed);
            *on_hand -= taken;
            needed - taken
        }
        None => needed,
    }
}

/// Expand requests into a demand forest.
pub fn expand(
    catalog: &Catalog,
    requests: &[EndProduct],
    stock: StockMap,
    blacklist: &Blacklist,
) -> DemandForest {
    Expander::new(catalog, blacklist).expand(requests, stock)
}
