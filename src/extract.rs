//! Static data export import
//!
//! Reads the CSV dumps of the EVE static data export (`invTypes.csv`,
//! `industryActivity.csv`, `industryActivityProducts.csv`,
//! `industryActivityMaterials.csv`) and stores items and recipes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{ActivityKind, Item, ItemId, Recipe, RecipeMaterial};

const TYPES_FILE: &str = "invTypes.csv";
const ACTIVITY_FILE: &str = "industryActivity.csv";
const PRODUCTS_FILE: &str = "industryActivityProducts.csv";
const MATERIALS_FILE: &str = "industryActivityMaterials.csv";

const ACTIVITY_MANUFACTURING: u32 = 1;
const ACTIVITY_REACTION: u32 = 11;

#[derive(Debug, Deserialize)]
struct TypeRow {
    #[serde(rename = "typeID")]
    type_id: ItemId,
    #[serde(rename = "groupID")]
    group_id: u32,
    #[serde(rename = "typeName")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    #[serde(rename = "typeID")]
    blueprint_id: u32,
    #[serde(rename = "activityID")]
    activity_id: u32,
    time: u32,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(rename = "typeID")]
    blueprint_id: u32,
    #[serde(rename = "activityID")]
    activity_id: u32,
    #[serde(rename = "productTypeID")]
    product_id: ItemId,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct MaterialRow {
    #[serde(rename = "typeID")]
    blueprint_id: u32,
    #[serde(rename = "activityID")]
    activity_id: u32,
    #[serde(rename = "materialTypeID")]
    material_id: ItemId,
    quantity: u32,
}

fn activity_kind(activity_id: u32) -> Option<ActivityKind> {
    match activity_id {
        ACTIVITY_MANUFACTURING => Some(ActivityKind::Manufacturing),
        ACTIVITY_REACTION => Some(ActivityKind::Reaction),
        _ => None,
    }
}

/// Locate the SDE CSV files anywhere below `dir`
pub fn find_sde_files(dir: &Path) -> Result<HashMap<&'static str, PathBuf>> {
    let wanted = [TYPES_FILE, ACTIVITY_FILE, PRODUCTS_FILE, MATERIALS_FILE];
    let mut found = HashMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let filename = entry.file_name().to_str().unwrap_or("");
        if let Some(name) = wanted.iter().find(|w| w.eq_ignore_ascii_case(filename)) {
            found.entry(*name).or_insert_with(|| entry.path().to_path_buf());
        }
    }

    for name in wanted {
        if !found.contains_key(name) {
            return Err(anyhow!("{} not found under {}", name, dir.display()));
        }
    }
    Ok(found)
}

/// Read every well-formed row; malformed rows are counted and skipped
fn read_rows<T: DeserializeOwned>(path: &Path, skipped: &mut usize) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping row");
                *skipped += 1;
            }
        }
    }
    Ok(rows)
}

/// Import items and recipes from an SDE CSV directory into the database
pub fn import_sde(conn: &Connection, sde_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    info!(dir = %sde_dir.display(), "Scanning for SDE files");
    let files = find_sde_files(sde_dir)?;

    let types: Vec<TypeRow> = read_rows(&files[TYPES_FILE], &mut stats.skipped)?;
    let activities: Vec<ActivityRow> = read_rows(&files[ACTIVITY_FILE], &mut stats.skipped)?;
    let mut products: Vec<ProductRow> = read_rows(&files[PRODUCTS_FILE], &mut stats.skipped)?;
    let materials: Vec<MaterialRow> = read_rows(&files[MATERIALS_FILE], &mut stats.skipped)?;

    let times: HashMap<(u32, u32), u32> = activities
        .into_iter()
        .map(|a| ((a.blueprint_id, a.activity_id), a.time))
        .collect();

    let mut inputs: HashMap<(u32, u32), Vec<RecipeMaterial>> = HashMap::new();
    for m in materials {
        inputs
            .entry((m.blueprint_id, m.activity_id))
            .or_default()
            .push(RecipeMaterial {
                item_id: m.material_id,
                quantity_per_run: m.quantity,
            });
    }

    // first blueprint by id wins when several produce the same item
    products.sort_by_key(|p| (p.blueprint_id, p.activity_id));
    let mut recipes: BTreeMap<ItemId, Recipe> = BTreeMap::new();
    for p in products {
        let Some(kind) = activity_kind(p.activity_id) else {
            continue;
        };
        if recipes.contains_key(&p.product_id) {
            stats.duplicates += 1;
            continue;
        }
        let key = (p.blueprint_id, p.activity_id);
        recipes.insert(
            p.product_id,
            Recipe {
                product_id: p.product_id,
                kind,
                inputs: inputs.remove(&key).unwrap_or_default(),
                output_per_run: p.quantity,
                base_duration_s: times.get(&key).copied().unwrap_or(0),
            },
        );
    }

    let tx = conn.unchecked_transaction()?;
    for t in &types {
        db::upsert_item(
            &tx,
            &Item {
                id: t.type_id,
                name: t.type_name.clone(),
                group_id: t.group_id,
            },
        )?;
        stats.items += 1;
    }
    for recipe in recipes.values() {
        db::upsert_recipe(&tx, recipe)?;
        stats.recipes += 1;
        stats.materials += recipe.inputs.len();
    }
    tx.commit()?;

    info!(items = stats.items, recipes = stats.recipes, "Import finished");
    Ok(stats)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub items: usize,
    pub recipes: usize,
    pub materials: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} items and {} recipes ({} inputs). Duplicate recipes: {}, Skipped rows: {}",
            self.items, self.recipes, self.materials, self.duplicates, self.skipped
        )
    }
}
