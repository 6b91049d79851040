//! Catalog database schema and operations

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::catalog::Catalog;
use crate::models::{ActivityKind, Item, ItemId, Recipe, RecipeMaterial};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Item types
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            group_id INTEGER NOT NULL
        );

        -- One recipe per product
        CREATE TABLE IF NOT EXISTS recipes (
            product_id INTEGER PRIMARY KEY,
            activity TEXT NOT NULL,
            output_quantity INTEGER NOT NULL,
            duration_s INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_materials (
            product_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (product_id, material_id)
        );

        CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
        CREATE INDEX IF NOT EXISTS idx_recipe_materials_material ON recipe_materials(material_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, group_id) VALUES (?1, ?2, ?3)",
        (item.id, &item.name, item.group_id),
    )?;
    Ok(())
}

/// Insert or replace a recipe together with its inputs
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (product_id, activity, output_quantity, duration_s)
         VALUES (?1, ?2, ?3, ?4)",
        (
            recipe.product_id,
            recipe.kind.as_str(),
            recipe.output_per_run,
            recipe.base_duration_s,
        ),
    )?;
    conn.execute(
        "DELETE FROM recipe_materials WHERE product_id = ?1",
        [recipe.product_id],
    )?;
    for input in &recipe.inputs {
        conn.execute(
            "INSERT OR REPLACE INTO recipe_materials (product_id, material_id, quantity)
             VALUES (?1, ?2, ?3)",
            (recipe.product_id, input.item_id, input.quantity_per_run),
        )?;
    }
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_materials;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// List all items ordered by name
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name, group_id FROM items ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            group_id: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn recipe_inputs(conn: &Connection, product_id: ItemId) -> Result<Vec<RecipeMaterial>> {
    let mut stmt = conn.prepare(
        "SELECT material_id, quantity FROM recipe_materials
         WHERE product_id = ?1
         ORDER BY material_id",
    )?;

    let rows = stmt.query_map([product_id], |row| {
        Ok(RecipeMaterial {
            item_id: row.get(0)?,
            quantity_per_run: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all recipes with their inputs
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT product_id, activity, output_quantity, duration_s FROM recipes ORDER BY product_id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, ItemId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, u32>(3)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (product_id, activity, output_per_run, base_duration_s) = row?;
        let kind = ActivityKind::parse(&activity)
            .ok_or_else(|| anyhow!("Unknown activity '{}' for product {}", activity, product_id))?;
        results.push(Recipe {
            product_id,
            kind,
            inputs: recipe_inputs(conn, product_id)?,
            output_per_run,
            base_duration_s,
        });
    }
    Ok(results)
}

/// Load the whole catalog into memory
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let items = list_items(conn)?;
    let recipes = list_recipes(conn)?;
    Ok(Catalog::new(items, recipes))
}
