//! EVE Industry Production Planner
//!
//! Plans manufacturing and reaction chains from the static data export.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use industry_planner::models::{ActivityKind, Item, ItemId, Recipe, RecipeMaterial};
use industry_planner::{PlanRequest, Planner, db, demand, extract, logging};

#[derive(Parser)]
#[command(name = "industry-planner")]
#[command(about = "Production planner for EVE Online manufacturing and reactions")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "industry.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import items and recipes from SDE CSV dumps
    Import {
        /// Directory containing invTypes.csv and the industryActivity*.csv files
        sde_dir: PathBuf,

        /// Clear existing data before importing
        #[arg(long)]
        clear: bool,
    },

    /// Build a production plan from a JSON request
    Plan {
        /// Planning request file
        request: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Override the configured reaction slots
        #[arg(long)]
        reaction_slots: Option<u32>,

        /// Override the configured manufacturing slots
        #[arg(long)]
        manufacturing_slots: Option<u32>,
    },

    /// List all items in the database
    ListItems,

    /// List all products that have a recipe
    ListRecipes,

    /// Show the recipe for an item
    Item {
        /// Item name (partial names match)
        name: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without an SDE dump)
    LoadSample,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { sde_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::import_sde(&conn, &sde_dir)?;
            println!("\n{}", stats);
        }

        Commands::Plan {
            request,
            json,
            reaction_slots,
            manufacturing_slots,
        } => {
            let mut request = PlanRequest::from_path(&request)?;
            if let Some(slots) = reaction_slots {
                request.config.reaction_slots = slots;
            }
            if let Some(slots) = manufacturing_slots {
                request.config.manufacturing_slots = slots;
            }

            let catalog = db::load_catalog(&conn)?;
            if catalog.recipe_count() == 0 {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
                return Ok(());
            }

            let planner = Planner::new(Arc::new(catalog))?;
            let plan = planner.plan(&request);

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("{}", plan);
            }
        }

        Commands::ListItems => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<10} {:<45} {:>8}", "Type ID", "Name", "Group");
                println!("{}", "-".repeat(65));
                for item in items {
                    println!("{:<10} {:<45} {:>8}", item.id, item.name, item.group_id);
                }
            }
        }

        Commands::ListRecipes => {
            let catalog = db::load_catalog(&conn)?;
            let recipes = db::list_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Producible items:");
                for r in recipes {
                    println!(
                        "  {} ({}, {} per run)",
                        catalog.name(r.product_id),
                        r.kind.as_str(),
                        r.output_per_run
                    );
                }
            }
        }

        Commands::Item { name } => {
            let catalog = db::load_catalog(&conn)?;
            match demand::resolve_product(&catalog, &name) {
                Some(id) => {
                    println!("Item: {}", catalog.name(id));
                    println!("  Type ID: {}", id);
                    println!("  Category: {}", catalog.category_of(id));

                    if let Some(recipe) = catalog.recipe(id) {
                        println!("  Activity: {}", recipe.kind.as_str());
                        println!("  Output: {} per run", recipe.output_per_run);
                        println!("  Duration: {}s per run", recipe.base_duration_s);
                        println!("  Inputs:");
                        for input in &recipe.inputs {
                            println!(
                                "    {} x {}",
                                input.quantity_per_run,
                                catalog.name(input.item_id)
                            );
                        }
                    } else {
                        println!("  No recipe (bought, not built)");
                    }
                }
                None => println!("Item '{}' not found", name),
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

fn inputs(list: &[(ItemId, u32)]) -> Vec<RecipeMaterial> {
    list.iter()
        .map(|&(item_id, quantity_per_run)| RecipeMaterial {
            item_id,
            quantity_per_run,
        })
        .collect()
}

/// Load a small reaction and manufacturing chain for testing without an SDE dump
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let items: &[(ItemId, &str, u32)] = &[
        // Minerals
        (34, "Tritanium", 18),
        (35, "Pyerite", 18),
        (36, "Mexallon", 18),
        (37, "Isogen", 18),
        // Ice products
        (16272, "Heavy Water", 423),
        (16273, "Liquid Ozone", 423),
        (16275, "Strontium Clathrates", 423),
        (17888, "Nitrogen Isotopes", 423),
        // Planetary commodities
        (44, "Enriched Uranium", 1034),
        (3683, "Oxygen", 1042),
        (3689, "Mechanical Parts", 1034),
        (9832, "Coolant", 1034),
        (9848, "Robotics", 1040),
        // Moon materials
        (16635, "Evaporite Deposits", 427),
        (16636, "Silicates", 427),
        (16638, "Titanium", 427),
        (16641, "Chromium", 427),
        // Produced
        (4051, "Nitrogen Fuel Block", 1136),
        (16654, "Titanium Chromide", 428),
        (16657, "Silicon Diborite", 428),
        (16671, "Titanium Carbide", 429),
        (11532, "Fusion Thruster", 334),
        (587, "Rifter", 25),
        (11371, "Wolf", 324),
    ];
    for &(id, name, group_id) in items {
        db::upsert_item(
            conn,
            &Item {
                id,
                name: name.to_string(),
                group_id,
            },
        )?;
    }

    let recipes = [
        Recipe {
            product_id: 4051,
            kind: ActivityKind::Manufacturing,
            inputs: inputs(&[
                (17888, 450),
                (16272, 170),
                (16273, 350),
                (9832, 9),
                (44, 4),
                (3689, 4),
                (3683, 22),
                (9848, 1),
                (16275, 20),
            ]),
            output_per_run: 40,
            base_duration_s: 900,
        },
        Recipe {
            product_id: 16654,
            kind: ActivityKind::Reaction,
            inputs: inputs(&[(16638, 100), (16641, 100), (4051, 5)]),
            output_per_run: 200,
            base_duration_s: 10800,
        },
        Recipe {
            product_id: 16657,
            kind: ActivityKind::Reaction,
            inputs: inputs(&[(16635, 100), (16636, 100), (4051, 5)]),
            output_per_run: 200,
            base_duration_s: 10800,
        },
        Recipe {
            product_id: 16671,
            kind: ActivityKind::Reaction,
            inputs: inputs(&[(16654, 100), (16657, 100), (4051, 5)]),
            output_per_run: 10000,
            base_duration_s: 10800,
        },
        Recipe {
            product_id: 11532,
            kind: ActivityKind::Manufacturing,
            inputs: inputs(&[(16671, 37)]),
            output_per_run: 1,
            base_duration_s: 3600,
        },
        Recipe {
            product_id: 587,
            kind: ActivityKind::Manufacturing,
            inputs: inputs(&[(34, 32000), (35, 6000), (36, 2500), (37, 500)]),
            output_per_run: 1,
            base_duration_s: 6000,
        },
        Recipe {
            product_id: 11371,
            kind: ActivityKind::Manufacturing,
            inputs: inputs(&[(587, 1), (11532, 30), (34, 5000)]),
            output_per_run: 1,
            base_duration_s: 36000,
        },
    ];
    for recipe in &recipes {
        db::upsert_recipe(conn, recipe)?;
    }

    println!("Loaded {} sample items and {} recipes", items.len(), recipes.len());
    Ok(())
}
