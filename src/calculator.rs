//! Production plan calculation
//!
//! Runs the planning pipeline: resolve input, expand the bill of materials,
//! consolidate and split jobs, compute materials, then schedule.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::PlanRequest;
use crate::demand::{StockParser, resolve_product};
use crate::error::InputError;
use crate::expander::{EndProduct, Expander};
use crate::materials::{materialize, purchase_list};
use crate::models::{JobRequest, PlanError, ProductionPlan};
use crate::scheduler::schedule;
use crate::splitter::consolidate_and_split;

/// Upper bounds for blueprint research levels
pub const MAX_MATERIAL_EFFICIENCY: u8 = 10;
pub const MAX_TIME_EFFICIENCY: u8 = 20;

/// Planning entry point holding the shared catalog snapshot
#[derive(Debug, Clone)]
pub struct Planner {
    catalog: Arc<Catalog>,
    stock_parser: StockParser,
}

impl Planner {
    pub fn new(catalog: Arc<Catalog>) -> Result<Self> {
        Ok(Self {
            catalog,
            stock_parser: StockParser::new()?,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build a production plan. Problems with individual inputs end up in
    /// `errors`; planning itself does not fail.
    #[instrument(skip_all, fields(jobs = request.jobs.len()))]
    pub fn plan(&self, request: &PlanRequest) -> ProductionPlan {
        let catalog = self.catalog.as_ref();
        let config = &request.config;

        let (end_products, mut errors) = resolve_requests(catalog, &request.jobs);
        let (stock, stock_errors) = self.stock_parser.parse(catalog, &request.stock);
        errors.extend(stock_errors);

        let expander = Expander::new(catalog, &config.blacklist);
        let forest = expander.expand(&end_products, stock);

        let mut jobs = consolidate_and_split(catalog, &forest, config);
        for job in &mut jobs {
            if let Some(recipe) = catalog.recipe(job.identifier) {
                materialize(recipe, job);
            }
        }

        let materials = purchase_list(
            catalog,
            &jobs,
            &forest.depth_capped,
            &forest.remaining_stock,
            |id| expander.is_bought(id),
        );

        let total_jobs = jobs.len();
        let scheduled = schedule(jobs, config);

        info!(
            jobs = total_jobs,
            materials = materials.len(),
            days = scheduled.total_days,
            errors = errors.len(),
            "Plan complete"
        );

        ProductionPlan {
            total_materials: materials.len(),
            materials,
            jobs: scheduled.jobs_by_category,
            category_timings: scheduled.timings,
            total_production_time_days: scheduled.total_days,
            total_jobs,
            errors,
        }
    }
}

fn validate(catalog: &Catalog, job: &JobRequest) -> Result<EndProduct, InputError> {
    if job.runs == 0 {
        return Err(InputError::ZeroRuns);
    }
    if job.me > MAX_MATERIAL_EFFICIENCY {
        return Err(InputError::MaterialEfficiencyOutOfRange(job.me));
    }
    if job.te > MAX_TIME_EFFICIENCY {
        return Err(InputError::TimeEfficiencyOutOfRange(job.te));
    }
    let identifier = resolve_product(catalog, &job.product)
        .ok_or_else(|| InputError::UnknownItem(job.product.clone()))?;
    if catalog.recipe(identifier).is_none() {
        return Err(InputError::NoRecipe(catalog.name(identifier)));
    }
    Ok(EndProduct {
        identifier,
        runs: job.runs,
        material_efficiency: job.me,
        time_efficiency: job.te,
        request_index: 0,
    })
}

fn resolve_requests(catalog: &Catalog, jobs: &[JobRequest]) -> (Vec<EndProduct>, Vec<PlanError>) {
    let mut resolved = Vec::new();
    let mut errors = Vec::new();
    for (index, job) in jobs.iter().enumerate() {
        match validate(catalog, job) {
            Ok(end_product) => resolved.push(EndProduct {
                request_index: index,
                ..end_product
            }),
            Err(e) => {
                warn!(product = %job.product, error = %e, "Skipping job request");
                errors.push(PlanError::new(job.product.as_str(), e));
            }
        }
    }
    (resolved, errors)
}

fn format_duration(days: f64) -> String {
    let total_minutes = (days * 24.0 * 60.0).round() as u64;
    let (d, rem) = (total_minutes / 1440, total_minutes % 1440);
    format!("{}d {:02}h {:02}m", d, rem / 60, rem % 60)
}

impl fmt::Display for ProductionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Plan ===")?;
        writeln!(
            f,
            "Jobs: {}  Materials: {}  Total time: {}",
            self.total_jobs,
            self.total_materials,
            format_duration(self.total_production_time_days)
        )?;
        writeln!(f)?;

        writeln!(f, "Materials to buy:")?;
        for m in &self.materials {
            writeln!(f, "  {:<40} {:>14}", m.name, m.quantity)?;
        }
        writeln!(f)?;

        for (category, jobs) in &self.jobs {
            if jobs.is_empty() {
                continue;
            }
            let timing = self.category_timings.get(category).copied().unwrap_or_default();
            writeln!(
                f,
                "{} ({} jobs on {} slots, {}):",
                category,
                timing.job_count,
                timing.slots_used,
                format_duration(timing.total_time_days)
            )?;
            for job in jobs {
                let split = job
                    .split_info
                    .map(|s| format!(" [{}/{} of {} runs]", s.index + 1, s.count, s.original_runs))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "  {:>5}x {:<40} ME{:<2} TE{:<2} {}{}",
                    job.runs,
                    job.name,
                    job.material_efficiency,
                    job.time_efficiency,
                    format_duration(job.duration_seconds as f64 / 86_400.0),
                    split
                )?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors:")?;
            for e in &self.errors {
                writeln!(f, "  {}: {}", e.input, e.error)?;
            }
        }

        Ok(())
    }
}
