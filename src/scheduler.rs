//! Category-level scheduling of final jobs onto slot pools
//!
//! Each category is packed onto its pool's slots with longest-processing-time
//! first. Categories feeding another category must finish before it starts;
//! categories with no such link run side by side. Total time is the longest
//! chain through the category graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use crate::category::Category;
use crate::config::PlanConfig;
use crate::models::{CategoryTiming, ItemId, JobDescriptor};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub jobs_by_category: BTreeMap<Category, Vec<JobDescriptor>>,
    pub timings: BTreeMap<Category, CategoryTiming>,
    pub total_days: f64,
}

/// Makespan of greedy LPT on `machines` identical machines.
pub fn lpt_makespan(durations: &[u64], machines: u32) -> u64 {
    let mut sorted = durations.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut loads: BinaryHeap<Reverse<u64>> = (0..machines.max(1)).map(|_| Reverse(0)).collect();
    for duration in sorted {
        if let Some(Reverse(load)) = loads.pop() {
            loads.push(Reverse(load + duration));
        }
    }
    loads.into_iter().map(|Reverse(load)| load).max().unwrap_or(0)
}

/// `(slots_used, makespan_seconds)` for one category.
///
/// LPT can get worse with an extra machine, so the best prefix of the
/// available slots is taken.
pub fn category_makespan(durations: &[u64], slots: u32) -> (u32, u64) {
    if durations.is_empty() {
        return (0, 0);
    }
    let jobs = u32::try_from(durations.len()).unwrap_or(u32::MAX);
    let used = jobs.min(slots.max(1));
    let makespan = (1..=used)
        .map(|k| lpt_makespan(durations, k))
        .min()
        .unwrap_or(0);
    (used, makespan)
}

/// Categories whose output feeds each category
fn category_dependencies(jobs: &[JobDescriptor]) -> HashMap<Category, BTreeSet<Category>> {
    let mut producers: HashMap<ItemId, BTreeSet<Category>> = HashMap::new();
    for job in jobs {
        producers.entry(job.identifier).or_default().insert(job.category);
    }

    let mut feeds: HashMap<Category, BTreeSet<Category>> = HashMap::new();
    for job in jobs {
        for material in &job.materials {
            let Some(sources) = producers.get(&material.identifier) else {
                continue;
            };
            for source in sources {
                if *source != job.category {
                    feeds.entry(job.category).or_default().insert(*source);
                }
            }
        }
    }
    feeds
}

/// Everything `from` waits on, directly or through other categories
fn upstream(feeds: &HashMap<Category, BTreeSet<Category>>, from: Category) -> BTreeSet<Category> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![from];
    while let Some(category) = stack.pop() {
        for source in feeds.get(&category).into_iter().flatten() {
            if seen.insert(*source) {
                stack.push(*source);
            }
        }
    }
    seen
}

/// Finish time of each category when it waits for every category feeding it.
///
/// Categories that feed each other form one group whose makespans run back
/// to back; the groups then form a DAG and a group finishes after its
/// slowest feeding group.
fn finish_times(
    makespans: &BTreeMap<Category, u64>,
    feeds: &HashMap<Category, BTreeSet<Category>>,
) -> BTreeMap<Category, u64> {
    let reach: BTreeMap<Category, BTreeSet<Category>> = makespans
        .keys()
        .map(|&c| (c, upstream(feeds, c)))
        .collect();
    let groups: BTreeMap<Category, BTreeSet<Category>> = reach
        .iter()
        .map(|(&c, upstream)| {
            let mut group: BTreeSet<Category> = upstream
                .iter()
                .copied()
                .filter(|other| reach.get(other).is_some_and(|r| r.contains(&c)))
                .collect();
            group.insert(c);
            (c, group)
        })
        .collect();

    let mut finish = BTreeMap::new();
    for &category in makespans.keys() {
        group_finish(category, &groups, makespans, feeds, &mut finish);
    }
    finish
}

fn group_finish(
    category: Category,
    groups: &BTreeMap<Category, BTreeSet<Category>>,
    makespans: &BTreeMap<Category, u64>,
    feeds: &HashMap<Category, BTreeSet<Category>>,
    finish: &mut BTreeMap<Category, u64>,
) -> u64 {
    if let Some(&done) = finish.get(&category) {
        return done;
    }
    let Some(group) = groups.get(&category) else {
        return 0;
    };

    let own: u64 = group
        .iter()
        .map(|member| makespans.get(member).copied().unwrap_or(0))
        .sum();
    let sources: BTreeSet<Category> = group
        .iter()
        .flat_map(|member| feeds.get(member).into_iter().flatten().copied())
        .filter(|source| !group.contains(source))
        .collect();
    let ready = sources
        .into_iter()
        .map(|source| group_finish(source, groups, makespans, feeds, finish))
        .max()
        .unwrap_or(0);

    let done = ready + own;
    for member in group {
        finish.insert(*member, done);
    }
    done
}

pub fn schedule(jobs: Vec<JobDescriptor>, config: &PlanConfig) -> Schedule {
    let feeds = category_dependencies(&jobs);

    let mut jobs_by_category: BTreeMap<Category, Vec<JobDescriptor>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for job in jobs {
        jobs_by_category.entry(job.category).or_default().push(job);
    }

    let mut timings = BTreeMap::new();
    let mut makespans: BTreeMap<Category, u64> = BTreeMap::new();
    for (category, category_jobs) in &jobs_by_category {
        let durations: Vec<u64> = category_jobs
            .iter()
            .map(|j| j.reserved_seconds.max(j.duration_seconds))
            .collect();
        let (slots_used, makespan) = category_makespan(&durations, config.slots(category.pool()));
        timings.insert(
            *category,
            CategoryTiming {
                total_time_days: makespan as f64 / SECONDS_PER_DAY,
                slots_used,
                job_count: category_jobs.len(),
            },
        );
        if !category_jobs.is_empty() {
            makespans.insert(*category, makespan);
        }
    }

    let total_seconds = finish_times(&makespans, &feeds)
        .into_values()
        .max()
        .unwrap_or(0);
    Schedule {
        jobs_by_category,
        timings,
        total_days: total_seconds as f64 / SECONDS_PER_DAY,
    }
}
