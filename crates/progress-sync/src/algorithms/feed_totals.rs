//! # Feed Totals
//!
//! Authoritative XP implied by each completion feed.

use std::collections::HashSet;

use crate::domain::{
    ModuleContribution, ModuleProgress, TaskCompletion, UNKNOWN_MODULE_TITLE,
};
use crate::ports::Catalog;

/// Sum of points over every completed task.
pub fn task_feed_total(tasks: &[TaskCompletion]) -> u64 {
    tasks
        .iter()
        .fold(0u64, |total, task| total.saturating_add(task.points))
}

/// Sum of catalog XP rewards over every completed module.
///
/// A module reported more than once counts once. Completed modules missing
/// from the catalog contribute 0 and are listed as "Unknown Module".
pub fn module_feed_total(
    progress: &[ModuleProgress],
    catalog: &dyn Catalog,
) -> (u64, Vec<ModuleContribution>) {
    let mut seen = HashSet::new();
    let mut total = 0u64;
    let mut contributions = Vec::new();

    for module in progress.iter().filter(|m| m.is_completed()) {
        if !seen.insert(module.module_id.as_str()) {
            continue;
        }

        let contribution = match catalog.lookup(&module.module_id) {
            Some(entry) => ModuleContribution {
                module_id: module.module_id.clone(),
                xp_reward: entry.xp_reward,
                title: entry.title,
            },
            None => ModuleContribution {
                module_id: module.module_id.clone(),
                xp_reward: 0,
                title: UNKNOWN_MODULE_TITLE.to_string(),
            },
        };

        total = total.saturating_add(contribution.xp_reward);
        contributions.push(contribution);
    }

    (total, contributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticCatalog;
    use crate::domain::ModuleCatalogEntry;

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_entries(vec![
            ModuleCatalogEntry::new("intro", 50, "Welcome"),
            ModuleCatalogEntry::new("security", 120, "Security Basics"),
            ModuleCatalogEntry::new("sql", 200, "SQL 101"),
        ])
    }

    #[test]
    fn test_task_total_sums_points() {
        let tasks = vec![
            TaskCompletion { points: 100 },
            TaskCompletion { points: 0 },
            TaskCompletion { points: 150 },
        ];
        assert_eq!(task_feed_total(&tasks), 250);
        assert_eq!(task_feed_total(&[]), 0);
    }

    #[test]
    fn test_module_total_counts_only_completed() {
        let progress = vec![
            ModuleProgress::new("intro", 100),
            ModuleProgress::new("security", 99),
            ModuleProgress::new("sql", 100),
        ];
        let (total, contributions) = module_feed_total(&progress, &catalog());
        assert_eq!(total, 250);
        assert_eq!(contributions.len(), 2);
        assert_eq!(contributions[1].title, "SQL 101");
    }

    #[test]
    fn test_module_total_unknown_module_contributes_zero() {
        let progress = vec![
            ModuleProgress::new("intro", 100),
            ModuleProgress::new("retired", 100),
        ];
        let (total, contributions) = module_feed_total(&progress, &catalog());
        assert_eq!(total, 50);
        assert_eq!(contributions[1].xp_reward, 0);
        assert_eq!(contributions[1].title, UNKNOWN_MODULE_TITLE);
    }

    #[test]
    fn test_module_total_duplicate_counts_once() {
        let progress = vec![
            ModuleProgress::new("security", 100),
            ModuleProgress::new("security", 100),
        ];
        let (total, contributions) = module_feed_total(&progress, &catalog());
        assert_eq!(total, 120);
        assert_eq!(contributions.len(), 1);
    }
}
