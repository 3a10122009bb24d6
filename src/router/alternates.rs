//! Alternate model ordering.

use crate::catalog::ModelCatalog;
use std::collections::HashSet;

/// Ordered, de-duplicated alternate candidates for a failed `current` model.
///
/// 1. catalog remote models except `current`, by priority
/// 2. environment alternates that are remote models in the catalog, by priority
/// 3. any remaining catalog remote models
///
/// Ids unlisted in `priority` sort after listed ones; ties keep catalog (or env) order.
pub(crate) fn plan(
    catalog: &ModelCatalog,
    current: &str,
    priority: &[String],
    env_alternates: &[String],
) -> Vec<String> {
    let remote: Vec<String> = catalog
        .remote_ids()
        .into_iter()
        .filter(|id| id != current)
        .collect();

    let mut phase_a = remote.clone();
    sort_by_priority(&mut phase_a, priority);

    let mut phase_b: Vec<String> = env_alternates
        .iter()
        .filter(|id| id.as_str() != current && remote.contains(*id))
        .cloned()
        .collect();
    sort_by_priority(&mut phase_b, priority);

    let mut seen = HashSet::new();
    phase_a
        .into_iter()
        .chain(phase_b)
        .chain(remote)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn sort_by_priority(ids: &mut [String], priority: &[String]) {
    if priority.is_empty() {
        return;
    }
    let rank = |id: &String| {
        priority
            .iter()
            .position(|p| p == id)
            .unwrap_or(priority.len())
    };
    ids.sort_by_key(rank);
}

/// Counts non-free alternate attempts against the cap.
#[derive(Debug)]
pub(crate) struct AlternateBudget {
    cap: u32,
    tried: u32,
}

impl AlternateBudget {
    pub fn new(cap: u32) -> Self {
        Self { cap, tried: 0 }
    }

    pub fn exhausted(&self) -> bool {
        self.tried >= self.cap
    }

    pub fn charge(&mut self) {
        self.tried += 1;
    }

    pub fn tried(&self) -> u32 {
        self.tried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelDescriptor, ProviderKind};

    fn catalog() -> ModelCatalog {
        ModelCatalog::new()
            .with_model(ModelDescriptor::new("local_engine", "Local", ProviderKind::Local))
            .with_model(ModelDescriptor::new("r/a", "A", ProviderKind::Remote))
            .with_model(ModelDescriptor::new("r/b", "B", ProviderKind::Remote))
            .with_model(ModelDescriptor::new("r/c", "C", ProviderKind::Remote))
    }

    #[test]
    fn test_excludes_current_and_locals() {
        assert_eq!(plan(&catalog(), "r/b", &[], &[]), vec!["r/a", "r/c"]);
    }

    #[test]
    fn test_priority_then_stable() {
        let priority = vec!["r/c".to_string(), "missing".to_string()];
        assert_eq!(plan(&catalog(), "r/x", &priority, &[]), vec!["r/c", "r/a", "r/b"]);
    }

    #[test]
    fn test_env_alternates_never_duplicate() {
        let env = vec!["r/c".to_string(), "elsewhere/model".to_string(), "local_engine".to_string()];
        let planned = plan(&catalog(), "r/a", &[], &env);
        assert_eq!(planned, vec!["r/b", "r/c"]);
    }

    #[test]
    fn test_budget() {
        let mut b = AlternateBudget::new(2);
        assert!(!b.exhausted());
        b.charge();
        b.charge();
        assert!(b.exhausted());
        assert_eq!(b.tried(), 2);
    }
}
