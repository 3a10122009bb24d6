use super::ModelCatalog;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Retired remote ids and their current replacements.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("deepseek/deepseek-chat-v3-0324:free", "deepseek/deepseek-r1-0528:free"),
    ("nex-agi/deepseek-v3.1-nex-n1:free", "deepseek/deepseek-r1-0528:free"),
];

/// Lowercase and drop every non-alphanumeric character.
pub fn normalize_id(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// `"vendor/name:tag"` → `"name"`.
fn slug(id: &str) -> &str {
    let tail = id.rsplit('/').next().unwrap_or(id);
    tail.split(':').next().unwrap_or(tail)
}

/// Map a user- or config-supplied id onto a catalog id.
///
/// 1. exact catalog id
/// 2. legacy table (raw id, normalized id, or normalized slug)
/// 3. normalized match against catalog id, display name, or id suffix after the last `/`
///
/// Several normalized matches resolve to the first in catalog order.
pub fn resolve_alias(catalog: &ModelCatalog, raw_id: &str) -> Result<String> {
    let raw = raw_id.trim();
    if catalog.contains(raw) {
        return Ok(raw.to_string());
    }

    let target = normalize_id(raw);
    let not_found = || Error::UnknownModel {
        id: raw_id.to_string(),
    };
    if target.is_empty() {
        return Err(not_found());
    }

    for (legacy, current) in LEGACY_ALIASES {
        let hit = raw == *legacy
            || target == normalize_id(legacy)
            || target == normalize_id(slug(legacy));
        if hit && catalog.contains(current) {
            debug!(from = raw, to = *current, "legacy model id remapped");
            return Ok((*current).to_string());
        }
    }

    let candidates: Vec<&str> = catalog
        .list()
        .iter()
        .filter(|m| {
            let suffix = normalize_id(m.id.rsplit('/').next().unwrap_or(&m.id));
            target == normalize_id(&m.id)
                || target == normalize_id(&m.display_name)
                || target == normalize_id(slug(&m.id))
                || (!suffix.is_empty() && target.ends_with(&suffix))
        })
        .map(|m| m.id.as_str())
        .collect();

    match candidates.as_slice() {
        [] => Err(not_found()),
        [only] => Ok((*only).to_string()),
        [first, ..] => {
            warn!(
                alias = raw,
                candidates = ?candidates,
                chosen = *first,
                "ambiguous model alias, using first candidate"
            );
            Ok((*first).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelDescriptor, ProviderKind};

    #[test]
    fn test_exact_and_whitespace() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(
            resolve_alias(&catalog, " openai/gpt-oss-20b:free ").unwrap(),
            "openai/gpt-oss-20b:free"
        );
    }

    #[test]
    fn test_legacy_slug_resolves_to_current() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(
            resolve_alias(&catalog, "deepseek-chat-v3-0324").unwrap(),
            "deepseek/deepseek-r1-0528:free"
        );
        assert_eq!(
            resolve_alias(&catalog, "deepseek/deepseek-chat-v3-0324:free").unwrap(),
            "deepseek/deepseek-r1-0528:free"
        );
        assert_eq!(
            resolve_alias(&catalog, "nex-agi/deepseek-v3.1-nex-n1:free").unwrap(),
            "deepseek/deepseek-r1-0528:free"
        );
    }

    #[test]
    fn test_display_name_and_slug() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(
            resolve_alias(&catalog, "OpenAI GPT-OSS 120B").unwrap(),
            "openai/gpt-oss-120b:free"
        );
        assert_eq!(
            resolve_alias(&catalog, "gpt-oss-20b").unwrap(),
            "openai/gpt-oss-20b:free"
        );
        assert_eq!(resolve_alias(&catalog, "Local Engine").unwrap(), "local_engine");
    }

    #[test]
    fn test_ambiguous_takes_first() {
        let catalog = ModelCatalog::new()
            .with_model(ModelDescriptor::new("a/chat", "Alpha", ProviderKind::Remote))
            .with_model(ModelDescriptor::new("b/chat", "Beta", ProviderKind::Remote));
        assert_eq!(resolve_alias(&catalog, "chat").unwrap(), "a/chat");
    }

    #[test]
    fn test_unknown_and_empty() {
        let catalog = ModelCatalog::builtin();
        assert!(matches!(
            resolve_alias(&catalog, "claude-9"),
            Err(Error::UnknownModel { .. })
        ));
        assert!(resolve_alias(&catalog, "///").is_err());
    }
}
