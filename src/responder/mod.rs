//! Local rule-based conversation engine.
//!
//! [`LocalResponder`] is the last line of the fallback chain and the engine behind every
//! local catalog model. It classifies a message into a small fixed set of categories,
//! picks a canned reply according to the creativity level, records the turn in a bounded
//! memory and (optionally) persists that memory to disk.
//!
//! Selection by creativity level:
//! - `<= 0.3`: first candidate, always
//! - `<= 0.5`: weighted `[3, 2, 1, 1, ...]`
//! - `<= 0.7`: weighted `[2, 2, 2, 1, 1, ...]`
//! - `<= 0.8`: weighted `[1, 1, 2, 2, 3, 2, ...]`
//! - above: uniform, with a 10% chance to join two distinct candidates and a 15% chance to
//!   append a one-word flourish

mod memory;
mod patterns;

pub use memory::{
    default_profile_path, ConversationMemory, MemoryEntry, ResponderSnapshot, DEFAULT_MEMORY,
    MAX_MEMORY, MIN_MEMORY,
};
pub use patterns::{classify, Category, Tier};

use crate::settings::AdvancedSettings;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const FALLBACK_REPLY: &str = "I'm here to help!";

struct State {
    creativity: f64,
    memory: ConversationMemory,
    profile: Map<String, Value>,
    persist: bool,
    rng: StdRng,
}

pub struct LocalResponder {
    state: Mutex<State>,
    profile_path: Option<PathBuf>,
}

impl LocalResponder {
    /// In-memory responder with no persistence.
    pub fn new(creativity: f64) -> Self {
        Self::with_rng(creativity, StdRng::from_entropy())
    }

    /// Deterministic randomness, for tests and reproducible sessions.
    pub fn seeded(creativity: f64, seed: u64) -> Self {
        Self::with_rng(creativity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(creativity: f64, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(State {
                creativity: clamp_level(creativity),
                memory: ConversationMemory::default(),
                profile: Map::new(),
                persist: false,
                rng,
            }),
            profile_path: None,
        }
    }

    /// Persist to `path` after every turn and load any existing snapshot from it now.
    pub fn with_profile_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(patch) = memory::read_patch(&path) {
            let mut st = self.lock();
            let State {
                memory, profile, ..
            } = &mut *st;
            memory.apply_patch(patch, profile);
            debug!(path = %path.display(), entries = memory.len(), "local profile loaded");
        }
        self.lock().persist = true;
        self.profile_path = Some(path);
        self
    }

    pub fn profile_path(&self) -> Option<&Path> {
        self.profile_path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Produce a reply. Never fails.
    pub fn respond(&self, user_text: &str) -> String {
        let mut st = self.lock();
        let level = st.creativity;
        let category = classify(user_text);
        let list = patterns::candidates(category, Tier::for_level(level));

        let reply = select(list, level, &mut st.rng);
        st.memory.push(MemoryEntry::new(user_text, reply.clone()));

        if st.persist {
            if let Some(path) = &self.profile_path {
                let snapshot = st.memory.to_snapshot(&st.profile);
                memory::write_snapshot(path, &snapshot);
            }
        }

        let mut reply = reply;
        if level > 0.8 && st.rng.gen_bool(0.15) {
            if let Some(f) = patterns::FLOURISHES.choose(&mut st.rng) {
                reply.push_str(f);
            }
        }
        debug!(category = ?category, creativity = level, "local reply selected");
        reply
    }

    pub fn set_creativity(&self, level: f64) {
        self.lock().creativity = clamp_level(level);
    }

    pub fn creativity(&self) -> f64 {
        self.lock().creativity
    }

    /// Clamped to `[5, 50]`; existing memory is trimmed oldest-first.
    pub fn set_memory_size(&self, size: usize) {
        self.lock().memory.set_max(size);
    }

    /// Enable or disable writes. Has no effect without a profile path.
    pub fn set_persistence(&self, enabled: bool) {
        self.lock().persist = enabled;
    }

    /// Sync creativity, memory bound and persistence from settings.
    pub fn apply_settings(&self, settings: &AdvancedSettings) {
        let mut st = self.lock();
        st.creativity = clamp_level(settings.creativity);
        st.memory.set_max(settings.conversation_memory_size);
        st.persist = settings.remember_local_profile;
    }

    pub fn memory(&self) -> ConversationMemory {
        self.lock().memory.clone()
    }

    pub fn set_profile_value(&self, key: impl Into<String>, value: Value) {
        self.lock().profile.insert(key.into(), value);
    }

    pub fn snapshot(&self) -> ResponderSnapshot {
        let st = self.lock();
        st.memory.to_snapshot(&st.profile)
    }

    /// Replace memory, profile and bound with a snapshot.
    pub fn restore(&self, snapshot: ResponderSnapshot) {
        let mut st = self.lock();
        let State {
            memory, profile, ..
        } = &mut *st;
        memory.apply_patch(
            memory::SnapshotPatch {
                context_memory: Some(snapshot.context_memory),
                user_profile: Some(snapshot.user_profile),
                max_memory: Some(snapshot.max_memory),
            },
            profile,
        );
    }

    /// Write the current snapshot now, regardless of the persistence flag.
    pub fn save(&self) {
        if let Some(path) = &self.profile_path {
            let snapshot = self.snapshot();
            memory::write_snapshot(path, &snapshot);
        }
    }

    /// Delete the profile file. Best effort.
    pub fn clear_persisted(&self) {
        let Some(path) = &self.profile_path else {
            return;
        };
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "local profile removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove local profile"),
        }
    }
}

impl Default for LocalResponder {
    fn default() -> Self {
        Self::new(0.7)
    }
}

fn clamp_level(level: f64) -> f64 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.7
    }
}

fn select<R: Rng>(list: &[&str], level: f64, rng: &mut R) -> String {
    let Some(first) = list.first() else {
        return FALLBACK_REPLY.to_string();
    };
    if level <= 0.3 {
        return (*first).to_string();
    }

    if let Some(weights) = patterns::weights_for(level, list.len()) {
        return match WeightedIndex::new(&weights) {
            Ok(dist) => list[dist.sample(rng)].to_string(),
            Err(_) => (*first).to_string(),
        };
    }

    if list.len() > 1 && rng.gen_bool(0.1) {
        let picked: Vec<&&str> = list.choose_multiple(rng, 2).collect();
        if let [a, b] = picked.as_slice() {
            return format!("{} {}", a, b.to_lowercase());
        }
    }
    list.choose(rng)
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conservative_is_deterministic() {
        let r = LocalResponder::new(0.2);
        for _ in 0..10 {
            assert_eq!(r.respond("hello"), "Hello! How can I assist you today?");
            assert_eq!(
                r.respond("thanks a lot"),
                "You're welcome. Anything else I can help with?"
            );
        }
    }

    #[test]
    fn test_balanced_picks_from_tier() {
        let r = LocalResponder::seeded(0.6, 7);
        let allowed = patterns::candidates(Category::Greeting, Tier::Balanced);
        for _ in 0..50 {
            let reply = r.respond("hey");
            assert!(allowed.contains(&reply.as_str()), "unexpected reply {reply}");
        }
    }

    #[test]
    fn test_creative_replies_come_from_creative_tier() {
        let r = LocalResponder::seeded(0.95, 42);
        let list = patterns::candidates(Category::Greeting, Tier::Creative);
        for _ in 0..100 {
            let reply = r.respond("hello");
            assert!(
                list.iter().any(|c| reply.starts_with(c)),
                "reply does not start with a candidate: {reply}"
            );
        }
    }

    #[test]
    fn test_memory_records_turns() {
        let r = LocalResponder::new(0.1);
        r.set_memory_size(5);
        for i in 0..9 {
            r.respond(&format!("  Message {i} "));
        }
        let mem = r.memory();
        assert_eq!(mem.len(), 5);
        assert_eq!(mem.iter().next().unwrap().user, "message 4");
    }

    #[test]
    fn test_creativity_clamped() {
        let r = LocalResponder::new(0.5);
        r.set_creativity(4.0);
        assert_eq!(r.creativity(), 1.0);
        r.set_creativity(-1.0);
        assert_eq!(r.creativity(), 0.0);
    }

    #[test]
    fn test_select_empty_list() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select(&[], 0.5, &mut rng), FALLBACK_REPLY);
    }

    #[test]
    fn test_weighted_prefers_early_candidates() {
        let mut rng = StdRng::seed_from_u64(99);
        let list = ["a", "b", "c", "d", "e"];
        let mut first = 0;
        let mut last = 0;
        for _ in 0..4000 {
            match select(&list, 0.4, &mut rng).as_str() {
                "a" => first += 1,
                "e" => last += 1,
                _ => {}
            }
        }
        // weights 3 vs 1 out of 8
        assert!(first > last * 2, "first={first} last={last}");
    }
}
