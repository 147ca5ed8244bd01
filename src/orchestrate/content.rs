use std::collections::BTreeMap;

use crate::effects::memory_layer::{MediaKind, MemoryContent};

/// Memories the vials can summon, keyed `memory-<id>`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ContentTable(BTreeMap<String, MemoryContent>);

impl Default for ContentTable {
    fn default() -> Self {
        let entries = (1..=3).map(|n| {
            (
                format!("memory-{n}"),
                MemoryContent {
                    kind: MediaKind::Image,
                    source_url: format!("assets/memories/m{n}.jpg"),
                    caption: format!("Caption number {n}"),
                },
            )
        });
        Self(entries.collect())
    }
}

impl ContentTable {
    pub fn new(entries: BTreeMap<String, MemoryContent>) -> Self {
        Self(entries)
    }

    /// Content for the payload id a vial carries (`data-memory`).
    pub fn lookup(&self, payload_id: &str) -> Option<&MemoryContent> {
        self.0.get(&format!("memory-{payload_id}"))
    }

    pub fn insert(&mut self, payload_id: &str, content: MemoryContent) {
        self.0.insert(format!("memory-{payload_id}"), content);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/content.rs"]
mod tests;
