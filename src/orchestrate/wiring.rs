use std::collections::{BTreeMap, BTreeSet};

use crate::effects::EffectKey;
use crate::foundation::error::{PensieveError, PensieveResult};

/// One node of the wiring graph: an effect and the effects whose signals it consumes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiringEntry {
    pub key: EffectKey,
    #[serde(default)]
    pub after: Vec<EffectKey>,
}

impl WiringEntry {
    pub fn new(key: EffectKey, after: &[EffectKey]) -> Self {
        Self {
            key,
            after: after.to_vec(),
        }
    }
}

/// The resolved update order of a ceremony.
///
/// Producers always come before their consumers. Among modules with no ordering
/// constraint between them, declaration order is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wiring {
    order: Vec<EffectKey>,
    deps: BTreeMap<EffectKey, Vec<EffectKey>>,
    dependents: BTreeMap<EffectKey, Vec<EffectKey>>,
}

impl Wiring {
    pub fn resolve(entries: &[WiringEntry]) -> PensieveResult<Self> {
        let mut index = BTreeMap::new();
        for (i, e) in entries.iter().enumerate() {
            if index.insert(e.key, i).is_some() {
                return Err(PensieveError::validation(format!(
                    "wiring lists '{}' twice",
                    e.key
                )));
            }
        }

        let mut indegree = vec![0usize; entries.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        for (i, e) in entries.iter().enumerate() {
            for dep in &e.after {
                let Some(&j) = index.get(dep) else {
                    return Err(PensieveError::validation(format!(
                        "'{}' depends on '{dep}', which is not wired",
                        e.key
                    )));
                };
                if children[j].contains(&i) {
                    continue;
                }
                children[j].push(i);
                indegree[i] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..entries.len()).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(entries.len());
        while let Some(i) = ready.pop_first() {
            order.push(entries[i].key);
            for &c in &children[i] {
                indegree[c] -= 1;
                if indegree[c] == 0 {
                    ready.insert(c);
                }
            }
        }
        if order.len() != entries.len() {
            let stuck: Vec<&str> = entries
                .iter()
                .enumerate()
                .filter(|(i, _)| indegree[*i] > 0)
                .map(|(_, e)| e.key.as_str())
                .collect();
            return Err(PensieveError::validation(format!(
                "wiring has a cycle through {}",
                stuck.join(", ")
            )));
        }

        let mut deps = BTreeMap::new();
        let mut dependents: BTreeMap<EffectKey, Vec<EffectKey>> = BTreeMap::new();
        for e in entries {
            let mut after: Vec<EffectKey> = Vec::with_capacity(e.after.len());
            for d in &e.after {
                if !after.contains(d) {
                    after.push(*d);
                }
            }
            for d in &after {
                let list = dependents.entry(*d).or_default();
                if !list.contains(&e.key) {
                    list.push(e.key);
                }
            }
            deps.insert(e.key, after);
        }
        // Consumers are notified in update order.
        let rank: BTreeMap<EffectKey, usize> =
            order.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        for list in dependents.values_mut() {
            list.sort_by_key(|k| rank[k]);
        }

        tracing::debug!(order = ?order, "wiring resolved");
        Ok(Self {
            order,
            deps,
            dependents,
        })
    }

    pub fn order(&self) -> &[EffectKey] {
        &self.order
    }

    pub fn contains(&self, key: EffectKey) -> bool {
        self.deps.contains_key(&key)
    }

    /// Modules that consume `key`'s signals.
    pub fn dependents(&self, key: EffectKey) -> &[EffectKey] {
        self.dependents.get(&key).map_or(&[], Vec::as_slice)
    }

    pub fn dependencies(&self, key: EffectKey) -> &[EffectKey] {
        self.deps.get(&key).map_or(&[], Vec::as_slice)
    }
}

/// The page's wiring: the timeline-driven modules in their broadcast order, then the
/// self-driven ones.
pub fn page_wiring() -> Vec<WiringEntry> {
    use EffectKey::*;
    vec![
        WiringEntry::new(VialTilt, &[]),
        WiringEntry::new(SceneCamera, &[]),
        WiringEntry::new(BasinVisibility, &[]),
        WiringEntry::new(BasinWake, &[]),
        WiringEntry::new(BasinWater, &[BasinVisibility, BasinWake]),
        WiringEntry::new(BasinIncoming, &[BasinWake]),
        WiringEntry::new(MediaReveal, &[]),
        WiringEntry::new(CaptionReveal, &[]),
        WiringEntry::new(CircleFormation, &[]),
        WiringEntry::new(VialThreads, &[]),
        WiringEntry::new(WispBridge, &[VialThreads]),
        WiringEntry::new(AmbientParticles, &[]),
        WiringEntry::new(VialsOrbit, &[]),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/wiring.rs"]
mod tests;
