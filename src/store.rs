use crate::catalog::{default_catalog, QuestDef, UnlockCondition};
use crate::model::Quest;
use std::collections::BTreeMap;

/// Runtime quest instances in catalog order.
///
/// Instances are created once and only ever transitioned, never removed.
/// Iteration order is the catalog order, which is what deposit matching
/// relies on for its first-match rule.
#[derive(Debug, Clone, Default)]
pub struct QuestStore {
    quests: Vec<Quest>,
    unlocks: BTreeMap<String, UnlockCondition>,
}

impl QuestStore {
    pub fn from_catalog(defs: &[QuestDef]) -> Self {
        let mut store = QuestStore::default();
        for def in defs {
            if store.position(def.id).is_some() {
                tracing::warn!(quest_id = def.id, "duplicate quest id in catalog; keeping first");
                continue;
            }
            if let Some(cond) = def.unlock.clone() {
                store.unlocks.insert(def.id.to_string(), cond);
            }
            store.quests.push(def.instantiate());
        }
        store
    }

    pub fn with_default_catalog() -> Self {
        Self::from_catalog(&default_catalog())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.quests.iter().position(|q| q.id == id)
    }

    pub fn list(&self) -> &[Quest] {
        &self.quests
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.position(id).map(|i| &self.quests[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Quest> {
        match self.position(id) {
            Some(i) => Some(&mut self.quests[i]),
            None => None,
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Quest> {
        self.quests.iter_mut()
    }

    pub fn unlock_condition(&self, id: &str) -> Option<&UnlockCondition> {
        self.unlocks.get(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.quests.iter().map(|q| q.id.clone()).collect()
    }
}
