//! Batching map: entities grouped by the textured model they share.
//!
//! Every entity of a batch uses the same mesh and texture, so the entity
//! renderer binds those once and draws the whole batch with one instanced
//! call. Within a frame, batches keep the order in which their model was
//! first submitted, which keeps frames deterministic.

use std::{collections::HashMap, sync::Arc};

use crate::data_structures::{
    entity::Entity,
    model::{ModelId, TexturedModel},
};

/// All entities submitted for one textured model.
#[derive(Debug)]
pub struct Batch {
    pub model: Arc<TexturedModel>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Default)]
pub struct EntityBatches {
    lookup: HashMap<ModelId, usize>,
    batches: Vec<Batch>,
}

impl EntityBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entity` in the batch of its model, opening a batch on first sight.
    pub fn process(&mut self, entity: &Entity) {
        let batches = &mut self.batches;
        let index = *self.lookup.entry(entity.model.id()).or_insert_with(|| {
            batches.push(Batch {
                model: entity.model.clone(),
                entities: Vec::new(),
            });
            batches.len() - 1
        });
        self.batches[index].entities.push(entity.clone());
    }

    /// Batches in first-submitted order. None of them is empty.
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Forget all queued entities and drop the references to their models.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.lookup.clear();
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn entity_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Take the queued batches out, leaving the map empty.
    pub fn drain(&mut self) -> Vec<Batch> {
        self.lookup.clear();
        std::mem::take(&mut self.batches)
    }
}
