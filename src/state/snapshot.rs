use crate::state::entity::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("duplicate entity id {0}")]
    DuplicateId(String),
    #[error("entity {id} has a series of {actual} points, expected {expected}")]
    SeriesLength {
        id: String,
        expected: usize,
        actual: usize,
    },
    #[error("series length must be at least 1")]
    EmptySeries,
}

/// Authoritative state of every tracked entity, in seed order.
///
/// The id set is closed: entities are inserted while seeding and never
/// removed. Mutation goes through the reconciler only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SnapshotRepr")]
pub struct EntitySnapshot {
    series_len: usize,
    entities: Vec<Entity>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRepr {
    series_len: usize,
    entities: Vec<Entity>,
}

impl TryFrom<SnapshotRepr> for EntitySnapshot {
    type Error = SnapshotError;

    fn try_from(repr: SnapshotRepr) -> Result<Self, Self::Error> {
        let mut snapshot = EntitySnapshot::new(repr.series_len)?;
        for entity in repr.entities {
            snapshot.insert(entity)?;
        }
        Ok(snapshot)
    }
}

impl EntitySnapshot {
    pub fn new(series_len: usize) -> Result<Self, SnapshotError> {
        if series_len == 0 {
            return Err(SnapshotError::EmptySeries);
        }
        Ok(Self {
            series_len,
            entities: Vec::new(),
            index: HashMap::new(),
        })
    }

    /// Adds a seed entity. Rejects duplicate ids and series of the wrong length.
    pub fn insert(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        if self.index.contains_key(&entity.id) {
            return Err(SnapshotError::DuplicateId(entity.id));
        }
        if entity.series.len() != self.series_len {
            return Err(SnapshotError::SeriesLength {
                id: entity.id,
                expected: self.series_len,
                actual: entity.series.len(),
            });
        }
        self.index.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&slot| &self.entities[slot])
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        let slot = *self.index.get(id)?;
        self.entities.get_mut(slot)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|entity| entity.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn series_len(&self) -> usize {
        self.series_len
    }
}
