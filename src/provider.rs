use anyhow::Result;

use crate::types::{Folder, StudySet};

/// Source of entity snapshots for a full index rebuild.
pub trait EntityProvider {
    fn get_folders(&self) -> Result<Vec<Folder>>;
    /// Every set with its cards.
    fn get_sets(&self) -> Result<Vec<StudySet>>;
}

impl<T: EntityProvider + ?Sized> EntityProvider for Box<T> {
    fn get_folders(&self) -> Result<Vec<Folder>> {
        (**self).get_folders()
    }

    fn get_sets(&self) -> Result<Vec<StudySet>> {
        (**self).get_sets()
    }
}

/// Provider over snapshots the caller already holds in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pub folders: Vec<Folder>,
    pub sets: Vec<StudySet>,
}

impl StaticProvider {
    /// Provider over fixed folders and sets.
    pub fn new(folders: Vec<Folder>, sets: Vec<StudySet>) -> Self {
        Self { folders, sets }
    }
}

impl EntityProvider for StaticProvider {
    fn get_folders(&self) -> Result<Vec<Folder>> {
        Ok(self.folders.clone())
    }

    fn get_sets(&self) -> Result<Vec<StudySet>> {
        Ok(self.sets.clone())
    }
}
