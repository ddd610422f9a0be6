use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BlockError;
use crate::types::BlockedItem;

/// Declared-intent record, rewritten in full after every mutation.
#[derive(Debug, Clone)]
pub struct BlockStore {
    path: PathBuf,
    items: Vec<BlockedItem>,
}

impl BlockStore {
    pub fn load(path: &Path) -> Result<Self, BlockError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                items: Vec::new(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|err| {
            BlockError::Persistence(format!("read {}: {err}", path.display()))
        })?;
        let items = if contents.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&contents).map_err(|err| {
                BlockError::Persistence(format!("parse {}: {err}", path.display()))
            })?
        };
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn save(&self) -> Result<(), BlockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                BlockError::Persistence(format!("create dir {}: {err}", parent.display()))
            })?;
        }
        let contents = serde_json::to_string_pretty(&self.items).map_err(|err| {
            BlockError::Persistence(format!("render {}: {err}", self.path.display()))
        })?;
        fs::write(&self.path, contents).map_err(|err| {
            BlockError::Persistence(format!("write {}: {err}", self.path.display()))
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items(&self) -> &[BlockedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.items.iter().position(|item| item.matches(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.position(path).is_some()
    }

    /// Appends and persists. The in-memory list is left untouched if the write fails.
    pub fn add(&mut self, item: BlockedItem) -> Result<(), BlockError> {
        if self.contains(&item.path) {
            return Err(BlockError::Duplicate(item.path));
        }
        self.items.push(item);
        if let Err(err) = self.save() {
            self.items.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Removes the item at `index` and persists. Restored in memory if the write fails.
    pub fn remove(&mut self, index: usize) -> Result<BlockedItem, BlockError> {
        if index >= self.items.len() {
            return Err(BlockError::NotBlocked(format!("no entry at position {}", index + 1)));
        }
        let item = self.items.remove(index);
        if let Err(err) = self.save() {
            self.items.insert(index, item);
            return Err(err);
        }
        Ok(item)
    }
}
