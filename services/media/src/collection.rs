//! Local cache of the viewer's videos
//!
//! Entries keep the order the server listed them in. Status patches never
//! move an entry, never create one, and the last patch applied to an id wins.
//! There are no version numbers: a patch racing a full refresh is resolved
//! purely by the order the two calls reach the collection.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::models::{MediaItem, MediaStatus, StatusEvent};

/// Ordered mapping from video id to video
#[derive(Debug, Clone, Default)]
pub struct MediaCollection {
    items: Vec<MediaItem>,
    index: HashMap<Uuid, usize>,
    revision: u64,
}

impl MediaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything and hold `items` in the given order
    ///
    /// A repeated id keeps the position of its first occurrence and the
    /// fields of its last one.
    pub fn replace(&mut self, items: impl IntoIterator<Item = MediaItem>) {
        self.items.clear();
        self.index.clear();

        for item in items {
            match self.index.get(&item.id) {
                Some(&position) => self.items[position] = item,
                None => {
                    self.index.insert(item.id, self.items.len());
                    self.items.push(item);
                }
            }
        }

        self.revision += 1;
        debug!("Collection replaced with {} items", self.items.len());
    }

    /// Set the status of a known video; returns whether an entry was updated
    ///
    /// Unknown ids are ignored: the video is not fabricated locally.
    pub fn patch(&mut self, id: Uuid, status: MediaStatus) -> bool {
        let Some(&position) = self.index.get(&id) else {
            debug!("Ignoring status {} for unknown video {}", status, id);
            return false;
        };

        self.items[position].status = status;
        self.revision += 1;
        true
    }

    /// Route a pushed status change into [`patch`](Self::patch)
    pub fn apply(&mut self, event: &StatusEvent) -> bool {
        self.patch(event.id, event.status)
    }

    /// Delete a video if present
    pub fn remove(&mut self, id: Uuid) -> Option<MediaItem> {
        let position = self.index.remove(&id)?;
        let removed = self.items.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        self.revision += 1;
        Some(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<&MediaItem> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Videos in server order
    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Counter bumped by every call that changed the collection
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
