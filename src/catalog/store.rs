use crate::catalog::serializer;
use crate::error::{CatalogError, Result};
use crate::types::{ImageSlot, Product};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Listing pagination metadata, 1-based pages.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current: usize,
    pub total: usize,
    pub limit: usize,
}

/// Aggregate image-coverage counts over the whole catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub full: usize,
    pub partial: usize,
    pub empty: usize,
}

/// The in-memory catalog, source of truth for the running process.
///
/// Owned once at startup and shared with the request handlers; every slot
/// mutation rewrites the CSV backup before returning. A backup write failure
/// is logged and the in-memory state stays authoritative.
pub struct CatalogStore {
    products: Mutex<Vec<Product>>,
    backup_path: PathBuf,
}

impl CatalogStore {
    pub fn new(products: Vec<Product>, backup_path: PathBuf) -> Self {
        Self { products: Mutex::new(products), backup_path }
    }

    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a single product by id.
    pub fn get(&self, id: &str) -> Option<Product> {
        self.products.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    /// One page of products plus pagination metadata.
    pub fn page(&self, page: usize, limit: usize) -> (Vec<Product>, Pagination) {
        let products = self.products.lock().unwrap();
        let page = page.max(1);
        let limit = limit.max(1);
        let start = (page - 1) * limit;
        let slice = if start >= products.len() {
            Vec::new()
        } else {
            products[start..(start + limit).min(products.len())].to_vec()
        };
        let pagination = Pagination {
            current: page,
            total: products.len().div_ceil(limit),
            limit,
        };
        (slice, pagination)
    }

    pub fn stats(&self) -> Stats {
        let products = self.products.lock().unwrap();
        let mut stats = Stats { total: products.len(), full: 0, partial: 0, empty: 0 };
        for product in products.iter() {
            match product.image_count() {
                4 => stats.full += 1,
                0 => stats.empty += 1,
                _ => stats.partial += 1,
            }
        }
        stats
    }

    /// Replaces one slot and rewrites the backup. Returns the superseded slot.
    pub fn set_slot(&self, id: &str, index: usize, slot: ImageSlot) -> Result<ImageSlot> {
        let old = {
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| CatalogError::invalid(format!("unknown product '{id}'")))?;
            std::mem::replace(&mut product.images[index], slot)
        };
        self.persist();
        Ok(old)
    }

    /// Empties one slot and rewrites the backup. Returns the cleared slot.
    ///
    /// Clearing an already-empty slot is an `InvalidRequest` and leaves the
    /// catalog untouched.
    pub fn clear_slot(&self, id: &str, index: usize) -> Result<ImageSlot> {
        let old = {
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| CatalogError::invalid(format!("unknown product '{id}'")))?;
            if !product.images[index].is_filled() {
                return Err(CatalogError::invalid(format!("slot {index} is already empty")));
            }
            std::mem::replace(&mut product.images[index], ImageSlot::Empty)
        };
        self.persist();
        Ok(old)
    }

    /// Rewrites the backup CSV from the current in-memory state, best-effort.
    pub fn persist(&self) {
        let products = self.products.lock().unwrap().clone();
        if let Err(e) = serializer::write_backup(&products, &self.backup_path) {
            warn!("Failed to write backup CSV: {e}");
        }
    }

    pub fn backup_path(&self) -> &PathBuf {
        &self.backup_path
    }
}
