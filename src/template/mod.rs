//! Template storage.
//!
//! A template is an immutable square patch captured from one frame, kept at
//! full resolution and at the matching resolution. The store holds at most
//! `max_templates` of them; matching is enabled only when the store is full.

use crate::image::OwnedImage;
use crate::matcher::zncc::ZnccPlan;
use crate::util::{TrackError, TrackResult};

mod capture;

pub use capture::capture_template;

/// Immutable captured template with both resolutions.
///
/// Both representations derive from the same capture instant; the scaled one
/// carries its correlation plan so per-tick matching does not recompute
/// template statistics.
pub struct Template {
    full: OwnedImage,
    scaled: OwnedImage,
    plan: ZnccPlan,
}

impl Template {
    pub(crate) fn new(full: OwnedImage, scaled: OwnedImage) -> Self {
        let plan = ZnccPlan::new(scaled.view());
        Self { full, scaled, plan }
    }

    /// Full-resolution representation.
    pub fn full(&self) -> &OwnedImage {
        &self.full
    }

    /// Downscaled representation used for matching.
    pub fn scaled(&self) -> &OwnedImage {
        &self.scaled
    }

    /// Correlation plan for the scaled representation.
    pub fn plan(&self) -> &ZnccPlan {
        &self.plan
    }
}

/// Ordered sequence of captured templates with a hard capacity.
///
/// Mutated only by capture (append) and recalibration (clear-all). Appends
/// past the capacity fail; the unbounded-growth behavior seen in one
/// production variant is treated as a bug.
pub struct TemplateStore {
    templates: Vec<Template>,
    capacity: usize,
}

impl TemplateStore {
    /// Creates an empty store with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            templates: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no templates are stored.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Maximum number of templates.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when the store is full and matching may run.
    pub fn is_armed(&self) -> bool {
        self.templates.len() == self.capacity
    }

    /// Stored templates in insertion order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Appends a template, returning the new count.
    pub fn push(&mut self, template: Template) -> TrackResult<usize> {
        if self.templates.len() >= self.capacity {
            return Err(TrackError::StoreFull {
                capacity: self.capacity,
            });
        }
        self.templates.push(template);
        Ok(self.templates.len())
    }

    /// Releases all templates. Idempotent.
    pub fn clear(&mut self) {
        self.templates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Template, TemplateStore};
    use crate::image::OwnedImage;
    use crate::util::TrackError;

    fn dummy_template(side: usize) -> Template {
        let full = OwnedImage::new(vec![7u8; side * side], side, side).unwrap();
        let half = side / 2;
        let scaled = OwnedImage::new(vec![7u8; half * half], half, half).unwrap();
        Template::new(full, scaled)
    }

    #[test]
    fn store_arms_only_when_full() {
        let mut store = TemplateStore::new(2);
        assert!(!store.is_armed());
        store.push(dummy_template(8)).unwrap();
        assert!(!store.is_armed());
        store.push(dummy_template(8)).unwrap();
        assert!(store.is_armed());
    }

    #[test]
    fn push_past_capacity_fails() {
        let mut store = TemplateStore::new(2);
        store.push(dummy_template(8)).unwrap();
        store.push(dummy_template(8)).unwrap();
        let err = store.push(dummy_template(8)).err().unwrap();
        assert_eq!(err, TrackError::StoreFull { capacity: 2 });
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = TemplateStore::new(2);
        store.push(dummy_template(8)).unwrap();
        store.clear();
        store.clear();
        assert!(store.is_empty());
    }
}
