//! Configuration for the sync engine.

use tsio_core::{ComponentFilter, Depth, Expansion};

/// Configuration for a [`crate::SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Name of the store collection, used in diagnostics and prompts.
    pub collection: String,
    /// Largest number of top-level entities written in one bulk submission.
    pub max_batch_size: usize,
    /// Slack kept below `max_batch_size` when an oversized write is split.
    pub batch_headroom: usize,
    /// Whether bulk submissions stop at the first rejected write.
    pub ordered_writes: bool,
    /// Whether reads stamp `LAST_USE` on every visited entity.
    pub touch_last_use: bool,
}

impl SyncConfig {
    /// Creates a configuration for the named collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            max_batch_size: 1000,
            batch_headroom: 2,
            ordered_writes: true,
            touch_last_use: true,
        }
    }

    /// Sets the largest bulk submission size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the split headroom.
    pub fn with_batch_headroom(mut self, headroom: usize) -> Self {
        self.batch_headroom = headroom;
        self
    }

    /// Sets whether bulk submissions are ordered.
    pub fn with_ordered_writes(mut self, ordered: bool) -> Self {
        self.ordered_writes = ordered;
        self
    }

    /// Sets whether reads stamp `LAST_USE`.
    pub fn with_touch_last_use(mut self, touch: bool) -> Self {
        self.touch_last_use = touch;
        self
    }

    /// Size of the first chunk when a write is split. Never zero.
    pub fn chunk_size(&self) -> usize {
        self.max_batch_size.saturating_sub(self.batch_headroom).max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("timeseries")
    }
}

/// Options for the read family.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Components to follow and how deep.
    pub expansion: Expansion,
    /// Attributes to fetch; `None` fetches every attribute.
    ///
    /// Only used by attribute reads.
    pub attributes: Option<Vec<String>>,
}

impl ReadOptions {
    /// Reads with the given expansion.
    pub fn new(expansion: Expansion) -> Self {
        Self {
            expansion,
            attributes: None,
        }
    }

    /// Restricts attribute reads to the named attributes.
    pub fn with_attributes<S: AsRef<str>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.attributes = Some(
            attributes
                .into_iter()
                .map(|a| a.as_ref().to_uppercase())
                .collect(),
        );
        self
    }

    /// Sets the depth bound.
    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.expansion.depth = depth;
        self
    }

    /// Sets the component filter.
    pub fn with_components(mut self, components: ComponentFilter) -> Self {
        self.expansion.components = components;
        self
    }
}

/// Options for the write family.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Components to follow and how deep.
    pub expansion: Expansion,
}

impl WriteOptions {
    /// Writes with the given expansion.
    pub fn new(expansion: Expansion) -> Self {
        Self { expansion }
    }
}

/// Options for removal.
///
/// By default no components are followed and the removal is not
/// confirmed, so nothing is deleted.
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Components to follow and how deep.
    pub expansion: Expansion,
    /// Whether the caller has confirmed the deletion.
    pub confirmed: bool,
}

impl RemoveOptions {
    /// Marks the removal as confirmed.
    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }

    /// Sets the expansion.
    pub fn with_expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            expansion: Expansion::new(ComponentFilter::None, Depth::Unbounded),
            confirmed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.collection, "timeseries");
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.chunk_size(), 998);
        assert!(config.ordered_writes);
        assert!(config.touch_last_use);

        let remove = RemoveOptions::default();
        assert!(!remove.confirmed);
        assert!(remove.expansion.components.is_none());

        let read = ReadOptions::default();
        assert_eq!(read.expansion.depth, Depth::Unbounded);
        assert_eq!(read.expansion.components, ComponentFilter::All);
    }

    #[test]
    fn builders() {
        let config = SyncConfig::new("bonds")
            .with_max_batch_size(10)
            .with_batch_headroom(20)
            .with_ordered_writes(false)
            .with_touch_last_use(false);
        assert_eq!(config.chunk_size(), 1);
        assert!(!config.ordered_writes);

        let read = ReadOptions::default()
            .with_attributes(["price", "Coupon"])
            .with_depth(Depth::Levels(2));
        assert_eq!(
            read.attributes,
            Some(vec!["PRICE".to_string(), "COUPON".to_string()])
        );
        assert_eq!(read.expansion.depth, Depth::Levels(2));
    }
}
