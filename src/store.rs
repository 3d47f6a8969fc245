use crate::config::PropertyKeys;
use crate::data;
use crate::error::{MapError, Result};
use crate::types::Dataset;
use std::io::Read;
use std::sync::Arc;

/// Owns the authoritative current snapshot of the district dataset.
///
/// Snapshots are shared as `Arc<Dataset>` and never mutated in place;
/// `replace` swaps the published reference as a whole, so anyone holding
/// the previous `Arc` keeps a fully consistent view.
#[derive(Debug)]
pub struct DistrictStore {
    keys: PropertyKeys,
    current: Option<Arc<Dataset>>,
}

impl DistrictStore {
    pub fn new(keys: PropertyKeys) -> Self {
        DistrictStore {
            keys,
            current: None,
        }
    }

    pub fn keys(&self) -> &PropertyKeys {
        &self.keys
    }

    /// Parses an input document and publishes it as the current snapshot.
    ///
    /// On `MalformedInput` nothing is published; a previously loaded
    /// snapshot (if any) stays current.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<Arc<Dataset>> {
        let dataset = Arc::new(data::parse_dataset(&self.keys, reader)?);
        self.current = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Latest snapshot, or `NotLoaded` before the first successful load.
    pub fn current(&self) -> Result<Arc<Dataset>> {
        self.current.clone().ok_or(MapError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Swaps in a new snapshot produced by `mutate::apply`. No validation:
    /// the producer already guarantees the dataset shape.
    pub fn replace(&mut self, next: Arc<Dataset>) {
        self.current = Some(next);
    }
}
