use super::SharedStore;
use crate::models::GridSize;
use crate::storage::KeyValueStore;

/// Grid density chosen for one page scope (`movies`, `anime`, ...).
///
/// Stored as a bare string under `{scope}GridSize`.
pub struct GridSizePreference {
    store: SharedStore,
    key: String,
    size: GridSize,
}

impl GridSizePreference {
    /// Read the stored size for `scope`. A missing, unreadable or unknown
    /// value yields `default`.
    pub fn load(store: SharedStore, scope: &str, default: GridSize) -> Self {
        let key = Self::storage_key(scope);
        let size = match store.get(&key) {
            Ok(Some(raw)) => GridSize::from_str_opt(&raw).unwrap_or_else(|| {
                tracing::warn!(key = %key, value = %raw, "Unknown grid size, using default");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to read grid size");
                default
            }
        };
        Self { store, key, size }
    }

    pub fn storage_key(scope: &str) -> String {
        format!("{scope}GridSize")
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn set(&mut self, size: GridSize) {
        self.size = size;
        if let Err(e) = self.store.set(&self.key, size.as_str()) {
            tracing::error!(key = %self.key, error = %e, "Failed to persist grid size");
        }
    }
}
