//! Persisted list preferences
//!
//! Sort key, sort direction and status filter survive restarts through the
//! host [`SettingsStore`]. Values are stored as their plain string names.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use bridge_traits::storage::SettingsStore;

use crate::error::Result;
use crate::models::Bookshelf;
use crate::sort::{SortDirection, SortKey};
use crate::view::StatusFilter;

pub const SORT_KEY_SETTING: &str = "sort";
pub const SORT_DIRECTION_SETTING: &str = "sortDirection";
pub const STATUS_FILTER_SETTING: &str = "readStatusFilter";

/// User-selected ordering and filtering of a book list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub status_filter: StatusFilter,
}

impl ViewPreferences {
    pub fn new(sort_key: SortKey, sort_direction: SortDirection, status_filter: StatusFilter) -> Self {
        Self {
            sort_key,
            sort_direction,
            status_filter,
        }
    }

    /// Read preferences from the store
    ///
    /// Missing or unrecognised values fall back to their defaults. Only
    /// store failures are errors.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self> {
        let sort_key = store.get_string(SORT_KEY_SETTING).await?;
        let sort_direction = store.get_string(SORT_DIRECTION_SETTING).await?;
        let status_filter = store.get_string(STATUS_FILTER_SETTING).await?;

        let preferences = Self {
            sort_key: parse_or_default(SORT_KEY_SETTING, sort_key.as_deref()),
            sort_direction: parse_or_default(SORT_DIRECTION_SETTING, sort_direction.as_deref()),
            status_filter: parse_or_default(STATUS_FILTER_SETTING, status_filter.as_deref()),
        };

        debug!(preferences = ?preferences, "Loaded view preferences");
        Ok(preferences)
    }

    /// Write all three preferences to the store
    pub async fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store
            .set_string(SORT_KEY_SETTING, self.sort_key.as_str())
            .await?;
        store
            .set_string(SORT_DIRECTION_SETTING, self.sort_direction.as_str())
            .await?;
        store
            .set_string(STATUS_FILTER_SETTING, self.status_filter.as_str())
            .await?;
        Ok(())
    }

    /// Defaults seeded with a bookshelf's own ordering
    pub fn for_bookshelf(shelf: &Bookshelf) -> Self {
        Self {
            sort_key: parse_or_default(SORT_KEY_SETTING, shelf.sort_key.as_deref()),
            sort_direction: parse_or_default(SORT_DIRECTION_SETTING, shelf.sort_direction.as_deref()),
            status_filter: StatusFilter::All,
        }
    }
}

fn parse_or_default<T>(setting: &str, raw: Option<&str>) -> T
where
    T: FromStr + Default,
{
    match raw {
        None => T::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(setting = setting, value = value, "Unrecognised preference value, using default");
            T::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use crate::models::BookshelfId;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        pub Store {}

        #[async_trait]
        impl SettingsStore for Store {
            async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()>;
            async fn get_string(&self, key: &str) -> BridgeResult<Option<String>>;
            async fn delete(&self, key: &str) -> BridgeResult<()>;
            async fn has_key(&self, key: &str) -> BridgeResult<bool>;
            async fn list_keys(&self) -> BridgeResult<Vec<String>>;
            async fn clear_all(&self) -> BridgeResult<()>;
        }
    }

    fn shelf(sort_key: Option<&str>, sort_direction: Option<&str>) -> Bookshelf {
        Bookshelf {
            id: BookshelfId(1),
            title: "Favourites".to_string(),
            description: String::new(),
            sort_key: sort_key.map(str::to_string),
            sort_direction: sort_direction.map(str::to_string),
            books: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_load_reads_all_keys() {
        let mut store = MockStore::new();
        store
            .expect_get_string()
            .with(eq(SORT_KEY_SETTING))
            .returning(|_| Ok(Some("rating".to_string())));
        store
            .expect_get_string()
            .with(eq(SORT_DIRECTION_SETTING))
            .returning(|_| Ok(Some("descending".to_string())));
        store
            .expect_get_string()
            .with(eq(STATUS_FILTER_SETTING))
            .returning(|_| Ok(Some("reading".to_string())));

        let prefs = ViewPreferences::load(&store).await.unwrap();
        assert_eq!(
            prefs,
            ViewPreferences::new(SortKey::Rating, SortDirection::Descending, StatusFilter::Reading)
        );
    }

    #[tokio::test]
    async fn test_load_falls_back_on_missing_and_unknown() {
        let mut store = MockStore::new();
        store
            .expect_get_string()
            .with(eq(SORT_KEY_SETTING))
            .returning(|_| Ok(Some("shoe_size".to_string())));
        store
            .expect_get_string()
            .with(eq(SORT_DIRECTION_SETTING))
            .returning(|_| Ok(None));
        store
            .expect_get_string()
            .with(eq(STATUS_FILTER_SETTING))
            .returning(|_| Ok(Some("read".to_string())));

        let prefs = ViewPreferences::load(&store).await.unwrap();
        assert_eq!(prefs.sort_key, SortKey::Id);
        assert_eq!(prefs.sort_direction, SortDirection::Ascending);
        assert_eq!(prefs.status_filter, StatusFilter::Read);
    }

    #[tokio::test]
    async fn test_load_propagates_store_failure() {
        let mut store = MockStore::new();
        store
            .expect_get_string()
            .returning(|_| Err(BridgeError::NotAvailable("storage disabled".to_string())));

        assert!(ViewPreferences::load(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_save_writes_string_names() {
        let mut store = MockStore::new();
        store
            .expect_set_string()
            .with(eq(SORT_KEY_SETTING), eq("read_end_date"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_string()
            .with(eq(SORT_DIRECTION_SETTING), eq("descending"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_string()
            .with(eq(STATUS_FILTER_SETTING), eq("not_read"))
            .times(1)
            .returning(|_, _| Ok(()));

        let prefs = ViewPreferences::new(
            SortKey::ReadEndDate,
            SortDirection::Descending,
            StatusFilter::NotRead,
        );
        prefs.save(&store).await.unwrap();
    }

    #[test]
    fn test_for_bookshelf() {
        let prefs = ViewPreferences::for_bookshelf(&shelf(Some("author"), Some("descending")));
        assert_eq!(prefs.sort_key, SortKey::Author);
        assert_eq!(prefs.sort_direction, SortDirection::Descending);
        assert_eq!(prefs.status_filter, StatusFilter::All);

        let fallback = ViewPreferences::for_bookshelf(&shelf(Some("colour"), None));
        assert_eq!(fallback, ViewPreferences::default());
    }
}
