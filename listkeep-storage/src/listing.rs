//! Paginated listing straight from the store.

use std::marker::PhantomData;
use std::sync::Arc;

use listkeep_core::{ListkeepResult, PageRequest, PaginatedSlice};

use crate::item::StoredItem;
use crate::store::ItemStore;

/// Listing and pagination over one item kind.
///
/// Every call goes to the store and the result is recomputed each time.
/// Nothing here reads or writes the cache.
pub struct ListingService<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    store: Arc<S>,
    _item: PhantomData<fn() -> T>,
}

impl<T, S> ListingService<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _item: PhantomData,
        }
    }

    /// One page of matching items in store order.
    ///
    /// A page past the end is empty but still reports the full match count.
    pub async fn list(
        &self,
        page: PageRequest,
        filter: &T::Filter,
    ) -> ListkeepResult<PaginatedSlice<T>> {
        let (items, total) = self.store.list(page, filter).await?;
        tracing::debug!(
            kind = %T::kind(),
            page = page.page,
            page_size = page.page_size,
            returned = items.len(),
            total,
            "listed items"
        );
        Ok(PaginatedSlice::new(items, page, total))
    }

    /// Every matching item, unpaginated.
    pub async fn all(&self, filter: &T::Filter) -> ListkeepResult<Vec<T>> {
        self.store.find(filter).await
    }
}

impl<T, S> Clone for ListingService<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _item: PhantomData,
        }
    }
}
