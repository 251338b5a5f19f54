//! Async item store trait and its in-memory implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use listkeep_core::{ItemId, ListkeepResult, PageRequest, StorageError, UserId};
use tokio::sync::RwLock;

use crate::item::StoredItem;

/// Async persistence for one item kind.
///
/// Implementations must be safe to call concurrently. The in-memory store
/// below is the only one shipped; a database-backed store plugs in here.
#[async_trait]
pub trait ItemStore<T: StoredItem>: Send + Sync {
    /// Get an item by id.
    async fn get_by_id(&self, id: ItemId) -> ListkeepResult<Option<T>>;

    /// Insert a new item under a freshly assigned id.
    ///
    /// Fails with `StorageError::Rejected` when the draft does not validate.
    async fn create(&self, owner_id: UserId, draft: T::Draft) -> ListkeepResult<T>;

    /// Apply a change to an existing item. `Ok(None)` when the id is unknown.
    async fn update(&self, id: ItemId, change: T::Change) -> ListkeepResult<Option<T>>;

    /// Remove an item. `false` when the id is unknown or the store refuses.
    async fn delete(&self, id: ItemId) -> ListkeepResult<bool>;

    /// One page of matching items in store order, plus the total match count.
    async fn list(&self, page: PageRequest, filter: &T::Filter) -> ListkeepResult<(Vec<T>, u64)>;

    /// Every matching item in store order.
    async fn find(&self, filter: &T::Filter) -> ListkeepResult<Vec<T>>;

    /// Number of stored items.
    async fn count(&self) -> ListkeepResult<u64>;
}

#[derive(Debug)]
struct StoreInner<T> {
    items: BTreeMap<ItemId, T>,
    protected: BTreeSet<ItemId>,
}

/// In-memory item store.
///
/// Items live in a `BTreeMap` keyed by id. Ids come from a monotonically
/// increasing counter, so map order is creation order.
#[derive(Debug)]
pub struct InMemoryItemStore<T> {
    inner: RwLock<StoreInner<T>>,
    next_id: AtomicI64,
}

impl<T: StoredItem> Default for InMemoryItemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoredItem> InMemoryItemStore<T> {
    /// Create an empty store whose first id is 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                items: BTreeMap::new(),
                protected: BTreeSet::new(),
            }),
            next_id: AtomicI64::new(1),
        }
    }

    /// Mark an id as undeletable. Deleting it afterwards returns `false`.
    pub async fn protect(&self, id: ItemId) {
        self.inner.write().await.protected.insert(id);
    }

    /// Drop every item and protection. Ids keep counting up.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.items.clear();
        inner.protected.clear();
    }

    fn allocate_id(&self) -> ItemId {
        ItemId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn matching(inner: &StoreInner<T>, filter: &T::Filter) -> Vec<T> {
        let mut items: Vec<T> = inner
            .items
            .values()
            .filter(|item| item.matches(filter))
            .cloned()
            .collect();
        T::arrange(&mut items, filter);
        items
    }
}

#[async_trait]
impl<T: StoredItem> ItemStore<T> for InMemoryItemStore<T> {
    async fn get_by_id(&self, id: ItemId) -> ListkeepResult<Option<T>> {
        Ok(self.inner.read().await.items.get(&id).cloned())
    }

    async fn create(&self, owner_id: UserId, draft: T::Draft) -> ListkeepResult<T> {
        T::validate_draft(&draft).map_err(|e| StorageError::Rejected {
            kind: T::kind(),
            reason: e.to_string(),
        })?;

        let id = self.allocate_id();
        let item = T::from_draft(id, owner_id, draft, Utc::now());
        self.inner.write().await.items.insert(id, item.clone());

        tracing::debug!(kind = %T::kind(), id = %id, "item created");
        Ok(item)
    }

    async fn update(&self, id: ItemId, change: T::Change) -> ListkeepResult<Option<T>> {
        T::validate_change(&change).map_err(|e| StorageError::Rejected {
            kind: T::kind(),
            reason: e.to_string(),
        })?;

        let mut inner = self.inner.write().await;
        let Some(item) = inner.items.get_mut(&id) else {
            return Ok(None);
        };
        item.apply_change(change, Utc::now());

        tracing::debug!(kind = %T::kind(), id = %id, "item updated");
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: ItemId) -> ListkeepResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.protected.contains(&id) {
            tracing::debug!(kind = %T::kind(), id = %id, "delete refused for protected item");
            return Ok(false);
        }
        let removed = inner.items.remove(&id).is_some();
        if removed {
            tracing::debug!(kind = %T::kind(), id = %id, "item deleted");
        }
        Ok(removed)
    }

    async fn list(&self, page: PageRequest, filter: &T::Filter) -> ListkeepResult<(Vec<T>, u64)> {
        let inner = self.inner.read().await;
        let matching = Self::matching(&inner, filter);
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        Ok((items, total))
    }

    async fn find(&self, filter: &T::Filter) -> ListkeepResult<Vec<T>> {
        let inner = self.inner.read().await;
        Ok(Self::matching(&inner, filter))
    }

    async fn count(&self) -> ListkeepResult<u64> {
        Ok(self.inner.read().await.items.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listkeep_core::{
        ListkeepError, Product, ProductDraft, ProductFilter, SortOrder, TodoChange, TodoDraft,
        TodoFilter, TodoItem,
    };

    fn draft(text: &str) -> TodoDraft {
        TodoDraft {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<TodoItem>::new();
        let first = store.create(UserId::new("alice"), draft("one")).await?;
        let second = store.create(UserId::new("alice"), draft("two")).await?;

        assert_eq!(first.id, ItemId::new(1));
        assert_eq!(second.id, ItemId::new(2));
        assert_eq!(store.count().await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let store = InMemoryItemStore::<TodoItem>::new();
        let result = store.create(UserId::new("alice"), draft("")).await;

        assert!(matches!(
            result,
            Err(ListkeepError::Storage(StorageError::Rejected { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<TodoItem>::new();
        let updated = store
            .update(ItemId::new(99), TodoChange { is_completed: true })
            .await?;
        assert!(updated.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_applies_change() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<TodoItem>::new();
        let created = store.create(UserId::new("alice"), draft("one")).await?;

        let updated = store
            .update(created.id, TodoChange { is_completed: true })
            .await?;
        assert!(updated.is_some_and(|t| t.is_completed));

        let fetched = store.get_by_id(created.id).await?;
        assert!(fetched.is_some_and(|t| t.is_completed));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_semantics() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<TodoItem>::new();
        let a = store.create(UserId::new("alice"), draft("a")).await?;
        let b = store.create(UserId::new("alice"), draft("b")).await?;
        store.protect(b.id).await;

        assert!(store.delete(a.id).await?);
        assert!(!store.delete(a.id).await?);
        assert!(!store.delete(b.id).await?);
        assert!(store.get_by_id(b.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_pages_filtered_items() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<TodoItem>::new();
        for i in 1..=6 {
            let todo = store
                .create(UserId::new("alice"), draft(&format!("todo {}", i)))
                .await?;
            if i % 2 == 0 {
                store
                    .update(todo.id, TodoChange { is_completed: true })
                    .await?;
            }
        }

        let page = PageRequest::new(1, 2)?;
        let (items, total) = store.list(page, &TodoFilter::completed(true)).await?;
        assert_eq!(total, 3);
        let ids: Vec<i64> = items.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![2, 4]);

        let (rest, _) = store
            .list(PageRequest::new(2, 2)?, &TodoFilter::completed(true))
            .await?;
        assert_eq!(rest.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_products_by_name_and_price_order() -> ListkeepResult<()> {
        let store = InMemoryItemStore::<Product>::new();
        for (name, price) in [("Desk lamp", 30.0), ("Floor lamp", 10.0), ("Chair", 20.0)] {
            store
                .create(
                    UserId::anonymous(),
                    ProductDraft {
                        name: name.to_string(),
                        price,
                    },
                )
                .await?;
        }

        let lamps = store.find(&ProductFilter::named("lamp")).await?;
        assert_eq!(lamps.len(), 2);

        let sorted = store.find(&ProductFilter::sorted(SortOrder::Asc)).await?;
        let names: Vec<&str> = sorted.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Floor lamp", "Chair", "Desk lamp"]);
        Ok(())
    }
}
