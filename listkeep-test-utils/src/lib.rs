//! Listkeep Test Utilities
//!
//! Shared test infrastructure for the listkeep workspace:
//! - Proptest generators for identities and drafts
//! - Seeded stores and drafts for common scenarios
//! - Call-counting fakes for the store and the recompute cost
//! - Assertions over the error taxonomy

pub use listkeep_core::{
    ItemId, ItemKind, ListkeepError, ListkeepResult, Product, ProductDraft, RetrievalError,
    StorageError, TodoDraft, TodoItem, UserId, UserInfo,
};
pub use listkeep_storage::{InMemoryItemStore, ItemStore, StoredItem};

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use listkeep_core::PageRequest;
use listkeep_storage::SimulatedLatency;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for listkeep types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a user id made of lowercase letters, digits and dashes.
    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        "[a-z][a-z0-9-]{0,23}".prop_map(UserId::new)
    }

    /// Generate a user with optional email and up to three roles.
    pub fn arb_user_info() -> impl Strategy<Value = UserInfo> {
        (
            arb_user_id(),
            proptest::option::of("[a-z]{1,10}@example\\.com"),
            proptest::collection::vec("[a-z]{3,8}", 0..3),
        )
            .prop_map(|(id, email, roles)| {
                let user = UserInfo::new(id).with_roles(roles);
                match email {
                    Some(email) => user.with_email(email),
                    None => user,
                }
            })
    }

    /// Generate a todo draft that passes validation.
    pub fn arb_todo_draft() -> impl Strategy<Value = TodoDraft> {
        "[A-Za-z][A-Za-z0-9 ]{0,40}".prop_map(|text| TodoDraft { text })
    }

    /// Generate a product draft that passes validation.
    pub fn arb_product_draft() -> impl Strategy<Value = ProductDraft> {
        ("[A-Za-z][A-Za-z0-9 ]{0,30}", 0u32..100_000)
            .prop_map(|(name, cents)| ProductDraft {
                name,
                price: f64::from(cents) / 100.0,
            })
    }

    /// Generate completion flags for a seeded todo collection.
    pub fn arb_completion_flags(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 0..max_len)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built drafts and seeded stores.

    use super::*;

    /// Owner recorded on seeded items.
    pub const SEED_OWNER: &str = "seed-owner";

    pub fn todo_draft(text: &str) -> TodoDraft {
        TodoDraft {
            text: text.to_string(),
        }
    }

    pub fn product_draft(name: &str, price: f64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price,
        }
    }

    /// A store holding `count` todos with ids `1..=count`, texts `todo N`.
    pub async fn seeded_todo_store(
        count: usize,
    ) -> ListkeepResult<Arc<InMemoryItemStore<TodoItem>>> {
        let flags = vec![false; count];
        seeded_todo_store_with_flags(&flags).await
    }

    /// A store holding one todo per flag; todo `i + 1` is completed when
    /// `flags[i]` is set.
    pub async fn seeded_todo_store_with_flags(
        flags: &[bool],
    ) -> ListkeepResult<Arc<InMemoryItemStore<TodoItem>>> {
        let store = Arc::new(InMemoryItemStore::<TodoItem>::new());
        for (i, completed) in flags.iter().enumerate() {
            let todo = store
                .create(UserId::new(SEED_OWNER), todo_draft(&format!("todo {}", i + 1)))
                .await?;
            if *completed {
                store
                    .update(todo.id, listkeep_core::TodoChange { is_completed: true })
                    .await?;
            }
        }
        Ok(store)
    }

    /// A store holding one product per `(name, price)` pair, in order.
    pub async fn seeded_product_store(
        products: &[(&str, f64)],
    ) -> ListkeepResult<Arc<InMemoryItemStore<Product>>> {
        let store = Arc::new(InMemoryItemStore::<Product>::new());
        for (name, price) in products {
            store
                .create(UserId::new(SEED_OWNER), product_draft(name, *price))
                .await?;
        }
        Ok(store)
    }

    pub fn user(id: &str) -> UserInfo {
        UserInfo::new(id)
    }
}

// ============================================================================
// FAKES
// ============================================================================

/// Per-operation call counts recorded by [`CountingStore`].
#[derive(Debug, Default)]
pub struct StoreCalls {
    pub get_by_id: AtomicU64,
    pub create: AtomicU64,
    pub update: AtomicU64,
    pub delete: AtomicU64,
    pub list: AtomicU64,
    pub find: AtomicU64,
}

impl StoreCalls {
    pub fn get_by_id(&self) -> u64 {
        self.get_by_id.load(Ordering::SeqCst)
    }

    pub fn list(&self) -> u64 {
        self.list.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        [
            &self.get_by_id,
            &self.create,
            &self.update,
            &self.delete,
            &self.list,
            &self.find,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

/// An [`ItemStore`] wrapper that counts calls before delegating.
pub struct CountingStore<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    inner: Arc<S>,
    calls: Arc<StoreCalls>,
    _item: PhantomData<fn() -> T>,
}

impl<T, S> CountingStore<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            calls: Arc::new(StoreCalls::default()),
            _item: PhantomData,
        }
    }

    /// Shared handle to the counters, valid after the store is moved.
    pub fn calls(&self) -> Arc<StoreCalls> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl<T, S> ItemStore<T> for CountingStore<T, S>
where
    T: StoredItem,
    S: ItemStore<T> + ?Sized,
{
    async fn get_by_id(&self, id: ItemId) -> ListkeepResult<Option<T>> {
        self.calls.get_by_id.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn create(&self, owner_id: UserId, draft: T::Draft) -> ListkeepResult<T> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.inner.create(owner_id, draft).await
    }

    async fn update(&self, id: ItemId, change: T::Change) -> ListkeepResult<Option<T>> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, change).await
    }

    async fn delete(&self, id: ItemId) -> ListkeepResult<bool> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    async fn list(&self, page: PageRequest, filter: &T::Filter) -> ListkeepResult<(Vec<T>, u64)> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.inner.list(page, filter).await
    }

    async fn find(&self, filter: &T::Filter) -> ListkeepResult<Vec<T>> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        self.inner.find(filter).await
    }

    async fn count(&self) -> ListkeepResult<u64> {
        self.inner.count().await
    }
}

/// A fixed recompute cost that counts how often it was consulted.
///
/// The orchestrator consults the cost model exactly once per miss, so the
/// count is the number of misses that reached the recompute step.
#[derive(Debug, Default)]
pub struct CountingLatency {
    delay: Duration,
    calls: AtomicU64,
}

impl CountingLatency {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimulatedLatency for CountingLatency {
    fn delay_for(&self, _kind: ItemKind) -> Duration {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.delay
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over the listkeep error taxonomy.

    use super::*;

    /// Assert that a result is a cancelled retrieval.
    #[track_caller]
    pub fn assert_cancelled<T: std::fmt::Debug>(result: &ListkeepResult<T>) {
        match result {
            Err(ListkeepError::Retrieval(RetrievalError::Cancelled { .. })) => {}
            other => panic!("Expected Cancelled error, got: {:?}", other),
        }
    }

    /// Assert that a result is a store rejection for `kind`.
    #[track_caller]
    pub fn assert_rejected<T: std::fmt::Debug>(result: &ListkeepResult<T>, kind: ItemKind) {
        match result {
            Err(ListkeepError::Storage(StorageError::Rejected { kind: k, .. })) => {
                assert_eq!(*k, kind, "Wrong item kind in Rejected error");
            }
            other => panic!("Expected Rejected error for {}, got: {:?}", kind, other),
        }
    }
}
