//! Behavioural tests for single-item retrieval through the read-through cache.
//!
//! Time is paused in every test, so the recompute delay and the TTL are
//! driven by tokio's virtual clock instead of the wall clock.

use std::sync::Arc;
use std::time::Duration;

use listkeep_core::{
    CacheKeyMode, ItemId, ItemKind, ListkeepResult, Product, ProductDraft, RetrievalConfig,
    TodoChange, TodoDraft, TodoItem, UserId, UserInfo,
};
use listkeep_storage::{
    CacheBackend, CacheKey, CachedItem, InMemoryCacheBackend, InMemoryItemStore, ItemStore,
    RetrievalOrchestrator,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type SharedCache = InMemoryCacheBackend<CachedItem>;
type TodoStore = InMemoryItemStore<TodoItem>;
type TodoOrchestrator = RetrievalOrchestrator<TodoItem, TodoStore, SharedCache>;
type TestResult = Result<(), Box<dyn std::error::Error>>;

const DELAY: Duration = Duration::from_secs(3);
const TTL: Duration = Duration::from_secs(30);

// ============================================================================
// FIXTURES
// ============================================================================

struct Harness {
    orchestrator: TodoOrchestrator,
    store: Arc<TodoStore>,
    cache: Arc<SharedCache>,
    items: Vec<TodoItem>,
}

async fn harness(mode: CacheKeyMode, count: usize) -> ListkeepResult<Harness> {
    let store = Arc::new(TodoStore::new());
    let mut items = Vec::with_capacity(count);
    for i in 1..=count {
        let draft = TodoDraft {
            text: format!("todo {}", i),
        };
        items.push(store.create(UserId::new("owner"), draft).await?);
    }

    let cache = Arc::new(SharedCache::new());
    let config = RetrievalConfig::default().with_key_mode(mode);
    let orchestrator = RetrievalOrchestrator::new(Arc::clone(&store), Arc::clone(&cache), config);

    Ok(Harness {
        orchestrator,
        store,
        cache,
        items,
    })
}

fn alice() -> UserInfo {
    UserInfo::new("alice")
}

// ============================================================================
// HIT / MISS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn miss_pays_delay_and_hit_returns_immediately() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();

    let started = Instant::now();
    let first = h.orchestrator.get_item(id, &alice(), &token).await?;
    assert_eq!(started.elapsed(), DELAY);
    let first = first.map(|r| (r.was_cache_miss(), r.into_value()));
    assert_eq!(first, Some((true, h.items[0].clone())));

    let started = Instant::now();
    let second = h.orchestrator.get_item(id, &alice(), &token).await?;
    assert_eq!(started.elapsed(), Duration::ZERO);
    let second = second.map(|r| (r.was_cache_hit(), r.into_value()));
    assert_eq!(second, Some((true, h.items[0].clone())));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn miss_stores_the_store_result_under_the_user_key() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 2).await?;
    let id = h.items[1].id;

    h.orchestrator
        .get_item(id, &alice(), &CancellationToken::new())
        .await?;

    let cached = h.cache.try_get(&CacheKey::for_user(&alice().id)).await?;
    assert_eq!(cached, Some(CachedItem::Todo(h.items[1].clone())));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_miss_pays_the_delay() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();

    for user in ["alice", "bob", "carol"] {
        let started = Instant::now();
        h.orchestrator
            .get_item(id, &UserInfo::new(user), &token)
            .await?;
        assert_eq!(started.elapsed(), DELAY);
    }
    assert_eq!(h.cache.stats().await?.writes, 3);
    Ok(())
}

// ============================================================================
// EXPIRY
// ============================================================================

#[tokio::test(start_paused = true)]
async fn entry_expires_thirty_seconds_after_set() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();

    h.orchestrator.get_item(id, &alice(), &token).await?;

    tokio::time::advance(TTL - Duration::from_millis(1)).await;
    let hit = h.orchestrator.get_item(id, &alice(), &token).await?;
    assert!(hit.is_some_and(|r| r.was_cache_hit()));

    tokio::time::advance(Duration::from_millis(1)).await;
    let started = Instant::now();
    let miss = h.orchestrator.get_item(id, &alice(), &token).await?;
    assert!(miss.is_some_and(|r| r.was_cache_miss()));
    assert_eq!(started.elapsed(), DELAY);
    Ok(())
}

// ============================================================================
// KEYING
// ============================================================================

#[tokio::test(start_paused = true)]
async fn user_keyed_hit_returns_first_cached_item_for_another_id() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 2).await?;
    let token = CancellationToken::new();

    h.orchestrator
        .get_item(h.items[0].id, &alice(), &token)
        .await?;

    let read = h
        .orchestrator
        .get_item(h.items[1].id, &alice(), &token)
        .await?;
    let read = read.map(|r| (r.was_cache_hit(), r.into_value().id));
    assert_eq!(read, Some((true, h.items[0].id)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn item_keyed_reads_return_the_requested_item() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByItemId, 2).await?;
    let token = CancellationToken::new();

    h.orchestrator
        .get_item(h.items[0].id, &alice(), &token)
        .await?;
    let second = h
        .orchestrator
        .get_item(h.items[1].id, &alice(), &token)
        .await?;
    let second = second.map(|r| (r.was_cache_miss(), r.into_value().id));
    assert_eq!(second, Some((true, h.items[1].id)));

    // Another user shares the item-keyed entry.
    let shared = h
        .orchestrator
        .get_item(h.items[0].id, &UserInfo::new("bob"), &token)
        .await?;
    assert!(shared.is_some_and(|r| r.was_cache_hit()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn users_do_not_share_entries_when_keyed_by_user() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();

    h.orchestrator.get_item(id, &alice(), &token).await?;
    let bob = h
        .orchestrator
        .get_item(id, &UserInfo::new("bob"), &token)
        .await?;
    assert!(bob.is_some_and(|r| r.was_cache_miss()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hit_serves_cached_value_after_store_update() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();

    h.orchestrator.get_item(id, &alice(), &token).await?;
    h.store
        .update(id, TodoChange { is_completed: true })
        .await?;

    let read = h.orchestrator.get_item(id, &alice(), &token).await?;
    assert!(read.is_some_and(|r| r.was_cache_hit() && !r.value().is_completed));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hit_survives_store_delete_until_existence_check_fails() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 2).await?;
    let token = CancellationToken::new();

    h.orchestrator
        .get_item(h.items[0].id, &alice(), &token)
        .await?;
    assert!(h.store.delete(h.items[0].id).await?);

    // The deleted item still answers reads of other ids from the cache.
    let read = h
        .orchestrator
        .get_item(h.items[1].id, &alice(), &token)
        .await?;
    assert!(read.is_some_and(|r| r.value().id == h.items[0].id));

    // A read of the deleted id fails the existence check first.
    let gone = h
        .orchestrator
        .get_item(h.items[0].id, &alice(), &token)
        .await?;
    assert!(gone.is_none());
    Ok(())
}

// ============================================================================
// NOT FOUND
// ============================================================================

#[tokio::test(start_paused = true)]
async fn not_found_never_touches_the_cache() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;

    let started = Instant::now();
    let read = h
        .orchestrator
        .get_item(ItemId::new(404), &alice(), &CancellationToken::new())
        .await?;

    assert!(read.is_none());
    assert_eq!(started.elapsed(), Duration::ZERO);
    let stats = h.cache.stats().await?;
    assert_eq!(stats.hits + stats.misses, 0);
    assert_eq!(stats.writes, 0);
    assert_eq!(stats.entry_count, 0);
    Ok(())
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_misses_each_return_their_own_item() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 2).await?;
    let token = CancellationToken::new();
    let user = alice();

    let (a, b) = tokio::join!(
        h.orchestrator.get_item(h.items[0].id, &user, &token),
        h.orchestrator.get_item(h.items[1].id, &user, &token),
    );

    let a = a?.map(|r| (r.was_cache_miss(), r.into_value().id));
    let b = b?.map(|r| (r.was_cache_miss(), r.into_value().id));
    assert_eq!(a, Some((true, h.items[0].id)));
    assert_eq!(b, Some((true, h.items[1].id)));

    // Last writer wins; the entry holds one of the two.
    let cached = h.cache.try_get(&CacheKey::for_user(&user.id)).await?;
    let cached_id = cached.map(|c| c.item_id());
    assert!(cached_id == Some(h.items[0].id) || cached_id == Some(h.items[1].id));
    assert_eq!(h.cache.stats().await?.writes, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn concurrent_spawned_reads_share_one_cache() -> TestResult {
    let h = harness(CacheKeyMode::ByItemId, 4).await?;
    let orchestrator = Arc::new(h.orchestrator);

    let mut handles = Vec::new();
    for (i, item) in h.items.iter().enumerate() {
        let orchestrator = Arc::clone(&orchestrator);
        let id = item.id;
        handles.push(tokio::spawn(async move {
            let user = UserInfo::new(format!("user-{}", i));
            orchestrator
                .get_item(id, &user, &CancellationToken::new())
                .await
        }));
    }

    for (handle, item) in handles.into_iter().zip(&h.items) {
        let read = handle.await??;
        assert_eq!(read.map(|r| r.into_value().id), Some(item.id));
    }
    assert_eq!(h.cache.len(), 4);
    Ok(())
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cancellation_during_delay_leaves_no_entry() -> TestResult {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;
    let token = CancellationToken::new();
    let orchestrator = h.orchestrator.clone();

    let pending = {
        let token = token.clone();
        tokio::spawn(async move { orchestrator.get_item(id, &alice(), &token).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();

    let result = pending.await?;
    assert!(result.is_err_and(|e| e.is_cancelled()));

    let stats = h.cache.stats().await?;
    assert_eq!(stats.writes, 0);
    assert_eq!(
        h.cache.try_get(&CacheKey::for_user(&alice().id)).await?,
        None
    );

    // The next read is a plain miss.
    let next = h
        .orchestrator
        .get_item(id, &alice(), &CancellationToken::new())
        .await?;
    assert!(next.is_some_and(|r| r.was_cache_miss()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timeout_drop_leaves_no_entry() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByUser, 1).await?;
    let id = h.items[0].id;

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        h.orchestrator
            .get_item(id, &alice(), &CancellationToken::new()),
    )
    .await;
    assert!(outcome.is_err());

    tokio::time::advance(DELAY).await;
    assert_eq!(h.cache.stats().await?.writes, 0);
    assert!(h.cache.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_does_not_disturb_existing_entry() -> ListkeepResult<()> {
    let h = harness(CacheKeyMode::ByItemId, 2).await?;
    let token = CancellationToken::new();

    h.orchestrator
        .get_item(h.items[0].id, &alice(), &token)
        .await?;

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let result = h
        .orchestrator
        .get_item(h.items[1].id, &alice(), &cancelled)
        .await;
    assert!(result.is_err_and(|e| e.is_cancelled()));

    assert_eq!(h.cache.len(), 1);
    assert_eq!(
        h.cache
            .try_get(&CacheKey::for_item(ItemKind::Todo, h.items[0].id))
            .await?
            .map(|c| c.item_id()),
        Some(h.items[0].id)
    );
    Ok(())
}

// ============================================================================
// SHARED CACHE ACROSS KINDS
// ============================================================================

struct MixedHarness {
    todos: TodoOrchestrator,
    products: RetrievalOrchestrator<Product, InMemoryItemStore<Product>, SharedCache>,
    cache: Arc<SharedCache>,
    todo_ids: Vec<ItemId>,
    lamp: ItemId,
}

async fn mixed(mode: CacheKeyMode) -> ListkeepResult<MixedHarness> {
    let todo_store = Arc::new(TodoStore::new());
    let mut todo_ids = Vec::new();
    for text in ["first", "second"] {
        let draft = TodoDraft {
            text: text.to_string(),
        };
        todo_ids.push(todo_store.create(UserId::new("owner"), draft).await?.id);
    }

    let product_store = Arc::new(InMemoryItemStore::<Product>::new());
    let lamp = product_store
        .create(
            UserId::anonymous(),
            ProductDraft {
                name: "Lamp".to_string(),
                price: 12.5,
            },
        )
        .await?
        .id;

    let cache = Arc::new(SharedCache::new());
    let config = RetrievalConfig::default().with_key_mode(mode);
    Ok(MixedHarness {
        todos: RetrievalOrchestrator::new(todo_store, Arc::clone(&cache), config.clone()),
        products: RetrievalOrchestrator::new(product_store, Arc::clone(&cache), config),
        cache,
        todo_ids,
        lamp,
    })
}

#[tokio::test(start_paused = true)]
async fn a_product_read_replaces_the_users_cached_todo() -> ListkeepResult<()> {
    let h = mixed(CacheKeyMode::ByUser).await?;
    let token = CancellationToken::new();

    let todo = h.todos.get_item(h.todo_ids[0], &alice(), &token).await?;
    assert!(todo.is_some_and(|r| r.was_cache_miss()));

    let started = Instant::now();
    let product = h.products.get_item(h.lamp, &alice(), &token).await?;
    assert_eq!(started.elapsed(), DELAY);
    assert!(product.is_some_and(|r| r.was_cache_miss() && r.value().name == "Lamp"));

    // The product now owns alice's slot, so the next todo read recomputes
    // and gets the requested id instead of the first todo.
    let started = Instant::now();
    let todo = h.todos.get_item(h.todo_ids[1], &alice(), &token).await?;
    assert_eq!(started.elapsed(), DELAY);
    let todo = todo.map(|r| (r.was_cache_miss(), r.into_value().id));
    assert_eq!(todo, Some((true, h.todo_ids[1])));

    assert_eq!(h.cache.len(), 1);
    assert_eq!(
        h.cache
            .try_get(&CacheKey::for_user(&alice().id))
            .await?
            .map(|c| (c.kind(), c.item_id())),
        Some((ItemKind::Todo, h.todo_ids[1]))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn same_kind_hit_survives_other_users_product_reads() -> ListkeepResult<()> {
    let h = mixed(CacheKeyMode::ByUser).await?;
    let token = CancellationToken::new();

    h.todos.get_item(h.todo_ids[0], &alice(), &token).await?;
    h.products
        .get_item(h.lamp, &UserInfo::new("bob"), &token)
        .await?;

    let read = h.todos.get_item(h.todo_ids[0], &alice(), &token).await?;
    assert!(read.is_some_and(|r| r.was_cache_hit()));
    assert_eq!(h.cache.len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn item_keyed_entries_of_different_kinds_coexist() -> ListkeepResult<()> {
    let h = mixed(CacheKeyMode::ByItemId).await?;
    let token = CancellationToken::new();
    // Both kinds start their ids at 1.
    assert_eq!(h.todo_ids[0], h.lamp);

    h.todos.get_item(h.todo_ids[0], &alice(), &token).await?;
    h.products.get_item(h.lamp, &alice(), &token).await?;

    let todo = h.todos.get_item(h.todo_ids[0], &alice(), &token).await?;
    let product = h.products.get_item(h.lamp, &alice(), &token).await?;
    assert!(todo.is_some_and(|r| r.was_cache_hit()));
    assert!(product.is_some_and(|r| r.was_cache_hit()));
    assert_eq!(h.cache.len(), 2);
    Ok(())
}
