//! Shared application state for Axum routers.

use std::sync::Arc;

use listkeep_core::{Product, RetrievalConfig, TodoItem};
use listkeep_storage::{
    CachedItem, InMemoryCacheBackend, InMemoryItemStore, ItemStore, ListingService,
    RetrievalOrchestrator, SimulatedLatency, StoredItem,
};

use crate::auth::AuthConfig;
use crate::config::ApiConfig;

/// Store handle shared by the services of one item kind.
pub type DynItemStore<T> = dyn ItemStore<T>;

/// The one cache every item kind reads through.
pub type SharedCache = InMemoryCacheBackend<CachedItem>;

/// Single-item retrieval as wired into the API.
pub type ApiRetrieval<T> = RetrievalOrchestrator<T, DynItemStore<T>, SharedCache>;

/// Everything the handlers of one item kind need.
///
/// The store is shared by the orchestrator, the listing service and the
/// write handlers. The cache is the process-wide one from [`AppState`].
pub struct ItemServices<T: StoredItem> {
    pub store: Arc<DynItemStore<T>>,
    pub retrieval: ApiRetrieval<T>,
    pub listing: ListingService<T, DynItemStore<T>>,
}

impl<T: StoredItem> ItemServices<T> {
    /// Wire services over `store`, reading through `cache`.
    pub fn new(
        store: Arc<DynItemStore<T>>,
        cache: Arc<SharedCache>,
        config: RetrievalConfig,
    ) -> Self {
        let retrieval = RetrievalOrchestrator::new(Arc::clone(&store), cache, config);
        let listing = ListingService::new(Arc::clone(&store));
        Self {
            store,
            retrieval,
            listing,
        }
    }

    /// Wire services over an empty in-memory store.
    pub fn in_memory(cache: Arc<SharedCache>, config: RetrievalConfig) -> Self {
        let store: Arc<DynItemStore<T>> = Arc::new(InMemoryItemStore::<T>::new());
        Self::new(store, cache, config)
    }

    /// Replace the recompute cost model of the retrieval path.
    pub fn with_latency(mut self, latency: Arc<dyn SimulatedLatency>) -> Self {
        self.retrieval = self.retrieval.with_latency(latency);
        self
    }
}

impl<T: StoredItem> Clone for ItemServices<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retrieval: self.retrieval.clone(),
            listing: self.listing.clone(),
        }
    }
}

pub type TodoServices = ItemServices<TodoItem>;
pub type ProductServices = ItemServices<Product>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Shared by `todos` and `products`; a user holds one entry across both.
    pub cache: Arc<SharedCache>,
    pub todos: TodoServices,
    pub products: ProductServices,
    pub api_config: Arc<ApiConfig>,
    pub auth_config: Arc<AuthConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Assemble state from services that read through `cache`.
    pub fn new(
        cache: Arc<SharedCache>,
        todos: TodoServices,
        products: ProductServices,
        api_config: ApiConfig,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            cache,
            todos,
            products,
            api_config: Arc::new(api_config),
            auth_config: Arc::new(auth_config),
            start_time: std::time::Instant::now(),
        }
    }

    /// State over empty in-memory stores, as the server binary runs it.
    pub fn in_memory(
        retrieval: RetrievalConfig,
        api_config: ApiConfig,
        auth_config: AuthConfig,
    ) -> Self {
        let cache = Arc::new(SharedCache::new());
        Self::new(
            Arc::clone(&cache),
            ItemServices::in_memory(Arc::clone(&cache), retrieval.clone()),
            ItemServices::in_memory(cache, retrieval),
            api_config,
            auth_config,
        )
    }
}

/// Lets handlers extract one part of [`AppState`] with `State<T>`.
macro_rules! state_parts {
    ($($field:ident: $part:ty),+ $(,)?) => {
        $(
            impl axum::extract::FromRef<AppState> for $part {
                fn from_ref(state: &AppState) -> Self {
                    state.$field.clone()
                }
            }
        )+
    };
}

state_parts! {
    todos: TodoServices,
    products: ProductServices,
    api_config: Arc<ApiConfig>,
    auth_config: Arc<AuthConfig>,
}
