//! The storable item abstraction.
//!
//! Every entity the store persists implements [`StoredItem`]. The trait
//! carries the kind-specific pieces (draft, change and filter types, field
//! validation, ordering) so the store, the cache and the listing service can
//! each be written once and serve every kind.

use listkeep_core::{
    ItemId, ItemKind, Product, ProductChange, ProductDraft, ProductFilter, SortOrder, Timestamp,
    TodoChange, TodoDraft, TodoFilter, TodoItem, UserId, ValidationError,
};

/// An entity that can be persisted by an [`ItemStore`](crate::ItemStore).
///
/// # Implementation Requirements
///
/// - `kind()` must return the same value for every instance
/// - `item_id()` must return the store-assigned id, which never changes
/// - `apply_change` must only touch the kind's mutable fields
pub trait StoredItem: Clone + Send + Sync + 'static {
    /// Fields supplied on create.
    type Draft: Send + Sync + 'static;
    /// Mutable fields supplied on update.
    type Change: Send + Sync + 'static;
    /// Listing filter. `Default` must match every item.
    type Filter: Default + Send + Sync + 'static;

    fn kind() -> ItemKind;

    fn item_id(&self) -> ItemId;

    fn owner_id(&self) -> &UserId;

    /// Check a draft before the store assigns it an id.
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// Check a change before it is applied.
    fn validate_change(change: &Self::Change) -> Result<(), ValidationError>;

    /// Build a new item from a validated draft.
    fn from_draft(id: ItemId, owner_id: UserId, draft: Self::Draft, now: Timestamp) -> Self;

    /// Apply a validated change in place.
    fn apply_change(&mut self, change: Self::Change, now: Timestamp);

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Reorder filtered items. Items arrive in creation order and the
    /// default keeps it.
    fn arrange(_items: &mut [Self], _filter: &Self::Filter) {}

    /// Wrap the item for the shared cache.
    fn into_cached(self) -> CachedItem;

    /// Unwrap a cached value, or `None` when it holds another kind.
    fn from_cached(cached: CachedItem) -> Option<Self>;
}

/// A value held by the process-wide read-through cache.
///
/// Every kind shares one cache, so under user-keyed caching a user's single
/// slot may hold a todo or a product.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedItem {
    Todo(TodoItem),
    Product(Product),
}

impl CachedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            CachedItem::Todo(_) => ItemKind::Todo,
            CachedItem::Product(_) => ItemKind::Product,
        }
    }

    pub fn item_id(&self) -> ItemId {
        match self {
            CachedItem::Todo(todo) => todo.id,
            CachedItem::Product(product) => product.id,
        }
    }
}

// ============================================================================
// TODO ITEMS
// ============================================================================

impl StoredItem for TodoItem {
    type Draft = TodoDraft;
    type Change = TodoChange;
    type Filter = TodoFilter;

    fn kind() -> ItemKind {
        ItemKind::Todo
    }

    fn item_id(&self) -> ItemId {
        self.id
    }

    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    fn validate_draft(draft: &TodoDraft) -> Result<(), ValidationError> {
        if draft.text.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "text".to_string(),
            });
        }
        Ok(())
    }

    fn validate_change(_change: &TodoChange) -> Result<(), ValidationError> {
        Ok(())
    }

    fn from_draft(id: ItemId, owner_id: UserId, draft: TodoDraft, now: Timestamp) -> Self {
        TodoItem {
            id,
            owner_id,
            text: draft.text,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_change(&mut self, change: TodoChange, now: Timestamp) {
        self.is_completed = change.is_completed;
        self.updated_at = now;
    }

    fn matches(&self, filter: &TodoFilter) -> bool {
        filter.matches(self)
    }

    fn into_cached(self) -> CachedItem {
        CachedItem::Todo(self)
    }

    fn from_cached(cached: CachedItem) -> Option<Self> {
        match cached {
            CachedItem::Todo(todo) => Some(todo),
            CachedItem::Product(_) => None,
        }
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        });
    }
    Ok(())
}

impl StoredItem for Product {
    type Draft = ProductDraft;
    type Change = ProductChange;
    type Filter = ProductFilter;

    fn kind() -> ItemKind {
        ItemKind::Product
    }

    fn item_id(&self) -> ItemId {
        self.id
    }

    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    fn validate_draft(draft: &ProductDraft) -> Result<(), ValidationError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        validate_price(draft.price)
    }

    fn validate_change(change: &ProductChange) -> Result<(), ValidationError> {
        validate_price(change.price)
    }

    fn from_draft(id: ItemId, owner_id: UserId, draft: ProductDraft, now: Timestamp) -> Self {
        Product {
            id,
            owner_id,
            name: draft.name,
            price: draft.price,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_change(&mut self, change: ProductChange, now: Timestamp) {
        self.price = change.price;
        self.updated_at = now;
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        filter.matches(self)
    }

    fn arrange(items: &mut [Self], filter: &ProductFilter) {
        // Stable sort: equal prices keep creation order.
        match filter.price_order {
            Some(SortOrder::Asc) => items.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Some(SortOrder::Desc) => items.sort_by(|a, b| b.price.total_cmp(&a.price)),
            None => {}
        }
    }

    fn into_cached(self) -> CachedItem {
        CachedItem::Product(self)
    }

    fn from_cached(cached: CachedItem) -> Option<Self> {
        match cached {
            CachedItem::Product(product) => Some(product),
            CachedItem::Todo(_) => None,
        }
    }
}
