//! Core entity structures

use crate::{ItemId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kind discriminator, used in errors, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Todo,
    Product,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Todo => "todo",
            ItemKind::Product => "product",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering direction for price sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

// ============================================================================
// TODO ITEMS
// ============================================================================

/// A user-owned todo entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: ItemId,
    pub owner_id: UserId,
    pub text: String,
    pub is_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied when creating a todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    pub text: String,
}

/// Mutable fields of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChange {
    pub is_completed: bool,
}

/// Listing filter for todo items. `None` includes every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoFilter {
    pub is_completed: Option<bool>,
}

impl TodoFilter {
    pub fn completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
        }
    }

    pub fn matches(&self, item: &TodoItem) -> bool {
        self.is_completed
            .map_or(true, |wanted| item.is_completed == wanted)
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

/// A user-owned catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub price: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied when creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: f64,
}

/// Mutable fields of a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductChange {
    pub price: f64,
}

/// Listing filter for products.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name.
    pub name: Option<String>,
    /// Reorders results by price; store order otherwise.
    pub price_order: Option<SortOrder>,
}

impl ProductFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            price_order: None,
        }
    }

    pub fn sorted(order: SortOrder) -> Self {
        Self {
            name: None,
            price_order: Some(order),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        match &self.name {
            Some(needle) => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}
