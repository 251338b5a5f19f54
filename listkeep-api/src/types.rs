//! Request and response types for the HTTP surface.
//!
//! Request bodies bind into core drafts and changes; responses are built
//! from the core entities so clients never see internal fields out of
//! shape.

use listkeep_core::{
    ItemId, PageRequest, PaginatedSlice, Product, ProductChange, ProductDraft, ProductFilter,
    SortOrder, Timestamp, TodoChange, TodoDraft, TodoFilter, TodoItem, UserId,
};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::ApiResult;

// ============================================================================
// TO-DO ITEMS
// ============================================================================

/// Body of `POST /api/todo/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub text: String,
}

impl From<CreateTodoRequest> for TodoDraft {
    fn from(req: CreateTodoRequest) -> Self {
        TodoDraft { text: req.text }
    }
}

/// Body of `POST /api/todo/change/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTodoRequest {
    pub is_completed: bool,
}

impl From<ChangeTodoRequest> for TodoChange {
    fn from(req: ChangeTodoRequest) -> Self {
        TodoChange {
            is_completed: req.is_completed,
        }
    }
}

/// Query of `GET /api/todo/all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTodosQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub is_completed: Option<bool>,
}

impl ListTodosQuery {
    pub fn page_request(&self, config: &ApiConfig) -> ApiResult<PageRequest> {
        Ok(PageRequest::new(
            self.page.unwrap_or(1),
            config.page_size(self.page_size),
        )?)
    }

    pub fn filter(&self) -> TodoFilter {
        TodoFilter {
            is_completed: self.is_completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: ItemId,
    pub owner_id: UserId,
    pub text: String,
    pub is_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<TodoItem> for TodoResponse {
    fn from(item: TodoItem) -> Self {
        Self {
            id: item.id,
            owner_id: item.owner_id,
            text: item.text,
            is_completed: item.is_completed,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

/// Body of `POST /api/product/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
}

impl From<CreateProductRequest> for ProductDraft {
    fn from(req: CreateProductRequest) -> Self {
        ProductDraft {
            name: req.name,
            price: req.price,
        }
    }
}

/// Body of `POST /api/product/change/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeProductRequest {
    pub price: f64,
}

impl From<ChangeProductRequest> for ProductChange {
    fn from(req: ChangeProductRequest) -> Self {
        ProductChange { price: req.price }
    }
}

/// Query of `GET /api/product/all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ListProductsQuery {
    pub fn page_request(&self, config: &ApiConfig) -> ApiResult<PageRequest> {
        Ok(PageRequest::new(
            self.page.unwrap_or(1),
            config.page_size(self.page_size),
        )?)
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
            price_order: self.sort,
        }
    }
}

/// Query of `GET /api/product/filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterProductsQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub price: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            owner_id: product.owner_id,
            name: product.name,
            price: product.price,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// ============================================================================
// PAGINATION
// ============================================================================

/// Paginated listing envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
}

impl<T> PaginatedResponse<T> {
    /// Convert a core slice, mapping each item into its response shape.
    pub fn from_slice<U>(slice: PaginatedSlice<U>) -> Self
    where
        T: From<U>,
    {
        let total_pages = slice.total_pages();
        let has_next_page = slice.has_next_page();
        let slice = slice.map(T::from);
        Self {
            items: slice.items,
            page: slice.page,
            page_size: slice.page_size,
            total_count: slice.total_count,
            total_pages,
            has_next_page,
        }
    }
}
