//! Product REST API Routes
//!
//! Reading a single product requires a resolved user, since the cache key
//! is derived from it. The other product routes accept anonymous callers;
//! products created anonymously are owned by [`UserId::anonymous`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use listkeep_core::{ItemId, ItemKind, ProductFilter, SortOrder, UserId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, MaybeUser},
    state::{AppState, ProductServices},
    telemetry::metrics::{record_cache_lookup, CacheOutcome},
    types::{
        ChangeProductRequest, CreateProductRequest, FilterProductsQuery, ListProductsQuery,
        PaginatedResponse, ProductResponse,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/product/get/:id - Read one product through the cache
pub async fn get_product(
    State(products): State<ProductServices>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductResponse>> {
    let id = ItemId::new(id);
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = products.retrieval.get_item(id, &user, &cancel).await;
    record_cache_lookup(ItemKind::Product, CacheOutcome::of(&result));

    match result? {
        Some(read) => Ok(Json(read.into_value().into())),
        None => Err(ApiError::entity_not_found(ItemKind::Product.as_str(), id)),
    }
}

/// GET /api/product/all - List products with pagination, name filter and
/// optional price ordering
pub async fn list_products(
    State(products): State<ProductServices>,
    State(config): State<Arc<ApiConfig>>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<PaginatedResponse<ProductResponse>>> {
    let page = query.page_request(&config)?;
    let slice = products.listing.list(page, &query.filter()).await?;
    Ok(Json(PaginatedResponse::from_slice(slice)))
}

/// POST /api/product/create - Create a product
pub async fn create_product(
    State(products): State<ProductServices>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let owner = user.map_or_else(UserId::anonymous, |u| u.id);
    let product = products.store.create(owner, req.into()).await?;
    tracing::info!(id = %product.id, owner = %product.owner_id, "product created");
    Ok(Json(product.into()))
}

/// POST /api/product/change/:id - Set the price
pub async fn change_product(
    State(products): State<ProductServices>,
    Path(id): Path<i64>,
    Json(req): Json<ChangeProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let id = ItemId::new(id);
    match products.store.update(id, req.into()).await? {
        Some(product) => Ok(Json(product.into())),
        None => {
            tracing::debug!(id = %id, "change of missing product");
            Err(ApiError::operation_failed())
        }
    }
}

/// DELETE /api/product/delete/:id - Delete a product
pub async fn delete_product(
    State(products): State<ProductServices>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let id = ItemId::new(id);
    if products.store.delete(id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::delete_failed(ItemKind::Product.as_str(), id))
    }
}

/// POST /api/product/sorting/:ascending - Every product ordered by price
pub async fn sort_products(
    State(products): State<ProductServices>,
    Path(ascending): Path<bool>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let filter = ProductFilter::sorted(SortOrder::from_ascending(ascending));
    let sorted = products.listing.all(&filter).await?;
    Ok(Json(sorted.into_iter().map(Into::into).collect()))
}

/// GET /api/product/filter?name= - Every product whose name contains `name`
pub async fn filter_products(
    State(products): State<ProductServices>,
    Query(query): Query<FilterProductsQuery>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let filter = if query.name.trim().is_empty() {
        ProductFilter::default()
    } else {
        ProductFilter::named(query.name)
    };
    let matching = products.listing.all(&filter).await?;
    Ok(Json(matching.into_iter().map(Into::into).collect()))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/get/:id", get(get_product))
        .route("/all", get(list_products))
        .route("/create", post(create_product))
        .route("/change/:id", post(change_product))
        .route("/delete/:id", delete(delete_product))
        .route("/sorting/:ascending", post(sort_products))
        .route("/filter", get(filter_products))
}
