use super::{clean, validate_non_negative, validate_not_blank};
use crate::{
    cache::{invalidate, read_json, write_json, CacheBackend},
    db::DbPool,
    entities::product,
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Cache key for the unfiltered product list
pub const PRODUCTS_CACHE_KEY: &str = "products:all";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: String,
    pub category: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub stock_quantity: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub min_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(custom = "validate_not_blank", length(max = 255))]
    pub name: Option<String>,
    pub category: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub stock_quantity: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub min_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct StockAdjustmentRequest {
    /// Added to the current stock; negative to remove
    pub delta: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Substring of the product name
    pub search: Option<String>,
    pub active: Option<bool>,
}

impl ProductFilter {
    fn is_empty(&self) -> bool {
        self.category.is_none() && self.search.is_none() && self.active.is_none()
    }
}

/// Service for the product catalogue
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    cache: Arc<dyn CacheBackend>,
    cache_ttl: Duration,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, cache: Arc<dyn CacheBackend>, cache_ttl: Duration) -> Self {
        Self {
            db_pool,
            cache,
            cache_ttl,
        }
    }

    /// Lists products by name. The unfiltered list is served from cache when present.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let filter = ProductFilter {
            category: clean(filter.category),
            search: clean(filter.search),
            active: filter.active,
        };

        if filter.is_empty() {
            if let Some(cached) = read_json(self.cache.as_ref(), PRODUCTS_CACHE_KEY).await {
                debug!("Product list served from cache");
                return Ok(cached);
            }
        }

        let mut query = product::Entity::find();
        if let Some(category) = &filter.category {
            query = query.filter(product::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = &filter.search {
            query = query.filter(product::Column::Name.contains(search.as_str()));
        }
        if let Some(active) = filter.active {
            query = query.filter(product::Column::IsActive.eq(active));
        }

        let products = query
            .order_by_asc(product::Column::Name)
            .all(&*self.db_pool)
            .await?;

        if filter.is_empty() {
            write_json(
                self.cache.as_ref(),
                PRODUCTS_CACHE_KEY,
                &products,
                Some(self.cache_ttl),
            )
            .await;
        }
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let created = product::ActiveModel {
            name: Set(request.name.trim().to_string()),
            category: Set(clean(request.category)),
            price: Set(request.price),
            stock_quantity: Set(request.stock_quantity.unwrap_or(Decimal::ZERO)),
            cost_price: Set(request.cost_price),
            min_stock: Set(request.min_stock.unwrap_or(Decimal::ZERO)),
            is_active: Set(request.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        self.invalidate_list().await;
        info!(product_id = created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: i32,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_product(id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.category.is_some() {
            active.category = Set(clean(request.category));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(stock) = request.stock_quantity {
            active.stock_quantity = Set(stock);
        }
        if let Some(cost) = request.cost_price {
            active.cost_price = Set(Some(cost));
        }
        if let Some(min_stock) = request.min_stock {
            active.min_stock = Set(min_stock);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db_pool).await?;
        self.invalidate_list().await;
        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product", id));
        }
        self.invalidate_list().await;
        info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Active products at or below their minimum stock
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::StockQuantity)
            .all(&*self.db_pool)
            .await?;
        Ok(products.into_iter().filter(|p| p.is_low_stock()).collect())
    }

    /// Distinct product categories, sorted
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ServiceError> {
        let categories: Vec<String> = product::Entity::find()
            .select_only()
            .column(product::Column::Category)
            .filter(product::Column::Category.is_not_null())
            .distinct()
            .order_by_asc(product::Column::Category)
            .into_tuple()
            .all(&*self.db_pool)
            .await?;
        Ok(categories)
    }

    /// Applies a stock delta; stock may not go below zero
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        id: i32,
        request: StockAdjustmentRequest,
    ) -> Result<product::Model, ServiceError> {
        let mut update = product::Entity::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).add(request.delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id));
        if request.delta < Decimal::ZERO {
            update = update.filter(product::Column::StockQuantity.gte(-request.delta));
        }

        if update.exec(&*self.db_pool).await?.rows_affected == 0 {
            let existing = self.get_product(id).await?;
            return Err(ServiceError::InsufficientStock(format!(
                "{} has {} in stock, cannot remove {}",
                existing.name,
                existing.stock_quantity,
                -request.delta
            )));
        }
        let updated = self.get_product(id).await?;

        self.invalidate_list().await;
        info!(
            product_id = id,
            delta = %request.delta,
            reason = request.reason.as_deref().unwrap_or(""),
            "Stock adjusted"
        );
        Ok(updated)
    }

    /// Drops the cached product list; called after every product write
    pub async fn invalidate_list(&self) {
        invalidate(self.cache.as_ref(), PRODUCTS_CACHE_KEY).await;
    }
}
