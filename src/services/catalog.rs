use crate::{
    dto::{CategoryPatch, NewCategory, NewProduct, ProductPatch, ProductQuery},
    entities::{category, order_item, product},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TryIntoModel,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::contains_ignore_case;

/// Product with its category attached
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: Option<category::Model>,
}

/// Categories and products
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ---- categories ----

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i32) -> Result<Option<category::Model>, ServiceError> {
        Ok(category::Entity::find_by_id(id).one(&*self.db).await?)
    }

    /// Categories ordered by name
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, input: NewCategory) -> Result<category::Model, ServiceError> {
        self.ensure_unique_category_name(&input.name, None).await?;

        let model = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = model.id, "Created category");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i32,
        patch: CategoryPatch,
    ) -> Result<Option<category::Model>, ServiceError> {
        let Some(existing) = self.get_category(id).await? else {
            return Ok(None);
        };
        if let Some(ref name) = patch.name {
            self.ensure_unique_category_name(name, Some(id)).await?;
        }

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }

        let model = if active.is_changed() {
            active.update(&*self.db).await?
        } else {
            active.try_into_model()?
        };
        info!(category_id = id, "Updated category");
        Ok(Some(model))
    }

    /// Deletes a category that no product points at.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<bool, ServiceError> {
        let Some(existing) = self.get_category(id).await? else {
            return Ok(false);
        };

        let referencing = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category is used by {} product(s)",
                referencing
            )));
        }

        existing.delete(&*self.db).await?;
        info!(category_id = id, "Deleted category");
        Ok(true)
    }

    async fn ensure_unique_category_name(
        &self,
        name: &str,
        except: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::field("name", "Category name already exists"));
        }
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: i32) -> Result<(), ServiceError> {
        if self.get_category(category_id).await?.is_none() {
            return Err(ServiceError::field("categoryId", "Category does not exist"));
        }
        Ok(())
    }

    // ---- products ----

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<Option<ProductWithCategory>, ServiceError> {
        let found = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(&*self.db)
            .await?;
        Ok(found.map(|(product, category)| ProductWithCategory { product, category }))
    }

    /// Products ordered by name. `category_id` and `q` combine with AND.
    ///
    /// SQLite's `LOWER` only folds ASCII, so a search term with other letters
    /// is matched here after the query instead of in SQL.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductQuery,
    ) -> Result<Vec<ProductWithCategory>, ServiceError> {
        let mut select = product::Entity::find().find_also_related(category::Entity);

        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }

        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let fold_in_sql = self.db.get_database_backend() != DbBackend::Sqlite;
        let mut unicode_needle = None;
        if let Some(needle) = needle {
            if fold_in_sql || needle.is_ascii() {
                select = select.filter(
                    Condition::any()
                        .add(contains_ignore_case(product::Column::Name, &needle))
                        .add(contains_ignore_case(product::Column::Description, &needle)),
                );
            } else {
                unicode_needle = Some(needle);
            }
        }

        let rows = select
            .order_by_asc(product::Column::Name)
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|(product, _)| {
                unicode_needle.as_deref().map_or(true, |needle| {
                    product.name.to_lowercase().contains(needle)
                        || product.description.to_lowercase().contains(needle)
                })
            })
            .map(|(product, category)| ProductWithCategory { product, category })
            .collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        let price = input
            .price
            .normalize()
            .map_err(|message| ServiceError::field("price", message))?;
        self.ensure_category_exists(input.category_id).await?;

        let model = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(price),
            image_url: Set(input.image_url),
            category_id: Set(input.category_id),
            in_stock: Set(input.in_stock),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = model.id, "Created product");
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: i32,
        patch: ProductPatch,
    ) -> Result<Option<product::Model>, ServiceError> {
        let Some(existing) = product::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(existing));
        }

        let price = patch
            .price
            .as_ref()
            .map(|p| p.normalize())
            .transpose()
            .map_err(|message| ServiceError::field("price", message))?;
        if let Some(category_id) = patch.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(in_stock) = patch.in_stock {
            active.in_stock = Set(in_stock);
        }

        let model = if active.is_changed() {
            active.update(&*self.db).await?
        } else {
            active.try_into_model()?
        };
        info!(product_id = id, "Updated product");
        Ok(Some(model))
    }

    /// Deletes a product that no order line points at.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<bool, ServiceError> {
        let Some(existing) = product::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(false);
        };

        let referencing = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(
                "Product appears in existing orders".to_string(),
            ));
        }

        existing.delete(&*self.db).await?;
        info!(product_id = id, "Deleted product");
        Ok(true)
    }
}
