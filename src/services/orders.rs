use crate::{
    db::with_transaction,
    dto::{price::MAX_MONEY, NewOrder, NewOrderItem, PlaceOrder},
    entities::{
        order::{self, DEFAULT_ORDER_STATUS},
        order_item, product, user,
    },
    errors::{FieldError, FieldErrors, ServiceError},
};
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Order line with the ordered product attached
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderItemWithProduct {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product: Option<product::Model>,
}

/// Order with its lines and, for admin views, its customer
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: order::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<user::Model>,
    pub items: Vec<OrderItemWithProduct>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<OrderWithDetails>, ServiceError> {
        let Some((order, user)) = order::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };
        let items = self.items_for(order.id).await?;
        Ok(Some(OrderWithDetails { order, user, items }))
    }

    /// Inserts a bare order header with status `pending`.
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewOrder) -> Result<order::Model, ServiceError> {
        input.validate()?;
        let model = insert_order(&*self.db, input).await?;
        info!(order_id = model.id, "Created order");
        Ok(model)
    }

    /// Appends a line to an existing order; `None` when the order is missing.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: i32,
        input: NewOrderItem,
    ) -> Result<Option<order_item::Model>, ServiceError> {
        input.validate()?;
        if order::Entity::find_by_id(order_id).one(&*self.db).await?.is_none() {
            return Ok(None);
        }
        if product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::field("productId", "Product does not exist"));
        }
        Ok(Some(insert_item(&*self.db, order_id, input).await?))
    }

    /// Lines of one order in insertion order, products attached
    #[instrument(skip(self))]
    pub async fn items_for(&self, order_id: i32) -> Result<Vec<OrderItemWithProduct>, ServiceError> {
        let mut grouped = self.items_by_order(&[order_id]).await?;
        Ok(grouped.remove(&order_id).unwrap_or_default())
    }

    /// Sets the status and refreshes `updated_at` in the same UPDATE.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        status: String,
    ) -> Result<Option<order::Model>, ServiceError> {
        let Some(existing) = order::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        info!(order_id = id, status = %model.status, "Updated order status");
        Ok(Some(model))
    }

    /// Every order, newest first, with customer and lines
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<OrderWithDetails>, ServiceError> {
        let rows = order::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;
        self.attach_items(rows).await
    }

    /// One customer's orders, newest first, with lines
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<OrderWithDetails>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;
        self.attach_items(orders.into_iter().map(|o| (o, None)).collect())
            .await
    }

    /// Creates an order and all its lines atomically.
    ///
    /// Each line snapshots the product's current price; the order total is
    /// the sum of `price * quantity`. Unknown or out-of-stock products are
    /// reported against the offending line.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn place_order(
        &self,
        user_id: i32,
        input: PlaceOrder,
    ) -> Result<OrderWithDetails, ServiceError> {
        input.validate_lines().map_err(ServiceError::Validation)?;

        let product_ids: Vec<i32> = input.items.iter().map(|l| l.product_id).collect();
        let products: HashMap<i32, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut errors = Vec::new();
        let mut lines = Vec::with_capacity(input.items.len());
        for (i, line) in input.items.iter().enumerate() {
            match products.get(&line.product_id) {
                None => errors.push(FieldError::new(
                    format!("items[{}].productId", i),
                    "Product does not exist",
                )),
                Some(p) if !p.in_stock => errors.push(FieldError::new(
                    format!("items[{}].productId", i),
                    "Product is out of stock",
                )),
                Some(p) => lines.push((p.clone(), line.quantity)),
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(FieldErrors(errors)));
        }

        let total = lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, (p, qty)| {
                p.price
                    .checked_mul(Decimal::from(*qty))
                    .and_then(|line_total| acc.checked_add(line_total))
            })
            .filter(|total| *total <= MAX_MONEY)
            .ok_or_else(|| ServiceError::field("items", "Order total exceeds the maximum amount"))?;

        let (order, items) = with_transaction(&self.db, "place_order", move |txn| {
            Box::pin(async move {
                let order = insert_order(txn, NewOrder { user_id, total }).await?;
                let mut items = Vec::with_capacity(lines.len());
                for (product, quantity) in lines {
                    let item = insert_item(
                        txn,
                        order.id,
                        NewOrderItem {
                            product_id: product.id,
                            quantity,
                            price: product.price,
                        },
                    )
                    .await?;
                    items.push(OrderItemWithProduct {
                        item,
                        product: Some(product),
                    });
                }
                Ok((order, items))
            })
        })
        .await?;

        counter!("atelier_orders_placed_total", 1);
        info!(order_id = order.id, user_id, total = %order.total, "Placed order");
        Ok(OrderWithDetails {
            order,
            user: None,
            items,
        })
    }

    async fn attach_items(
        &self,
        orders: Vec<(order::Model, Option<user::Model>)>,
    ) -> Result<Vec<OrderWithDetails>, ServiceError> {
        let ids: Vec<i32> = orders.iter().map(|(o, _)| o.id).collect();
        let mut grouped = self.items_by_order(&ids).await?;
        Ok(orders
            .into_iter()
            .map(|(order, user)| {
                let items = grouped.remove(&order.id).unwrap_or_default();
                OrderWithDetails { order, user, items }
            })
            .collect())
    }

    /// Two-step load: the lines of `order_ids`, then the products they reference.
    async fn items_by_order(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItemWithProduct>>, ServiceError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;

        let mut product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products: HashMap<i32, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let mut grouped: HashMap<i32, Vec<OrderItemWithProduct>> = HashMap::new();
        for item in items {
            let product = products.get(&item.product_id).cloned();
            grouped
                .entry(item.order_id)
                .or_default()
                .push(OrderItemWithProduct { item, product });
        }
        Ok(grouped)
    }
}

async fn insert_order<C: ConnectionTrait>(db: &C, input: NewOrder) -> Result<order::Model, ServiceError> {
    let now = Utc::now();
    Ok(order::ActiveModel {
        user_id: Set(input.user_id),
        status: Set(DEFAULT_ORDER_STATUS.to_string()),
        total: Set(input.total),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

async fn insert_item<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
    input: NewOrderItem,
) -> Result<order_item::Model, ServiceError> {
    Ok(order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(input.product_id),
        quantity: Set(input.quantity),
        price: Set(input.price),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}
