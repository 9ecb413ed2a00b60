//! Order placement and order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::CheckoutLine;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};
use store::{Order, OrderItem, OrderStatus, PaymentMethod, Store};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub total_display: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price_at_purchase_cents: i64,
    pub line_total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            created_at: order.created_at,
            total_cents: order.total.cents(),
            total_display: order.total.to_string(),
            status: order.status,
            payment_method: order.payment_method,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        let line_total = item.line_total();
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price_at_purchase_cents: item.price_at_purchase.cents(),
            line_total_cents: line_total.cents(),
        }
    }
}

/// POST /orders — places an order for the requested lines.
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer = state
        .order_service
        .store()
        .get_customer(req.customer_id)
        .await?;
    if customer.is_none() {
        return Err(ApiError::NotFound(format!(
            "customer {} not found",
            req.customer_id
        )));
    }

    let lines = req
        .items
        .into_iter()
        .map(|line| CheckoutLine {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect();

    let order = state
        .order_service
        .place_order_lines(req.customer_id, lines, req.payment_method)
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id} — fetches an order with its items.
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let order = state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}/status — moves an order to a new status.
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let updated = state
        .order_service
        .update_order_status(order_id, req.status)
        .await?;
    if !updated {
        return Err(ApiError::NotFound(format!("order {order_id} not found")));
    }

    let order = state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("order {order_id} vanished after update")))?;
    Ok(Json(order.into()))
}

/// GET /customers/{id}/orders — lists a customer's orders, newest first.
pub async fn list_for_customer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(id);
    let orders = state
        .order_service
        .orders_for_customer(customer_id)
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}
