use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendClient;
use crate::core::{DataFetchError, FeedItem, ValidationError};
use crate::order::checkout::{OrderForm, ValidatedOrderForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("order form is invalid: {0:?}")]
    Invalid(Vec<ValidationError>),
    #[error("meal {0} has no restaurant to deliver from")]
    MissingRestaurant(String),
    #[error("order could not be placed: {0}")]
    Backend(#[from] DataFetchError),
}

/// Row sent to the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub meal_id: String,
    pub buyer_id: String,
    pub restaurant_id: String,
    pub address: String,
    pub phone: String,
    pub status: OrderStatus,
}

impl OrderRequest {
    pub fn new(item: &FeedItem, buyer_id: &str, form: &ValidatedOrderForm) -> Result<Self, OrderError> {
        let restaurant_id = item
            .restaurant_id
            .clone()
            .ok_or_else(|| OrderError::MissingRestaurant(item.id.clone()))?;

        Ok(Self {
            meal_id: item.id.clone(),
            buyer_id: buyer_id.to_string(),
            restaurant_id,
            address: form.address().to_string(),
            phone: form.phone().to_string(),
            status: OrderStatus::Pending,
        })
    }

    /// Validates the raw form and builds the request in one step.
    pub fn from_form(item: &FeedItem, buyer_id: &str, form: &OrderForm) -> Result<Self, OrderError> {
        let validated = form.validate().map_err(OrderError::Invalid)?;
        Self::new(item, buyer_id, &validated)
    }
}

/// Stored order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub meal_id: String,
    pub buyer_id: String,
    pub restaurant_id: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Collaborator that turns an order request into a stored order.
pub trait OrderPlacer: Send + Sync {
    fn place(&self, request: &OrderRequest) -> Result<Order, OrderError>;
}

pub struct RestOrderPlacer {
    client: Arc<BackendClient>,
}

impl RestOrderPlacer {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

impl OrderPlacer for RestOrderPlacer {
    fn place(&self, request: &OrderRequest) -> Result<Order, OrderError> {
        log::info!("Placing order for meal {}", request.meal_id);
        let order: Order = self.client.insert("orders", request)?;
        log::info!("Order {} created", order.id);
        Ok(order)
    }
}

/// Keeps orders in process; used offline and by the demo binary.
#[derive(Default)]
pub struct MemoryOrderPlacer {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().map(|orders| orders.clone()).unwrap_or_default()
    }
}

impl OrderPlacer for MemoryOrderPlacer {
    fn place(&self, request: &OrderRequest) -> Result<Order, OrderError> {
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            meal_id: request.meal_id.clone(),
            buyer_id: request.buyer_id.clone(),
            restaurant_id: request.restaurant_id.clone(),
            address: request.address.clone(),
            phone: request.phone.clone(),
            status: request.status,
            created_at: Utc::now(),
        };

        match self.orders.lock() {
            Ok(mut orders) => orders.push(order.clone()),
            Err(e) => log::error!("Order store poisoned: {}", e),
        }
        log::info!("Order {} stored for meal {}", order.id, order.meal_id);
        Ok(order)
    }
}
