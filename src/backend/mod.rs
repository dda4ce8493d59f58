//! Contract of the external FreshPress API.

pub mod http;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::location::LockerLocation;
use crate::models::order::{NewOrder, Order, OrderStatus};
use crate::models::profile::{Credentials, ProfileUpdate, Registration, UserProfile};

pub use http::HttpBackend;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend rejected the credentials")]
    Unauthorized,
    #[error("network error: {0}")]
    Network(String),
    #[error("backend error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait LaundryBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError>;

    async fn register(&self, registration: &Registration) -> Result<UserProfile, BackendError>;

    async fn profile(&self, token: &str) -> Result<UserProfile, BackendError>;

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, BackendError>;

    async fn delete_account(&self, token: &str, password: &str) -> Result<(), BackendError>;

    async fn locations(&self) -> Result<Vec<LockerLocation>, BackendError>;

    async fn orders(&self, token: &str) -> Result<Vec<Order>, BackendError>;

    /// Retries of the same booking reuse `idempotency_key`.
    async fn create_order(
        &self,
        token: &str,
        order: &NewOrder,
        idempotency_key: Uuid,
    ) -> Result<Order, BackendError>;

    async fn update_order_status(
        &self,
        token: &str,
        order_id: u64,
        status: OrderStatus,
    ) -> Result<Order, BackendError>;
}

/// `{ "data": T }` or a bare `T`; the backend is not consistent about it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DataBody<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> DataBody<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            DataBody::Wrapped { data } => data,
            DataBody::Bare(inner) => inner,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserBody {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl UserBody {
    pub(crate) fn into_inner(self) -> UserProfile {
        match self {
            UserBody::Wrapped { user } => user,
            UserBody::Bare(user) => user,
        }
    }
}
