use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use super::{BackendError, DataBody, LaundryBackend, UserBody};
use crate::models::location::LockerLocation;
use crate::models::order::{NewOrder, Order, OrderStatus};
use crate::models::profile::{Credentials, LoginResponse, ProfileUpdate, Registration, UserProfile};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// `reqwest` client for the FreshPress REST API under `{base_url}/api`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::Network(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = req
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            status if !status.is_success() => Err(BackendError::Api(
                status.as_u16(),
                resp.text().await.unwrap_or_default(),
            )),
            _ => Ok(resp),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LaundryBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError> {
        let req = self.client.post(self.url("/login")).json(credentials);
        let body: LoginResponse = self.fetch(req).await?;
        Ok(body.token)
    }

    async fn register(&self, registration: &Registration) -> Result<UserProfile, BackendError> {
        let req = self.client.post(self.url("/register")).json(registration);
        let body: UserBody = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn profile(&self, token: &str) -> Result<UserProfile, BackendError> {
        let req = self.client.get(self.url("/profile")).bearer_auth(token);
        let body: UserBody = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let req = self
            .client
            .put(self.url("/profile"))
            .bearer_auth(token)
            .json(update);
        let body: UserBody = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn delete_account(&self, token: &str, password: &str) -> Result<(), BackendError> {
        let req = self
            .client
            .delete(self.url("/profile"))
            .bearer_auth(token)
            .json(&json!({ "password": password }));
        self.send(req).await?;
        Ok(())
    }

    async fn locations(&self) -> Result<Vec<LockerLocation>, BackendError> {
        let req = self.client.get(self.url("/locations"));
        let body: DataBody<Vec<LockerLocation>> = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        let req = self.client.get(self.url("/orders")).bearer_auth(token);
        let body: DataBody<Vec<Order>> = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn create_order(
        &self,
        token: &str,
        order: &NewOrder,
        idempotency_key: Uuid,
    ) -> Result<Order, BackendError> {
        let req = self
            .client
            .post(self.url("/orders"))
            .bearer_auth(token)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(order);
        let body: DataBody<Order> = self.fetch(req).await?;
        Ok(body.into_inner())
    }

    async fn update_order_status(
        &self,
        token: &str,
        order_id: u64,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        let req = self
            .client
            .put(self.url(&format!("/orders/{order_id}")))
            .bearer_auth(token)
            .json(&json!({ "status": status }));
        let body: DataBody<Order> = self.fetch(req).await?;
        Ok(body.into_inner())
    }
}
