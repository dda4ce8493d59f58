use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::backend::{BackendError, LaundryBackend};
use crate::config::Config;
use crate::engine::admin::AdminOrderPanel;
use crate::engine::pricing::PricingModel;
use crate::engine::wizard::{BookingWizard, Submission};
use crate::models::order::OrderStatus;
use crate::observability::metrics::Metrics;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub pricing_model: PricingModel,
    pub booking_redirect_delay_ms: u64,
    pub admin_redirect_delay_ms: u64,
    pub wizard_ttl: TimeDelta,
    pub session_ttl: TimeDelta,
}

/// What one idle sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Swept {
    pub wizards: usize,
    pub sessions: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderStatusEvent {
    pub order_id: u64,
    pub status: OrderStatus,
    pub confirmed: bool,
    pub at: DateTime<Utc>,
}

pub struct AppState {
    pub backend: Arc<dyn LaundryBackend>,
    pub sessions: SessionStore,
    pub wizards: DashMap<Uuid, BookingWizard>,
    pub admin_panels: DashMap<Uuid, AdminOrderPanel>,
    pub order_events_tx: broadcast::Sender<OrderStatusEvent>,
    pub metrics: Metrics,
    pub settings: Settings,
}

impl AppState {
    pub fn new(backend: Arc<dyn LaundryBackend>, config: &Config) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            backend,
            sessions: SessionStore::new(config.event_buffer_size),
            wizards: DashMap::new(),
            admin_panels: DashMap::new(),
            order_events_tx,
            metrics: Metrics::new(),
            settings: Settings {
                pricing_model: config.pricing_model,
                booking_redirect_delay_ms: config.booking_redirect_delay_ms,
                admin_redirect_delay_ms: config.admin_redirect_delay_ms,
                wizard_ttl: ttl(config.wizard_ttl_secs),
                session_ttl: ttl(config.session_ttl_secs),
            },
        }
    }

    /// Runs one backend call, timing it and ending `session` when the
    /// backend answers 401.
    pub async fn call<T, F>(
        &self,
        endpoint: &'static str,
        session: Option<Uuid>,
        request: F,
    ) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let start = Instant::now();
        let result = request.await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(BackendError::Unauthorized) => "unauthorized",
            Err(_) => "error",
        };
        self.metrics
            .backend_request_seconds
            .with_label_values(&[endpoint, outcome])
            .observe(start.elapsed().as_secs_f64());

        if let Err(err) = &result {
            warn!(endpoint, error = %err, "backend call failed");
            if let (BackendError::Unauthorized, Some(id)) = (err, session) {
                self.end_session(id, true);
            }
        }

        result
    }

    pub fn end_session(&self, id: Uuid, evicted: bool) -> bool {
        let ended = if evicted {
            self.sessions.evict(id)
        } else {
            self.sessions.sign_out(id)
        };
        if ended {
            self.admin_panels.remove(&id);
            self.metrics.active_sessions.set(self.sessions.len() as i64);
        }
        ended
    }

    pub fn track_wizards(&self) {
        self.metrics.active_wizards.set(self.wizards.len() as i64);
    }

    /// Drops wizards and sessions idle past their TTL. A wizard with a
    /// submission in flight is kept until the backend answers.
    pub fn sweep(&self, now: DateTime<Utc>) -> Swept {
        let mut swept = Swept::default();

        if let Some(cutoff) = now.checked_sub_signed(self.settings.wizard_ttl) {
            self.wizards.retain(|_, wizard| {
                let keep = wizard.updated_at >= cutoff
                    || matches!(wizard.submission(), Submission::Pending { .. });
                if !keep {
                    swept.wizards += 1;
                }
                keep
            });
        }

        if let Some(cutoff) = now.checked_sub_signed(self.settings.session_ttl) {
            for id in self.sessions.expire_idle(cutoff) {
                self.admin_panels.remove(&id);
                swept.sessions += 1;
            }
        }

        self.track_wizards();
        self.metrics.active_sessions.set(self.sessions.len() as i64);
        swept
    }
}

fn ttl(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
