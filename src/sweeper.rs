use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::state::AppState;

/// Periodically evicts idle booking wizards and sessions.
pub async fn run_sweeper(state: Arc<AppState>, every: Duration) {
    info!(interval_secs = every.as_secs(), "idle sweeper started");

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let swept = state.sweep(Utc::now());
        if swept.wizards > 0 || swept.sessions > 0 {
            info!(
                wizards = swept.wizards,
                sessions = swept.sessions,
                "swept idle state"
            );
        }
    }
}
