//! Health and stats polling.
//!
//! Each loop ticks on its own interval and spawns every request as an
//! independent task, so a hung request never delays the next tick. Two
//! requests for the same endpoint may overlap; whichever finishes last
//! owns the display.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::presenter::Presenter;
use crate::service::ServiceClient;
use crate::status::{HealthState, StatsDisplay};

pub const HEALTH_INTERVAL: Duration = Duration::from_secs(30);
pub const STATS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Poller {
    client: ServiceClient,
    presenter: Arc<dyn Presenter>,
}

impl Poller {
    pub fn new(client: ServiceClient, presenter: Arc<dyn Presenter>) -> Self {
        Self { client, presenter }
    }

    /// One health poll. Shows "checking" before the request goes out.
    pub async fn check_health(&self) {
        self.presenter
            .set_health(HealthState::Checking, "Checking service...".to_string());

        let (state, message) = match self.client.health().await {
            Ok(probe) if probe.ok && probe.body.is_healthy() => {
                (HealthState::Healthy, "✅ Service is healthy".to_string())
            }
            Ok(probe) => {
                let reason = probe.body.error.as_deref().unwrap_or("Unknown error");
                tracing::warn!("Service reported unhealthy: {}", reason);
                (
                    HealthState::Unhealthy,
                    format!("❌ Service unavailable: {}", reason),
                )
            }
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                (
                    HealthState::Unhealthy,
                    format!("❌ Connection failed: {}", e),
                )
            }
        };

        self.presenter.set_health(state, message);
    }

    /// One stats poll. Any failure wipes the previous snapshot.
    pub async fn refresh_stats(&self) {
        let display = match self.client.stats().await {
            Ok(stats) => StatsDisplay::from_snapshot(&stats),
            Err(e) => {
                tracing::warn!("Failed to refresh stats: {}", e);
                StatsDisplay::Unavailable
            }
        };
        self.presenter.set_stats(display);
    }

    /// Fire-and-forget stats poll after `delay`.
    pub fn schedule_stats_refresh(&self, delay: Duration) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            poller.refresh_stats().await;
        })
    }

    /// Fire-and-forget stats poll right now.
    pub fn spawn_stats_refresh(&self) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move { poller.refresh_stats().await })
    }

    /// Health loop: first poll immediately, then every `every`.
    pub fn spawn_health_loop(&self, every: Duration) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!("health poll tick");
                let poller = poller.clone();
                tokio::spawn(async move { poller.check_health().await });
            }
        })
    }

    /// Stats loop: first poll immediately, then every `every`.
    pub fn spawn_stats_loop(&self, every: Duration) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!("stats poll tick");
                poller.spawn_stats_refresh();
            }
        })
    }
}
