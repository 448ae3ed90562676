//! Scrape orchestration across all configured switches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tlsg_switch::{ParseError, PortSnapshot, SwitchClient, parse_status_page};

use crate::config::ExporterConfig;
use crate::mapping::{self, MetricFamily, MetricNames};

/// Receives metric batches as a scrape cycle progresses.
///
/// Each switch produces one batch as soon as it has been processed, and the
/// cycle ends with a batch holding the collection time.
pub trait MetricSink {
    fn emit(&mut self, families: Vec<MetricFamily>);
}

impl MetricSink for Vec<MetricFamily> {
    fn emit(&mut self, families: Vec<MetricFamily>) {
        self.extend(families);
    }
}

/// Why a switch produced no data this cycle.
#[derive(Debug, Error)]
pub enum ScrapeFailure {
    #[error("not logged in")]
    Unauthenticated,

    #[error("failed to read status page: {0}")]
    Fetch(#[source] tlsg_switch::Error),

    #[error("inconsistent status page: {0}")]
    Parse(#[from] ParseError),
}

/// Outcome of one switch in one scrape cycle.
#[derive(Debug)]
pub enum ScrapeResult {
    Ports(Vec<PortSnapshot>),
    Failed(ScrapeFailure),
}

impl ScrapeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ports(_))
    }

    /// Collected ports; empty for a failed switch.
    pub fn ports(&self) -> &[PortSnapshot] {
        match self {
            Self::Ports(ports) => ports,
            Self::Failed(_) => &[],
        }
    }
}

/// Totals of one scrape cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeSummary {
    pub switches: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Polls every configured switch, in order, on each scrape.
///
/// Clients sit behind an async mutex: overlapping metric requests run one
/// cycle after the other, so a switch session is only used by one cycle at
/// a time.
pub struct SwitchCollector {
    clients: Mutex<Vec<SwitchClient>>,
    switch_count: usize,
    names: MetricNames,
}

/// Create a shareable collector handle.
pub type SharedCollector = Arc<SwitchCollector>;

impl SwitchCollector {
    /// Create a collector over already built clients.
    pub fn new(clients: Vec<SwitchClient>, prefix: &str) -> Self {
        Self {
            switch_count: clients.len(),
            clients: Mutex::new(clients),
            names: MetricNames::new(prefix),
        }
    }

    /// Build one client per configured switch.
    pub fn from_config(config: &ExporterConfig) -> tlsg_switch::Result<Self> {
        let clients = config
            .switches
            .iter()
            .cloned()
            .map(SwitchClient::new)
            .collect::<tlsg_switch::Result<Vec<_>>>()?;

        Ok(Self::new(clients, &config.prometheus.prefix))
    }

    pub fn switch_count(&self) -> usize {
        self.switch_count
    }

    pub fn names(&self) -> &MetricNames {
        &self.names
    }

    /// Log in to every switch once. Returns the number of successful logins.
    pub async fn login_all(&self) -> usize {
        let mut clients = self.clients.lock().await;
        let mut logged_in = 0;

        for client in clients.iter_mut() {
            if client.authenticate().await {
                logged_in += 1;
            }
        }

        info!(
            logged_in,
            switches = clients.len(),
            "Initial login finished"
        );
        logged_in
    }

    /// Run one scrape cycle, streaming each switch's metrics into `sink`.
    pub async fn scrape<S: MetricSink>(&self, sink: &mut S) -> ScrapeSummary {
        let start = Instant::now();
        let mut summary = ScrapeSummary::default();

        info!("Collecting data...");

        let mut clients = self.clients.lock().await;
        for client in clients.iter_mut() {
            debug!(host = %client.host(), "Looking at switch");

            let result = scrape_switch(client).await;
            summary.switches += 1;
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }

            sink.emit(self.switch_families(client.host(), &result));
        }
        drop(clients);

        summary.duration = start.elapsed();
        sink.emit(vec![mapping::collection_time(
            &self.names,
            summary.duration.as_secs_f64(),
        )]);

        info!(
            switches = summary.switches,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_ms = summary.duration.as_millis() as u64,
            "Finished collecting"
        );

        summary
    }

    /// Metric families for one switch's result.
    pub fn switch_families(&self, host: &str, result: &ScrapeResult) -> Vec<MetricFamily> {
        match result {
            ScrapeResult::Ports(ports) => {
                let mut families = mapping::port_families(&self.names, host, ports);
                families.push(mapping::scrape_success(&self.names, host, true));
                families
            }
            ScrapeResult::Failed(_) => vec![mapping::scrape_success(&self.names, host, false)],
        }
    }
}

/// Fetch and parse the status page.
async fn read_ports(client: &SwitchClient) -> Result<Vec<PortSnapshot>, ScrapeFailure> {
    let body = client
        .fetch_port_stats()
        .await
        .map_err(ScrapeFailure::Fetch)?;

    Ok(parse_status_page(&body, &client.config().port_descriptions)?)
}

fn finish(host: &str, outcome: Result<Vec<PortSnapshot>, ScrapeFailure>) -> ScrapeResult {
    match outcome {
        Ok(ports) => {
            if ports.is_empty() {
                warn!(host = %host, "Couldn't get any port data from switch");
            }
            ScrapeResult::Ports(ports)
        }
        Err(e) => {
            warn!(host = %host, error = %e, "Skipping switch for this cycle");
            ScrapeResult::Failed(e)
        }
    }
}

/// Scrape a single switch.
///
/// 1. Without session caching, log in first.
/// 2. If not logged in (cached session missing or step 1 failed), try once more.
/// 3. Still not logged in: give up on this switch for the cycle.
/// 4. Read the status page. If the read fails, or a cached session yields a
///    page without port data, log in again and read once more. That second
///    outcome is final.
pub async fn scrape_switch(client: &mut SwitchClient) -> ScrapeResult {
    let host = client.host().to_string();
    let mut fresh_login = false;

    if !client.config().cache_session {
        fresh_login = client.authenticate().await;
    }

    if !client.is_authenticated() {
        warn!(host = %host, "Trying to re-login");
        fresh_login = client.authenticate().await;
    }

    if !client.is_authenticated() {
        warn!(host = %host, "Not logged in, skipping switch");
        return ScrapeResult::Failed(ScrapeFailure::Unauthenticated);
    }

    match read_ports(client).await {
        Ok(ports) if fresh_login || !ports.is_empty() => return finish(&host, Ok(ports)),
        Ok(_) => {
            warn!(host = %host, "Cached session returned no port data, re-authenticating");
        }
        Err(ScrapeFailure::Fetch(e)) => {
            warn!(host = %host, error = %e, "Status page read failed, re-authenticating");
        }
        Err(e) => return finish(&host, Err(e)),
    }

    if !client.authenticate().await {
        return finish(&host, Err(ScrapeFailure::Unauthenticated));
    }

    finish(&host, read_ports(client).await)
}
