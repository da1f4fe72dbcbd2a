use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::Interval;
use tracing::{debug, error, info, warn};

use crate::ai::SummaryService;
use crate::cancel::Cancellation;
use crate::config::AppConfig;
use crate::feed::{FeedCollector, Publisher};
use crate::selection::SelectionWindow;
use crate::storage::Database;
use crate::{Error, Result};

use super::tasks::{collect_all_sources, deliver_pending, DeliveryReport, IngestReport};

/// Events emitted by the scheduler after each pass
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    ArticlesCollected { stored: u32, duplicates: u32 },
    ArticlesDelivered { posted: u32, failed: u32 },
    /// A background pass failed
    Error { task: String, message: String },
}

/// Background service running collection and delivery on fixed intervals
pub struct SchedulerService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
    summaries: Arc<SummaryService>,
    collector: Option<Arc<dyn FeedCollector>>,
    publisher: Option<Arc<dyn Publisher>>,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>, summaries: Arc<SummaryService>) -> Self {
        Self {
            db,
            config,
            summaries,
            collector: None,
            publisher: None,
            event_tx: None,
        }
    }

    pub fn with_collector(mut self, collector: Arc<dyn FeedCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Run background passes until the shutdown signal fires.
    ///
    /// Collection and delivery run as independent loops, so a slow feed or
    /// summarizer never holds back delivery. A zero interval, or a missing
    /// collector or publisher, disables the matching loop. In-flight work is
    /// cancelled on shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let cancel = Cancellation::from(shutdown.clone());

        let collect_secs = self.config.collect.interval_secs;
        let deliver_secs = self.config.delivery.interval_secs;

        let collect_interval = self.collector.as_ref().and_then(|_| interval(collect_secs));
        let deliver_interval = self.publisher.as_ref().and_then(|_| interval(deliver_secs));

        if collect_interval.is_none() && deliver_interval.is_none() {
            info!("Background scheduler idle: nothing to collect or deliver");
            let _ = shutdown.wait_for(|stop| *stop).await;
            return;
        }

        info!(
            "Scheduler started: collect={}s, deliver={}s",
            collect_secs, deliver_secs
        );

        let collect_loop = async {
            if let Some(interval) = collect_interval {
                self.collect_loop(interval, shutdown.clone(), &cancel).await;
            }
        };
        let deliver_loop = async {
            if let Some(interval) = deliver_interval {
                self.deliver_loop(interval, shutdown.clone(), &cancel).await;
            }
        };
        tokio::join!(collect_loop, deliver_loop);

        info!("Scheduler stopped");
    }

    async fn collect_loop(
        &self,
        mut interval: Interval,
        mut shutdown: watch::Receiver<bool>,
        cancel: &Cancellation,
    ) {
        loop {
            tokio::select! {
                _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,

                _ = interval.tick() => {
                    debug!("Running scheduled collection");
                    match self.collect_now(cancel).await {
                        Ok(report) => {
                            if report.stored > 0 {
                                info!("Scheduled collection: {} new articles", report.stored);
                            }
                        }
                        Err(Error::Cancelled) => break,
                        Err(e) => error!("Scheduled collection failed: {}", e),
                    }
                }
            }
        }
        debug!("Collection loop stopped");
    }

    async fn deliver_loop(
        &self,
        mut interval: Interval,
        mut shutdown: watch::Receiver<bool>,
        cancel: &Cancellation,
    ) {
        loop {
            tokio::select! {
                _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,

                _ = interval.tick() => {
                    debug!("Running scheduled delivery");
                    match self.deliver_now(cancel).await {
                        Ok(report) => {
                            if report.posted > 0 {
                                info!("Scheduled delivery: {} articles posted", report.posted);
                            }
                        }
                        Err(Error::Cancelled) => break,
                        Err(e) => error!("Scheduled delivery failed: {}", e),
                    }
                }
            }
        }
        debug!("Delivery loop stopped");
    }

    /// Run a single collection pass immediately
    pub async fn collect_now(&self, cancel: &Cancellation) -> Result<IngestReport> {
        let Some(collector) = self.collector.as_deref() else {
            return Ok(IngestReport::default());
        };

        let result = collect_all_sources(
            &self.db,
            collector,
            &self.summaries,
            self.config.collect.timeout(),
            cancel,
        )
        .await;
        match &result {
            Ok(report) => self.send_event(SchedulerEvent::ArticlesCollected {
                stored: report.stored,
                duplicates: report.duplicates,
            }),
            Err(Error::Cancelled) => {}
            Err(e) => self.send_event(SchedulerEvent::Error {
                task: "collect".to_string(),
                message: e.to_string(),
            }),
        }
        result
    }

    /// Run a single delivery pass immediately
    pub async fn deliver_now(&self, cancel: &Cancellation) -> Result<DeliveryReport> {
        let Some(publisher) = self.publisher.as_deref() else {
            return Ok(DeliveryReport::default());
        };

        let window = SelectionWindow::from_config(&self.config.delivery, Utc::now());
        let result = deliver_pending(&self.db, publisher, &window, cancel).await;
        match &result {
            Ok(report) => self.send_event(SchedulerEvent::ArticlesDelivered {
                posted: report.posted,
                failed: report.failed,
            }),
            Err(Error::Cancelled) => {}
            Err(e) => self.send_event(SchedulerEvent::Error {
                task: "deliver".to_string(),
                message: e.to_string(),
            }),
        }
        result
    }
}

fn interval(secs: u64) -> Option<Interval> {
    (secs > 0).then(|| tokio::time::interval(Duration::from_secs(secs)))
}
