//! The polling loop. One task owns the page, the banner and the timestamp;
//! interaction arrives as [`Command`]s over a channel.

use crate::fetch::{FetchError, SnapshotFetcher};
use crate::format::escape;
use crate::pages::{Deferred, Page, Scheduled};
use crate::status::{ErrorBanner, TimestampStamper, SLOT_FOOTER, SLOT_HEADER};
use futures::future::{self, LocalBoxFuture};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Select(String),
    JumpTo(String),
}

type PendingFetch<R> = LocalBoxFuture<'static, Result<Vec<R>, FetchError>>;

/// At most one fetch in flight per page.
pub struct FetchSlot<R> {
    pending: Option<PendingFetch<R>>,
}

impl<R> Default for FetchSlot<R> {
    fn default() -> Self {
        FetchSlot { pending: None }
    }
}

impl<R> FetchSlot<R> {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns false, dropping `fetch`, while a previous fetch is unresolved.
    pub fn start_if_idle(&mut self, fetch: PendingFetch<R>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(fetch);
        true
    }

    /// Cancels whatever is pending and starts `fetch` in its place.
    pub fn restart(&mut self, fetch: PendingFetch<R>) {
        self.pending = Some(fetch);
    }

    /// Resolves with the pending fetch's outcome; never resolves while idle.
    pub async fn wait(&mut self) -> Result<Vec<R>, FetchError> {
        let outcome = match self.pending.as_mut() {
            Some(fetch) => fetch.await,
            None => future::pending().await,
        };
        self.pending = None;
        outcome
    }
}

pub struct PageDriver<P: Page> {
    page: P,
    fetcher: SnapshotFetcher,
    banner: ErrorBanner,
    stamper: TimestampStamper,
    publisher: watch::Sender<String>,
    renders: u64,
}

impl<P: Page> PageDriver<P> {
    pub fn new(page: P, fetcher: SnapshotFetcher, publisher: watch::Sender<String>) -> Self {
        let driver = PageDriver {
            page,
            fetcher,
            banner: ErrorBanner::default(),
            stamper: TimestampStamper::default(),
            publisher,
            renders: 0,
        };
        driver.publish();
        driver
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    pub fn stamper(&self) -> &TimestampStamper {
        &self.stamper
    }

    /// Number of snapshots handed to the page so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    fn start_fetch(&self) -> PendingFetch<P::Record> {
        let fetcher = self.fetcher.clone();
        let endpoint = self.page.endpoint();
        async move { fetcher.fetch::<P::Record>(endpoint).await }.boxed_local()
    }

    pub fn apply(&mut self, outcome: Result<Vec<P::Record>, FetchError>) {
        match outcome {
            Ok(snapshot) => {
                info!(
                    "Rendering {} records from {}",
                    snapshot.len(),
                    self.page.endpoint()
                );
                self.page.render(snapshot);
                self.renders += 1;
                self.stamper.stamp();
                self.banner.clear();
            }
            Err(e) => {
                error!("Error fetching {}: {}", self.page.endpoint(), e);
                self.banner
                    .show(format!("{}: {}", self.page.failure_context(), e));
            }
        }
        self.publish();
    }

    /// One fetch-and-render cycle.
    pub async fn refresh(&mut self) {
        let outcome = self.start_fetch().await;
        self.apply(outcome);
    }

    /// Sends the server-side reload command and reports its outcome on the banner.
    pub async fn reload_command(&mut self) {
        match self.fetcher.reload().await {
            Ok(reply) => {
                info!(
                    "Backend reloaded at {}",
                    reply.reload_timestamp.as_deref().unwrap_or("unknown time")
                );
                self.banner.clear();
            }
            Err(FetchError::Command { message }) => {
                error!("Backend refused reload: {}", message);
                self.banner.show(format!("Reload failed: {}", message));
            }
            Err(e) => {
                error!("Reload request failed: {}", e);
                self.banner.show(format!("Reload request failed: {}", e));
            }
        }
        self.publish();
    }

    /// Reload command followed by a render attempt, whatever the command's outcome.
    pub async fn reload(&mut self) {
        self.reload_command().await;
        self.refresh().await;
    }

    fn publish(&self) {
        self.publisher.send_replace(self.document());
    }

    pub fn document(&self) -> String {
        format!(
            concat!(
                "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
                "<meta http-equiv=\"refresh\" content=\"5\"><title>{}</title></head><body>",
                "{}<header><h1>{}</h1><span class=\"lastUpdated\" data-slot=\"{}\">{}</span>",
                "<form method=\"post\" action=\"/reload\"><button>Reload data</button></form></header>",
                "<main>{}</main>",
                "<footer><span class=\"lastUpdated\" data-slot=\"{}\">{}</span></footer>",
                "</body></html>"
            ),
            self.page.title(),
            self.banner.markup(),
            self.page.title(),
            SLOT_HEADER,
            escape(self.stamper.slot(SLOT_HEADER).unwrap_or("")),
            self.page.markup(),
            SLOT_FOOTER,
            escape(self.stamper.slot(SLOT_FOOTER).unwrap_or("")),
        )
    }

    /// Polls every [`POLL_INTERVAL`] for as long as the future is driven. A
    /// tick that finds the previous fetch unresolved is skipped.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<Command>) {
        let mut ticker = time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut slot = FetchSlot::default();
        let mut deferred: FuturesUnordered<LocalBoxFuture<'static, Deferred>> =
            FuturesUnordered::new();
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !slot.start_if_idle(self.start_fetch()) {
                        debug!("Fetch of {} still pending, skipping tick", self.page.endpoint());
                    }
                }
                outcome = slot.wait() => self.apply(outcome),
                Some(task) = deferred.next(), if !deferred.is_empty() => {
                    self.page.on_deferred(task);
                    self.publish();
                }
                command = commands.recv(), if commands_open => match command {
                    Some(Command::Reload) => {
                        self.reload_command().await;
                        slot.restart(self.start_fetch());
                    }
                    Some(Command::Select(value)) => {
                        schedule(&mut deferred, self.page.select(&value));
                        self.publish();
                    }
                    Some(Command::JumpTo(key)) => {
                        schedule(&mut deferred, self.page.jump_to_lot(&key));
                        self.publish();
                    }
                    None => {
                        info!("Command channel closed, polling continues");
                        commands_open = false;
                    }
                },
            }
        }
    }
}

fn schedule(
    deferred: &mut FuturesUnordered<LocalBoxFuture<'static, Deferred>>,
    follow_ups: Vec<Scheduled>,
) {
    for Scheduled { after, task } in follow_ups {
        deferred.push(
            async move {
                time::sleep(after).await;
                task
            }
            .boxed_local(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::backend;
    use crate::pages::{CardsPage, OverviewPage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;
    use warp::http::StatusCode;
    use warp::Filter;

    const BUSCH: &str = r#"[{"lotName":"Busch","capacity":100,"inLotNow":40,"availableNow":60,
        "occupancyPercent":40.0,"availabilityColor":"green","totalSessions":12,
        "violationsCount":1,"latitude":40.52,"longitude":-74.46}]"#;

    fn summary_reply() -> warp::reply::Response {
        use warp::Reply;
        warp::reply::with_header(BUSCH, "content-type", "application/json").into_response()
    }

    fn driver<P: Page>(page: P, fetcher: SnapshotFetcher) -> (PageDriver<P>, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        (PageDriver::new(page, fetcher, tx), rx)
    }

    #[tokio::test]
    async fn successful_cycle_renders_stamps_and_clears_banner() {
        let fetcher = backend(warp::path!("api" / "summary").map(summary_reply));
        let (mut driver, rx) = driver(CardsPage::default(), fetcher);
        driver.banner.show("stale");
        driver.refresh().await;

        assert_eq!(driver.renders(), 1);
        assert!(!driver.banner().is_visible());
        assert!(driver
            .stamper()
            .slot(SLOT_HEADER)
            .unwrap()
            .starts_with("Last updated: "));
        assert!(driver.page().grid().card("Busch").is_some());
        assert!(rx.borrow().contains("data-lot=\"Busch\""));
    }

    #[tokio::test]
    async fn failed_cycle_keeps_stale_view_and_shows_context() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let routes = warp::path!("api" / "summary").map(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                summary_reply()
            } else {
                use warp::Reply;
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        });
        let (mut driver, rx) = driver(CardsPage::default(), backend(routes));
        driver.refresh().await;
        driver.refresh().await;

        assert_eq!(driver.renders(), 1);
        assert_eq!(
            driver.banner().text().unwrap(),
            "⚠ Failed to load lot data: HTTP 500"
        );
        let doc = rx.borrow().clone();
        assert!(doc.contains("data-lot=\"Busch\""));
        assert!(doc.contains("Failed to load lot data: HTTP 500"));
    }

    #[tokio::test]
    async fn refused_reload_shows_reason_and_still_renders() {
        let routes = warp::post()
            .and(warp::path!("api" / "reload"))
            .map(|| warp::reply::json(&serde_json::json!({"success": false, "error": "db down"})))
            .or(warp::get().and(warp::path!("api" / "summary")).map(summary_reply));
        let (mut driver, _rx) = driver(CardsPage::default(), backend(routes));

        driver.reload_command().await;
        assert!(driver.banner().text().unwrap().contains("db down"));
        assert_eq!(driver.banner().text().unwrap(), "⚠ Reload failed: db down");

        driver.reload().await;
        assert_eq!(driver.renders(), 1);
        assert!(driver.page().grid().card("Busch").is_some());
    }

    #[tokio::test]
    async fn unreachable_reload_reports_request_failure_and_still_tries_render() {
        let fetcher = SnapshotFetcher::new(Url::parse("http://127.0.0.1:9/").unwrap());
        let (mut driver, _rx) = driver(CardsPage::default(), fetcher);
        driver.reload_command().await;
        assert!(driver
            .banner()
            .text()
            .unwrap()
            .starts_with("⚠ Reload request failed: "));
        driver.reload().await;
        assert_eq!(driver.renders(), 0);
        assert!(driver
            .banner()
            .text()
            .unwrap()
            .starts_with("⚠ Failed to load lot data: "));
    }

    #[tokio::test]
    async fn slot_skips_while_pending_and_restart_replaces() {
        let mut slot: FetchSlot<u32> = FetchSlot::default();
        assert!(!slot.is_pending());
        assert!(slot.start_if_idle(future::pending().boxed_local()));
        assert!(!slot.start_if_idle(async { Ok(vec![1]) }.boxed_local()));
        slot.restart(async { Ok(vec![2]) }.boxed_local());
        assert_eq!(slot.wait().await, Ok(vec![2]));
        assert!(!slot.is_pending());
    }

    #[tokio::test]
    async fn run_loop_polls_and_applies_commands() {
        let summary_hits = Arc::new(AtomicUsize::new(0));
        let reload_hits = Arc::new(AtomicUsize::new(0));
        let (s, r) = (summary_hits.clone(), reload_hits.clone());
        let routes = warp::get()
            .and(warp::path!("api" / "summary"))
            .map(move || {
                s.fetch_add(1, Ordering::SeqCst);
                summary_reply()
            })
            .or(warp::post().and(warp::path!("api" / "reload")).map(move || {
                r.fetch_add(1, Ordering::SeqCst);
                warp::reply::json(&serde_json::json!({"success": true}))
            }));
        let (mut driver, rx) = driver(OverviewPage::default(), backend(routes));
        let (tx, mut commands) = mpsc::channel(8);

        // Let the first tick land before interacting.
        let _ = time::timeout(Duration::from_millis(400), driver.run(&mut commands)).await;
        assert_eq!(summary_hits.load(Ordering::SeqCst), 1);
        assert_eq!(driver.renders(), 1);

        tx.send(Command::JumpTo("Busch".to_string())).await.unwrap();
        tx.send(Command::Reload).await.unwrap();
        let _ = time::timeout(Duration::from_millis(600), driver.run(&mut commands)).await;

        assert_eq!(reload_hits.load(Ordering::SeqCst), 1);
        assert!(summary_hits.load(Ordering::SeqCst) >= 2);
        assert!(driver.page().grid().card("Busch").unwrap().highlighted);
        assert_eq!(driver.page().layer().surface().ops().scrolls, 1);
        assert!(rx.borrow().contains("card highlight"));
    }
}
