mod config;
mod driver;
mod fetch;
mod format;
mod map;
mod pages;
mod reconcile;
mod selector;
mod server;
mod status;
mod table;
mod types;

use config::Config;
use driver::{Command, PageDriver};
use env_logger::Env;
use fetch::SnapshotFetcher;
use log::{error, info};
use pages::{CardsPage, MapPage, OverviewPage, Page, PageKind, UnregisteredPage, ViolationsPage};
use tokio::sync::mpsc::{channel, Receiver};
use tokio::sync::watch;

#[macro_use]
extern crate failure;

async fn drive<P: Page>(
    page: P,
    fetcher: SnapshotFetcher,
    publisher: watch::Sender<String>,
    mut rx: Receiver<Command>,
) {
    let mut driver = PageDriver::new(page, fetcher, publisher);
    driver.run(&mut rx).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    info!(
        "Starting lot-watch: {:?} page against {}",
        config.page, config.backend
    );

    let (tx, rx) = channel(8);
    let (publisher, document) = watch::channel(String::new());
    let fetcher = SnapshotFetcher::new(config.backend.clone());
    let server_task = tokio::spawn(server::run(tx, document, config.mirror_port));
    let page = async move {
        match config.page {
            PageKind::Dashboard => drive(CardsPage::default(), fetcher, publisher, rx).await,
            PageKind::Map => drive(MapPage::default(), fetcher, publisher, rx).await,
            PageKind::Overview => drive(OverviewPage::default(), fetcher, publisher, rx).await,
            PageKind::Unregistered => {
                drive(UnregisteredPage::default(), fetcher, publisher, rx).await
            }
            PageKind::Violations => drive(ViolationsPage::default(), fetcher, publisher, rx).await,
        }
    };
    tokio::select! {
        _ = page => {
            error!("Page driver stopped");
        }
        result = server_task => {
            if let Err(e) = result {
                error!("Mirror server task failed: {}", e);
            }
        }
    }
    info!("Exiting main");
}
