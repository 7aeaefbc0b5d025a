//! Local HTTP mirror of the rendered page. Interaction is forwarded to the
//! driver as commands; nothing here touches page state.

use crate::driver::Command;
use log::{error, info};
use std::collections::HashMap;
use tokio::sync::{mpsc::Sender, watch};
use warp::http::Uri;
use warp::Filter;

#[derive(Debug)]
struct ForwardError;

impl warp::reject::Reject for ForwardError {}

pub async fn run(tx: Sender<Command>, document: watch::Receiver<String>, port: u16) {
    info!("Serving dashboard mirror on port {}", port);
    warp::serve(routes(tx, document))
        .run(([0, 0, 0, 0], port))
        .await;
}

pub fn routes(
    tx: Sender<Command>,
    document: watch::Receiver<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let with_tx = warp::any().map(move || tx.clone());

    let page = warp::get()
        .and(warp::path::end())
        .map(move || warp::reply::html(document.borrow().clone()));

    let reload = warp::post()
        .and(warp::path!("reload"))
        .and(with_tx.clone())
        .and_then(|tx| forward(Command::Reload, tx));

    let select = warp::post()
        .and(warp::path!("select"))
        .and(warp::body::form())
        .and(with_tx.clone())
        .and_then(|form: HashMap<String, String>, tx| {
            forward(Command::Select(selection_value(&form)), tx)
        });

    let jump = warp::post()
        .and(warp::path!("jump"))
        .and(warp::body::form())
        .and(with_tx)
        .and_then(|form: HashMap<String, String>, tx| {
            let lot = form.get("lot").cloned().unwrap_or_default();
            forward(Command::JumpTo(lot), tx)
        });

    page.or(reload).or(select).or(jump)
}

/// A non-blank `plate` field is a plate search; otherwise `value` carries the
/// tagged selector string.
fn selection_value(form: &HashMap<String, String>) -> String {
    match form.get("plate").map(|p| p.trim()) {
        Some(plate) if !plate.is_empty() => format!("plate:{}", plate),
        _ => form.get("value").cloned().unwrap_or_default(),
    }
}

async fn forward(command: Command, tx: Sender<Command>) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Forwarding {:?} to page driver", command);
    if let Err(e) = tx.send(command).await {
        error!("Error forwarding command: {}", e);
        return Err(warp::reject::custom(ForwardError));
    }
    Ok(warp::redirect::see_other(Uri::from_static("/")))
}
