use crate::types::ReloadResponse;
use log::debug;
use serde::de::DeserializeOwned;
use url::Url;

// Relative to the backend base URL, which keeps any path prefix it has.
pub const SUMMARY_ENDPOINT: &str = "api/summary";
pub const UNREGISTERED_ENDPOINT: &str = "api/unregistered";
pub const VIOLATIONS_ENDPOINT: &str = "api/violations";
pub const RELOAD_ENDPOINT: &str = "api/reload";

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent, or came back with a non-success status.
    #[fail(display = "{}", message)]
    Network { message: String },
    /// The body was not JSON of the expected shape.
    #[fail(display = "{}", message)]
    Parse { message: String },
    /// The reload command answered `success: false`.
    #[fail(display = "{}", message)]
    Command { message: String },
}

/// One request per call, no retries. The polling interval is the retry.
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    client: reqwest::Client,
    base: Url,
}

impl SnapshotFetcher {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        SnapshotFetcher {
            client: reqwest::Client::new(),
            base,
        }
    }

    fn url(&self, endpoint: &str) -> Result<Url, FetchError> {
        self.base.join(endpoint).map_err(|e| FetchError::Network {
            message: format!("Bad endpoint {}: {}", endpoint, e),
        })
    }

    pub async fn fetch<R: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<R>, FetchError> {
        let url = self.url(endpoint)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network {
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        let body = response.bytes().await.map_err(|e| FetchError::Network {
            message: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            message: e.to_string(),
        })
    }

    /// Issues the server-side reload command. A reachable server that answers
    /// `success: false` yields [`FetchError::Command`] carrying its reason,
    /// whatever the status. Success needs both a 2xx status and `success: true`.
    pub async fn reload(&self) -> Result<ReloadResponse, FetchError> {
        let url = self.url(RELOAD_ENDPOINT)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                message: e.to_string(),
            })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| FetchError::Network {
            message: e.to_string(),
        })?;
        let reply = match serde_json::from_slice::<ReloadResponse>(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(FetchError::Network {
                    message: format!("HTTP {}", status.as_u16()),
                })
            }
            Err(e) => {
                return Err(FetchError::Parse {
                    message: e.to_string(),
                })
            }
        };
        if !reply.success {
            return Err(FetchError::Command {
                message: reply.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network {
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(reply)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::LotSummary;
    use std::net::SocketAddr;
    use warp::http::StatusCode;
    use warp::Filter;

    /// Serves `routes` on an ephemeral local port and returns a fetcher aimed at it.
    pub(crate) fn backend<F>(routes: F) -> SnapshotFetcher
    where
        F: Filter<Error = warp::Rejection> + Clone + Send + Sync + 'static,
        F::Extract: warp::Reply,
    {
        let (addr, server): (SocketAddr, _) =
            warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        SnapshotFetcher::new(Url::parse(&format!("http://{}/", addr)).unwrap())
    }

    #[tokio::test]
    async fn fetches_and_parses_summary() {
        let routes = warp::get().and(warp::path!("api" / "summary")).map(|| {
            warp::reply::json(&serde_json::json!([{
                "lotName": "Busch", "capacity": 10, "inLotNow": 4, "availableNow": 6,
                "occupancyPercent": 40.0, "availabilityColor": "green",
                "totalSessions": 3, "violationsCount": 0, "latitude": 40.5, "longitude": -74.4
            }]))
        });
        let fetcher = backend(routes);
        let lots: Vec<LotSummary> = fetcher.fetch(SUMMARY_ENDPOINT).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].lot_name, "Busch");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let routes = warp::path!("api" / "summary")
            .map(|| warp::reply::with_status("nope", StatusCode::SERVICE_UNAVAILABLE));
        let fetcher = backend(routes);
        let err = fetcher
            .fetch::<LotSummary>(SUMMARY_ENDPOINT)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Network {
                message: "HTTP 503".to_string()
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let routes = warp::path!("api" / "violations").map(|| "{not json");
        let fetcher = backend(routes);
        let err = fetcher
            .fetch::<LotSummary>(VIOLATIONS_ENDPOINT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let fetcher = SnapshotFetcher::new(Url::parse("http://127.0.0.1:9/").unwrap());
        let err = fetcher
            .fetch::<LotSummary>(SUMMARY_ENDPOINT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[tokio::test]
    async fn reload_failure_carries_reason() {
        let routes = warp::post()
            .and(warp::path!("api" / "reload"))
            .map(|| warp::reply::json(&serde_json::json!({"success": false, "error": "db down"})));
        let fetcher = backend(routes);
        let err = fetcher.reload().await.unwrap_err();
        assert_eq!(err.to_string(), "db down");
    }

    #[tokio::test]
    async fn reload_claiming_success_with_error_status_is_network_error() {
        let routes = warp::post().and(warp::path!("api" / "reload")).map(|| {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"success": true})),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        });
        let fetcher = backend(routes);
        assert_eq!(
            fetcher.reload().await.unwrap_err(),
            FetchError::Network {
                message: "HTTP 500".to_string()
            }
        );
    }

    #[tokio::test]
    async fn endpoints_resolve_under_backend_path_prefix() {
        let routes = warp::get()
            .and(warp::path!("app" / "api" / "violations"))
            .map(|| warp::reply::json(&serde_json::json!([])));
        let fetcher = backend(routes);
        let prefixed = SnapshotFetcher::new(fetcher.base.join("app").unwrap());
        assert_eq!(prefixed.base.path(), "/app/");
        let records: Vec<LotSummary> = prefixed.fetch(VIOLATIONS_ENDPOINT).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn reload_success_ignores_stale_error_field() {
        let routes = warp::post().and(warp::path!("api" / "reload")).map(|| {
            warp::reply::json(&serde_json::json!({
                "success": true, "reloadTimestamp": "2026-10-19 12:00:00", "error": "old"
            }))
        });
        let fetcher = backend(routes);
        let reply = fetcher.reload().await.unwrap();
        assert_eq!(reply.reload_timestamp.as_deref(), Some("2026-10-19 12:00:00"));
    }
}
