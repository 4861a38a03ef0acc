//! Background request execution.
//!
//! Every request gets its own short-lived thread and posts exactly one
//! [`FetchResponse`] back over the channel. Responses arrive in completion
//! order, not submission order, and nothing is ever cancelled.

use crate::app_core::fetch::{FetchRequest, FetchResponse};
use crate::data::ApiClient;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

pub struct Fetcher {
    client: Arc<ApiClient>,
    tx: Sender<FetchResponse>,
}

/// Creates a fetcher and the receiving end the UI loop drains.
pub fn spawn_fetcher(client: ApiClient) -> (Fetcher, Receiver<FetchResponse>) {
    let (tx, rx) = mpsc::channel();
    (
        Fetcher {
            client: Arc::new(client),
            tx,
        },
        rx,
    )
}

impl Fetcher {
    pub fn dispatch(&self, request: FetchRequest) {
        let label = request.label();
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tracing::debug!(request = %label, "dispatching");

        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", label))
            .spawn(move || {
                let response = execute(&client, request);
                // The receiver is gone only when the UI is shutting down.
                let _ = tx.send(response);
            });
        if let Err(err) = spawned {
            tracing::warn!(request = %label, "failed to spawn fetch thread: {}", err);
        }
    }
}

/// Runs one request to completion on the current thread.
pub fn execute(client: &ApiClient, request: FetchRequest) -> FetchResponse {
    let response = match request {
        FetchRequest::Dashboard { video_id } => FetchResponse::Dashboard {
            video_id,
            result: client.fetch_dashboard(video_id),
        },
        FetchRequest::Heatmap { video_id, ticket } => FetchResponse::Heatmap {
            video_id,
            ticket,
            result: client.fetch_heatmap(video_id),
        },
        FetchRequest::Cell {
            video_id,
            cell,
            ticket,
        } => FetchResponse::Cell {
            video_id,
            cell,
            ticket,
            result: client.fetch_cell(video_id, cell),
        },
        FetchRequest::Snapshot {
            video_id,
            ticket,
            url,
        } => {
            let result = client.fetch_snapshot(&url);
            FetchResponse::Snapshot {
                video_id,
                ticket,
                url,
                result,
            }
        }
        FetchRequest::Videos => FetchResponse::Videos {
            result: client.fetch_videos(),
        },
    };
    if let Some(err) = response_error(&response) {
        tracing::warn!("request failed: {}", err);
    }
    response
}

fn response_error(response: &FetchResponse) -> Option<&crate::error::DashboardError> {
    match response {
        FetchResponse::Dashboard { result, .. } => result.as_ref().err(),
        FetchResponse::Heatmap { result, .. } => result.as_ref().err(),
        FetchResponse::Cell { result, .. } => result.as_ref().err(),
        FetchResponse::Snapshot { result, .. } => result.as_ref().err(),
        FetchResponse::Videos { result } => result.as_ref().err(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_core::geometry::CellIndex;
    use std::time::Duration;

    fn unreachable_client() -> ApiClient {
        // Port 9 (discard) on loopback refuses connections on test machines.
        ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn failed_request_still_produces_a_response() {
        let response = execute(
            &unreachable_client(),
            FetchRequest::Cell {
                video_id: 1,
                cell: CellIndex::new(2, 3),
                ticket: 4,
            },
        );
        match response {
            FetchResponse::Cell {
                video_id,
                cell,
                ticket,
                result,
            } => {
                assert_eq!(video_id, 1);
                assert_eq!(cell, CellIndex::new(2, 3));
                assert_eq!(ticket, 4);
                assert!(result.is_err());
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn snapshot_response_keeps_ticket_and_url() {
        let response = execute(
            &unreachable_client(),
            FetchRequest::Snapshot {
                video_id: 2,
                ticket: 6,
                url: "http://127.0.0.1:9/static/snaps/2_40.jpg".to_string(),
            },
        );
        match response {
            FetchResponse::Snapshot {
                video_id,
                ticket,
                url,
                result,
            } => {
                assert_eq!((video_id, ticket), (2, 6));
                assert!(url.ends_with("2_40.jpg"));
                assert!(result.is_err());
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn dispatch_delivers_over_channel() {
        let (fetcher, rx) = spawn_fetcher(unreachable_client());
        fetcher.dispatch(FetchRequest::Videos);
        let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(response, FetchResponse::Videos { result: Err(_) }));
    }
}
