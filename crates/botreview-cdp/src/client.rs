//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::error::CdpError;
use crate::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use crate::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Responder = oneshot::Sender<Result<Value, CdpError>>;

/// Upper bound on the wait for any single command response.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser WebSocket shared by the client and every page session.
pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    pending: Mutex<HashMap<u64, Responder>>,
    request_id: AtomicU64,
}

impl Connection {
    /// Send a command, optionally scoped to a flattened session, and wait
    /// for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    fn resolve(&self, response: CdpResponse) {
        let Some(id) = response.id else {
            if let Some(method) = response.method {
                trace!(session = ?response.session_id, "CDP event: {}", method);
            }
            return;
        };

        let Some(tx) = self.pending.lock().remove(&id) else {
            debug!("Dropping response for unknown request {}", id);
            return;
        };

        let result = match response.error {
            Some(error) => Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(result);
    }

    /// Fail every outstanding request once the socket is gone.
    fn close(&self) {
        self.pending.lock().clear();
    }
}

/// Read `/json/version` to find the browser WebSocket URL.
pub async fn discover(endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let endpoint = endpoint.trim_end_matches('/');
    let version_url = format!("{}/json/version", endpoint);
    debug!("Fetching browser version from {}", version_url);

    reqwest::get(&version_url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))
}

/// Tabs listed by `/json/list`, without workers and other non-page targets.
pub async fn fetch_pages(endpoint: &str) -> Result<Vec<PageInfo>, CdpError> {
    let url = format!("{}/json/list", endpoint.trim_end_matches('/'));
    let targets: Vec<PageInfo> = reqwest::get(&url)
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(targets.into_iter().filter(PageInfo::is_page).collect())
}

/// A page whose id equals `needle`, or failing that, whose URL contains it.
pub fn select_page<'a>(pages: &'a [PageInfo], needle: &str) -> Option<&'a PageInfo> {
    pages
        .iter()
        .find(|page| page.id == needle)
        .or_else(|| pages.iter().find(|page| page.url.contains(needle)))
}

/// CDP client attached to a running browser.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    browser: String,
    connection: Arc<Connection>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser debugging endpoint, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = discover(&http_endpoint).await?;
        debug!("Found browser: {}", version.browser);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;
        let (ws_sink, ws_source) = ws_stream.split();

        let connection = Arc::new(Connection {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            pending: Mutex::new(HashMap::new()),
            request_id: AtomicU64::new(1),
        });

        let recv_task = {
            let connection = connection.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, &connection).await;
                connection.close();
            })
        };

        debug!("CDP client connected to {}", version.web_socket_debugger_url);

        Ok(Self {
            http_endpoint,
            browser: version.browser,
            connection,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, connection: &Connection) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(response) => connection.resolve(response),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Browser product string, e.g. `Chrome/126.0.6478.126`.
    pub fn browser(&self) -> &str {
        &self.browser
    }

    pub fn endpoint(&self) -> &str {
        &self.http_endpoint
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.connection.call(method, params, None).await
    }

    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        fetch_pages(&self.http_endpoint).await
    }

    /// Resolve `needle` (target id or URL fragment) to an open page.
    pub async fn find_page(&self, needle: &str) -> Result<PageInfo, CdpError> {
        let pages = self.list_pages().await?;
        select_page(&pages, needle)
            .cloned()
            .ok_or_else(|| CdpError::PageNotFound(needle.to_string()))
    }

    /// Attach a flattened session to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.connection.clone(),
        );
        if let Err(e) = session.enable_domains().await {
            warn!(target_id, "Failed to prepare page session, detaching: {}", e);
            if let Err(detach) = self.detach_page(session).await {
                debug!(target_id, "Detach after failed attach: {}", detach);
            }
            return Err(e);
        }
        Ok(session)
    }

    /// Detach a session. The page itself stays open.
    pub async fn detach_page(&self, session: PageSession) -> Result<(), CdpError> {
        self.call(
            "Target.detachFromTarget",
            Some(json!({"sessionId": session.session_id()})),
        )
        .await?;
        debug!("Detached from page {}", session.target_id());
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, url: &str) -> PageInfo {
        PageInfo {
            id: id.to_string(),
            page_type: "page".to_string(),
            title: String::new(),
            url: url.to_string(),
            web_socket_debugger_url: None,
        }
    }

    #[test]
    fn test_select_page_prefers_exact_id() {
        let pages = vec![
            page("AB12", "https://github.com/acme/AB12"),
            page("CD34", "https://github.com/acme/widgets/pull/7"),
        ];
        assert_eq!(select_page(&pages, "CD34").unwrap().id, "CD34");
        assert_eq!(select_page(&pages, "AB12").unwrap().id, "AB12");
    }

    #[test]
    fn test_select_page_by_url_fragment() {
        let pages = vec![
            page("AB12", "https://github.com/"),
            page("CD34", "https://github.com/acme/widgets/pull/7"),
        ];
        assert_eq!(select_page(&pages, "widgets/pull/7").unwrap().id, "CD34");
        assert!(select_page(&pages, "gadgets").is_none());
    }
}
