use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::{StrategyReport, WireMessage};
use crate::transport::{Connection, Outbound};

/// Report view state: loading until the single strategy result arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    Loading,
    Ready(StrategyReport),
}

/// Receiver side of the report sub-protocol: a one-shot state machine fed
/// with decoded frames from a dedicated connection.
#[derive(Debug, Default)]
pub struct ReportClient {
    state: ReportState,
}

impl Default for ReportState {
    fn default() -> Self {
        ReportState::Loading
    }
}

impl ReportClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded frame from the report connection.
    ///
    /// The first `strategy_result` while loading completes the exchange and
    /// returns `true`. A second result is ignored (the first write wins), as
    /// is any other frame kind on this connection.
    pub fn apply(&mut self, frame: WireMessage) -> bool {
        match frame {
            WireMessage::StrategyResult(report) => match self.state {
                ReportState::Loading => {
                    self.state = ReportState::Ready(report);
                    true
                }
                ReportState::Ready(_) => {
                    warn!("ignoring duplicate strategy_result");
                    false
                }
            },
            other => {
                debug!("ignoring {} frame on report connection", other.kind());
                false
            }
        }
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ReportState::Ready(_))
    }

    /// The received report, once the exchange has completed.
    pub fn report(&self) -> Option<&StrategyReport> {
        match &self.state {
            ReportState::Ready(report) => Some(report),
            ReportState::Loading => None,
        }
    }
}

/// Run the report exchange on a dedicated, freshly opened connection: send
/// exactly one `strategy_request`, then consume frames until the matching
/// result arrives. The request is sent before anything is read, so a result
/// can never precede it.
///
/// With `wait` unset this waits indefinitely and the caller keeps showing a
/// loading state; setting it turns a missing result into
/// [`ClientError::ReportTimeout`]. Losing the connection while loading
/// yields [`ClientError::ConnectionClosed`].
pub async fn fetch_report(
    connection: &mut Connection,
    customer_id: Option<String>,
    wait: Option<Duration>,
) -> Result<StrategyReport, ClientError> {
    let request = WireMessage::StrategyRequest { customer_id };
    if !connection.outbound().transmit(&request) {
        return Err(ClientError::ConnectionClosed);
    }
    debug!("strategy_request sent, awaiting result");

    let mut client = ReportClient::new();
    loop {
        let frame = match wait {
            Some(limit) => timeout(limit, connection.recv())
                .await
                .map_err(|_| ClientError::ReportTimeout)?,
            None => connection.recv().await,
        };
        let Some(frame) = frame else {
            return Err(ClientError::ConnectionClosed);
        };

        if client.apply(frame) {
            if let Some(report) = client.report() {
                info!("strategy report received");
                return Ok(report.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use crate::models::Role;

    fn result_frame(summary: &str) -> WireMessage {
        WireMessage::StrategyResult(StrategyReport {
            summary: summary.to_string(),
            keyword: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        })
    }

    #[test]
    fn starts_loading() {
        let client = ReportClient::new();
        assert_eq!(client.state(), &ReportState::Loading);
        assert!(!client.is_ready());
        assert!(client.report().is_none());
    }

    #[test]
    fn first_result_completes_the_exchange() {
        let mut client = ReportClient::new();
        assert!(client.apply(result_frame("ok")));
        assert!(client.is_ready());

        let report = client.report().unwrap();
        assert_eq!(report.summary, "ok");
        assert_eq!(report.keyword, vec!["a", "b"]);
    }

    #[test]
    fn second_result_is_ignored_first_write_wins() {
        let mut client = ReportClient::new();
        assert!(client.apply(result_frame("first")));
        assert!(!client.apply(result_frame("second")));
        assert_eq!(client.report().unwrap().summary, "first");
    }

    #[test]
    fn non_result_frames_are_ignored_while_loading() {
        let mut client = ReportClient::new();
        assert!(!client.apply(WireMessage::Message(ChatMessage::new(Role::Store, "hi"))));
        assert!(!client.apply(WireMessage::StrategyRequest { customer_id: None }));
        assert!(!client.is_ready());

        // The exchange still completes after the noise.
        assert!(client.apply(result_frame("late")));
        assert_eq!(client.report().unwrap().summary, "late");
    }
}
