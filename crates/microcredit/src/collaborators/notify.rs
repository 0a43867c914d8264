use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::proposals::{Notifier, NotifyError, ProposalEvent};

/// Form-to-mail relay (Formspree-style) that forwards each new proposal to the operator inbox.
///
/// With no endpoint configured the notifier only logs, so local setups work without a relay.
#[derive(Debug, Clone)]
pub struct MailRelayNotifier {
    client: Client,
    endpoint: Option<String>,
    recipient: String,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    email: &'a str,
    #[serde(rename = "_subject")]
    subject: &'a str,
    message: &'a str,
}

impl MailRelayNotifier {
    pub fn new(
        endpoint: Option<String>,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            recipient: recipient.into(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn notify(&self, event: ProposalEvent) -> Result<(), NotifyError> {
        let ProposalEvent::Submitted {
            record,
            subject,
            body,
        } = event;

        let Some(endpoint) = &self.endpoint else {
            info!(proposal = %record.id, subject = %subject, "mail relay not configured; notification skipped");
            return Ok(());
        };

        let payload = RelayMessage {
            email: &self.recipient,
            subject: &subject,
            message: &body,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        debug!(proposal = %record.id, "proposal notification relayed");
        Ok(())
    }
}
