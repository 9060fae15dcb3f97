//! In-process publish/subscribe for settings changes.
//!
//! Subscribers hold a [`broadcast::Receiver`]; dropping it unsubscribes.
//! The server subscribes once at startup through
//! [`AppState::template_settings_events`](crate::app::AppState::template_settings_events)
//! and feeds the receiver to [`spawn_change_log`].

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::models::TemplateSettings;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSettingsChanged {
    pub tenant_id: Uuid,
    pub settings: TemplateSettings,
}

#[derive(Clone)]
pub struct TemplateSettingsBus {
    sender: broadcast::Sender<TemplateSettingsChanged>,
}

impl TemplateSettingsBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TemplateSettingsChanged> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that received the event
    pub fn publish(&self, event: TemplateSettingsChanged) -> usize {
        let tenant_id = event.tenant_id;
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!("Template settings for {} delivered to {} subscribers", tenant_id, receivers);
                receivers
            }
            // no subscribers
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TemplateSettingsBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes one audit line per template settings change until every sender is gone
pub fn spawn_change_log(mut events: broadcast::Receiver<TemplateSettingsChanged>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let enabled: Vec<&str> = event.settings.enabled_templates.iter().map(|t| t.as_str()).collect();
                    info!(
                        tenant_id = %event.tenant_id,
                        updated_by = ?event.settings.updated_by,
                        "Note templates changed: default {}, enabled [{}]",
                        event.settings.default_template,
                        enabled.join(", ")
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Template settings log fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
