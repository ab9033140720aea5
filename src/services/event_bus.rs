//! services/event_bus.rs
//! Bus de eventos tipado. Vive en el contexto de la app y se pasa a cada servicio.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::models::campaign_model::CampaignEvent;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    UpdateCreated {
        update_id: String,
        campaign_id: String,
        scheduled_time: Option<DateTime<Utc>>,
    },
    ScheduleComputed {
        campaign_id: String,
        scheduled: usize,
        unscheduled: usize,
    },
    UpdateSent {
        update_id: String,
        sent_time: DateTime<Utc>,
    },
    RetryScheduled {
        update_id: String,
        retry_count: u32,
        next_attempt: DateTime<Utc>,
    },
    UpdateFailed {
        update_id: String,
        reason: String,
    },
    CampaignEventProcessed {
        campaign_id: String,
        event: CampaignEvent,
        update_id: String,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<UpdateEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.sender.subscribe()
    }

    /// Publicar sin suscriptores no es un error.
    pub fn publish(&self, event: UpdateEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("(event_bus) event dropped: no subscribers");
        }
    }
}

/// Suscriptor que vuelca cada evento al log.
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => log::info!("(event) {}", json),
                    Err(e) => log::warn!("(event) could not serialize {:?}: {}", event, e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("(event) logger lagged, {} events skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
