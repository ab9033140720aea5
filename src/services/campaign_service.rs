//! services/campaign_service.rs
//! Convierte eventos de campaña en registros de actualización pendientes.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    errors::ValidationError,
    models::{
        campaign_model::{CampaignEvent, CampaignEventRequest},
        update_model::{CreateUpdateRequest, UpdateContent, UpdateRecord},
    },
    services::{
        event_bus::{EventBus, UpdateEvent},
        scheduling_service::SchedulingService,
        update_service::UpdateService,
    },
};

#[derive(Clone, Debug)]
pub struct CampaignService {
    update_service: UpdateService,
    scheduling_service: SchedulingService,
    events: EventBus,
}

impl CampaignService {
    pub fn new(
        update_service: UpdateService,
        scheduling_service: SchedulingService,
        events: EventBus,
    ) -> Self {
        Self {
            update_service,
            scheduling_service,
            events,
        }
    }

    /// Crea una actualización "notification" o "alert" para los destinatarios
    /// de la campaña. Queda "pending": el dispatcher la envía en la próxima pasada.
    pub async fn process_campaign_event(
        &self,
        campaign_id: &str,
        req: CampaignEventRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateRecord> {
        if campaign_id.trim().is_empty() {
            return Err(ValidationError::Invalid("campaign id must not be empty".to_string()).into());
        }
        log::info!(
            "(campaigns) Processing {} event for campaign {}",
            req.event.as_str(),
            campaign_id
        );

        let recipients = match req.recipients {
            Some(list) => list,
            None => self.scheduling_service.campaign_recipients(campaign_id).await?,
        };
        if recipients.is_empty() {
            return Err(ValidationError::NoRecipients.into());
        }

        let record = self
            .update_service
            .create_update(
                CreateUpdateRequest {
                    campaign_id: campaign_id.to_string(),
                    update_type: req.event.update_type().to_string(),
                    content: event_content(campaign_id, &req.event),
                    recipients,
                    channel_id: req.channel_id,
                    scheduled_time: None,
                },
                now,
            )
            .await?;

        self.events.publish(UpdateEvent::CampaignEventProcessed {
            campaign_id: campaign_id.to_string(),
            event: req.event,
            update_id: record.id.clone(),
        });
        Ok(record)
    }
}

pub fn event_content(campaign_id: &str, event: &CampaignEvent) -> UpdateContent {
    match event {
        CampaignEvent::CampaignCreated { name, description } => UpdateContent {
            title: format!(
                "New Campaign Created: {}",
                name.as_deref().unwrap_or(campaign_id)
            ),
            summary: description
                .clone()
                .unwrap_or_else(|| "No description provided".to_string()),
            metrics: Default::default(),
            highlights: Vec::new(),
            recommendations: Vec::new(),
        },
        CampaignEvent::HighEngagement {
            content_id,
            metrics,
        } => UpdateContent {
            title: format!("High Engagement Alert: {campaign_id}"),
            summary: format!(
                "Unusually high engagement detected for content: {}",
                content_id.as_deref().unwrap_or("unknown")
            ),
            metrics: metrics.clone(),
            highlights: Vec::new(),
            recommendations: Vec::new(),
        },
    }
}
