//! tests/mod.rs
//! Utilidades compartidas por las pruebas: cada test usa su propio SQLite temporal.

mod email_render_tests;
mod scheduling_tests;
mod time_selector_tests;

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tempfile::TempDir;

use crate::db::{run_migrations, setup_database};
use crate::models::channel_model::{ChannelConfig, ChannelType, CreateChannelRequest, DistributionChannel};
use crate::models::recipient_model::{CreateRecipientRequest, Recipient};
use crate::services::calendar_service::CalendarService;
use crate::services::campaign_service::CampaignService;
use crate::services::channel_service::ChannelService;
use crate::services::delivery_service::DeliveryService;
use crate::services::dispatcher::Dispatcher;
use crate::services::email_service::EmailService;
use crate::services::event_bus::EventBus;
use crate::services::preference_service::PreferenceService;
use crate::services::recipient_service::RecipientService;
use crate::services::scheduling_service::SchedulingService;
use crate::services::update_service::UpdateService;

pub struct TestContext {
    _dir: TempDir,
    pub db_pool: Pool<Sqlite>,
    pub events: EventBus,
    pub preference_service: PreferenceService,
    pub calendar_service: CalendarService,
    pub recipient_service: RecipientService,
    pub channel_service: ChannelService,
    pub update_service: UpdateService,
    pub scheduling_service: SchedulingService,
    pub campaign_service: CampaignService,
    pub dispatcher: Dispatcher,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_pool = setup_database(&dir.path().join("test.db"))
            .await
            .expect("database");
        run_migrations(&db_pool).await.expect("migrations");

        let events = EventBus::default();
        let preference_service = PreferenceService::new(db_pool.clone());
        let calendar_service = CalendarService::new(db_pool.clone());
        let recipient_service = RecipientService::new(db_pool.clone());
        let channel_service = ChannelService::new(db_pool.clone());
        let update_service = UpdateService::new(db_pool.clone(), events.clone());
        let scheduling_service = SchedulingService::new(
            db_pool.clone(),
            preference_service.clone(),
            calendar_service.clone(),
            update_service.clone(),
            events.clone(),
        );
        let campaign_service = CampaignService::new(
            update_service.clone(),
            scheduling_service.clone(),
            events.clone(),
        );
        let dispatcher = Dispatcher::new(
            update_service.clone(),
            recipient_service.clone(),
            channel_service.clone(),
            DeliveryService::new(EmailService::new(), reqwest::Client::new()),
        );

        TestContext {
            _dir: dir,
            db_pool,
            events,
            preference_service,
            calendar_service,
            recipient_service,
            channel_service,
            update_service,
            scheduling_service,
            campaign_service,
            dispatcher,
        }
    }

    pub async fn add_recipient(&self, name: &str, channels: Vec<ChannelType>) -> Recipient {
        self.add_recipient_with_hook(name, channels, None).await
    }

    pub async fn add_recipient_with_hook(
        &self,
        name: &str,
        channels: Vec<ChannelType>,
        webhook_url: Option<String>,
    ) -> Recipient {
        self.recipient_service
            .add_recipient(
                CreateRecipientRequest {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    role: None,
                    channels: Some(channels),
                    webhook_url,
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .expect("recipient")
    }

    pub async fn add_channel(&self, name: &str, config: ChannelConfig) -> DistributionChannel {
        self.channel_service
            .create_channel(
                CreateChannelRequest {
                    name: name.to_string(),
                    config,
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .expect("channel")
    }
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}
