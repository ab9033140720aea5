use std::time::Duration as StdDuration;

use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::models::recipient_model::CreateRecipientRequest;
use crate::models::update_model::{CreateUpdateRequest, UpdateContent};
use crate::services::calendar_service::CalendarService;
use crate::services::campaign_service::CampaignService;
use crate::services::channel_service::ChannelService;
use crate::services::delivery_service::DeliveryService;
use crate::services::dispatcher::{DispatchOutcome, Dispatcher, DEFAULT_DISPATCH_LIMIT};
use crate::services::email_service::EmailService;
use crate::services::event_bus::{spawn_event_logger, EventBus};
use crate::services::preference_service::PreferenceService;
use crate::services::recipient_service::RecipientService;
use crate::services::scheduling_service::SchedulingService;
use crate::services::update_service::UpdateService;

mod app;
mod config;
mod db;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

#[derive(Debug, Parser)]
#[command(name = "update-dispatch", version, about = "Campaign update scheduling and delivery")]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    /// También aplican cuando no se indica subcomando
    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
struct ServeArgs {
    #[arg(long, global = true, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind: String,
    #[arg(long, global = true, env = "PORT", default_value_t = 5022)]
    port: u16,
    /// Segundos entre pasadas automáticas del dispatcher (0 = desactivado)
    #[arg(long, global = true, env = "DISPATCH_EVERY", default_value_t = 0)]
    dispatch_every: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Levanta la API HTTP (por defecto)
    Serve,
    /// Una pasada del dispatcher (para cron)
    Dispatch {
        #[arg(long, default_value_t = DEFAULT_DISPATCH_LIMIT)]
        limit: u32,
    },
    /// Crea y envía una actualización de prueba a un destinatario
    SendUpdate {
        #[arg(long)]
        recipient_email: String,
        #[arg(long)]
        recipient_name: String,
        #[arg(long)]
        campaign_name: String,
        #[arg(long)]
        title: String,
    },
}

/// Contexto de la app: cada servicio recibe sus recursos al construirse.
#[derive(Clone)]
struct AppContext {
    events: EventBus,
    preference_service: PreferenceService,
    calendar_service: CalendarService,
    recipient_service: RecipientService,
    channel_service: ChannelService,
    update_service: UpdateService,
    scheduling_service: SchedulingService,
    campaign_service: CampaignService,
    dispatcher: Dispatcher,
}

impl AppContext {
    fn new(db_pool: Pool<Sqlite>) -> Self {
        let events = EventBus::default();
        let preference_service = PreferenceService::new(db_pool.clone());
        let calendar_service = CalendarService::new(db_pool.clone());
        let recipient_service = RecipientService::new(db_pool.clone());
        let channel_service = ChannelService::new(db_pool.clone());
        let update_service = UpdateService::new(db_pool.clone(), events.clone());
        let scheduling_service = SchedulingService::new(
            db_pool,
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
        let delivery_service = DeliveryService::new(EmailService::new(), reqwest::Client::new());
        let dispatcher = Dispatcher::new(
            update_service.clone(),
            recipient_service.clone(),
            channel_service.clone(),
            delivery_service,
        );

        AppContext {
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
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let cli = Cli::parse();

    let db_pool = db::setup_database(&cli.config.db_path).await?;
    db::run_migrations(&db_pool).await?;
    let ctx = AppContext::new(db_pool);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(ctx, &cli.config, &cli.serve).await,
        Command::Dispatch { limit } => {
            sync_email_channel(&ctx, &cli.config, true).await?;
            let processed = ctx.dispatcher.process_due(limit).await?;
            log::info!("Dispatch finished: {} update(s) sent", processed);
            Ok(())
        }
        Command::SendUpdate {
            recipient_email,
            recipient_name,
            campaign_name,
            title,
        } => {
            sync_email_channel(&ctx, &cli.config, true).await?;
            send_single_update(&ctx, recipient_email, recipient_name, campaign_name, title).await
        }
    }
}

/// Sin remitente configurado, `serve` arranca igual pero sin canal de email por defecto.
async fn sync_email_channel(ctx: &AppContext, config: &AppConfig, required: bool) -> Result<()> {
    if config.sender_email.is_none() && !required {
        log::warn!("No sender email configured; default email channel not synced");
        return Ok(());
    }

    let email_config = config
        .email_channel_config()
        .context("Invalid SMTP configuration")?;
    ctx.channel_service
        .sync_default_email_channel(email_config, Utc::now())
        .await?;
    Ok(())
}

async fn serve(ctx: AppContext, config: &AppConfig, args: &ServeArgs) -> Result<()> {
    let dispatch_every = args.dispatch_every;
    sync_email_channel(&ctx, config, false).await?;
    let _event_logger = spawn_event_logger(&ctx.events);

    if dispatch_every > 0 {
        let dispatcher = ctx.dispatcher.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(StdDuration::from_secs(dispatch_every));
            loop {
                ticker.tick().await;
                if let Err(e) = dispatcher.process_due(DEFAULT_DISPATCH_LIMIT).await {
                    log::error!("Scheduled dispatch failed: {:#}", e);
                }
            }
        });
        log::info!("Automatic dispatch every {}s", dispatch_every);
    }

    log::info!("Levantando servidor en {}:{}", args.bind, args.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ctx.preference_service.clone()))
            .app_data(web::Data::new(ctx.calendar_service.clone()))
            .app_data(web::Data::new(ctx.recipient_service.clone()))
            .app_data(web::Data::new(ctx.channel_service.clone()))
            .app_data(web::Data::new(ctx.update_service.clone()))
            .app_data(web::Data::new(ctx.scheduling_service.clone()))
            .app_data(web::Data::new(ctx.campaign_service.clone()))
            .app_data(web::Data::new(ctx.dispatcher.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind((args.bind.as_str(), args.port))?
    .run()
    .await?;

    Ok(())
}

async fn send_single_update(
    ctx: &AppContext,
    recipient_email: String,
    recipient_name: String,
    campaign_name: String,
    title: String,
) -> Result<()> {
    let now = Utc::now();
    let recipient = match ctx.recipient_service.find_by_email(&recipient_email).await? {
        Some(existing) => existing,
        None => {
            ctx.recipient_service
                .add_recipient(
                    CreateRecipientRequest {
                        name: recipient_name,
                        email: recipient_email,
                        role: None,
                        channels: None,
                        webhook_url: None,
                    },
                    now,
                )
                .await?
        }
    };

    let record = ctx
        .update_service
        .create_update(
            CreateUpdateRequest {
                campaign_id: campaign_name.clone(),
                update_type: "manual".to_string(),
                content: UpdateContent {
                    title,
                    summary: format!("Update for campaign {}", campaign_name),
                    metrics: Default::default(),
                    highlights: Vec::new(),
                    recommendations: Vec::new(),
                },
                recipients: vec![recipient.id.clone()],
                channel_id: None,
                scheduled_time: None,
            },
            now,
        )
        .await?;

    match ctx.dispatcher.dispatch_update(&record.id, now).await? {
        DispatchOutcome::Sent => {
            log::info!("Update {} sent to {}", record.id, recipient.email);
            Ok(())
        }
        other => Err(anyhow!("Update {} was not sent: {:?}", record.id, other)),
    }
}
