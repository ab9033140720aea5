//! app.rs
use crate::handlers::{
    calendar_handler, campaign_handler, channel_handler, recipient_handler, schedule_handler, update_handler,
};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/recipients")
                    .route(
                        "",
                        web::post().to(recipient_handler::create_recipient_endpoint),
                    )
                    .route(
                        "",
                        web::get().to(recipient_handler::list_recipients_endpoint),
                    )
                    .route(
                        "/{id}",
                        web::get().to(recipient_handler::get_recipient_endpoint),
                    )
                    .route(
                        "/{id}/preferences",
                        web::get().to(recipient_handler::get_preferences_endpoint),
                    )
                    .route(
                        "/{id}/preferences",
                        web::put().to(recipient_handler::update_preferences_endpoint),
                    ),
            )
            .service(
                web::scope("/calendar")
                    .route(
                        "/events",
                        web::post().to(calendar_handler::create_event_endpoint),
                    )
                    .route(
                        "/events",
                        web::get().to(calendar_handler::list_events_endpoint),
                    ),
            )
            .service(web::scope("/campaigns").route(
                "/{id}/events",
                web::post().to(campaign_handler::campaign_event_endpoint),
            ))
            .service(
                web::scope("/channels")
                    .route("", web::post().to(channel_handler::create_channel_endpoint))
                    .route("", web::get().to(channel_handler::list_channels_endpoint)),
            )
            .service(
                web::scope("/schedules")
                    .route(
                        "",
                        web::post().to(schedule_handler::optimal_schedule_endpoint),
                    )
                    .route(
                        "/{campaign_id}",
                        web::get().to(schedule_handler::list_schedule_endpoint),
                    ),
            )
            .service(
                web::scope("/updates")
                    .route("", web::post().to(update_handler::create_update_endpoint))
                    .route("", web::get().to(update_handler::list_updates_endpoint))
                    .route("/plan", web::post().to(update_handler::plan_update_endpoint))
                    .route("/{id}", web::get().to(update_handler::get_update_endpoint))
                    .route(
                        "/{id}/logs",
                        web::get().to(update_handler::update_logs_endpoint),
                    )
                    .route(
                        "/{id}/send",
                        web::post().to(update_handler::send_update_endpoint),
                    ),
            )
            .route("/dispatch", web::post().to(update_handler::dispatch_endpoint)),
    );
}
