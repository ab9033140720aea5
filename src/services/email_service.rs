//! services/email_service.rs

use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    errors::DeliveryFailure,
    models::{
        channel_model::EmailChannelConfig, recipient_model::Recipient, update_model::UpdateContent,
    },
};

/// Tiempo máximo por mensaje SMTP
const SMTP_SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct EmailService;

impl EmailService {
    pub fn new() -> Self {
        Self
    }

    /// Envía la actualización por SMTP con STARTTLS (texto plano + HTML).
    /// Direcciones inválidas son permanentes; fallos de transporte se reintentan.
    pub async fn send_update_email(
        &self,
        config: &EmailChannelConfig,
        recipient: &Recipient,
        content: &UpdateContent,
    ) -> Result<(), DeliveryFailure> {
        let from: Mailbox = format!("{} <{}>", config.sender_name, config.sender_email)
            .parse()
            .map_err(|e| DeliveryFailure::processing(format!("Invalid from address: {e}")))?;
        let to: Mailbox = format!("{} <{}>", recipient.name, recipient.email)
            .parse()
            .map_err(|e| {
                DeliveryFailure::processing(format!(
                    "Invalid recipient address '{}': {e}",
                    recipient.email
                ))
            })?;

        let text_part = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(render_text_body(content, &recipient.name));
        let html_part = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(render_html_body(content, &recipient.name));

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(content.title.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(text_part)
                    .singlepart(html_part),
            )
            .map_err(|e| DeliveryFailure::processing(format!("Could not build message: {e}")))?;

        let tls_params = TlsParameters::new(config.smtp_server.clone())
            .map_err(|e| DeliveryFailure::delivery(format!("TLS setup failed: {e}")))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
            .map_err(|e| DeliveryFailure::delivery(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port)
            .tls(Tls::Required(tls_params));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let mailer = builder.build();

        log::info!(
            "(email) Sending '{}' to {} via {}:{}",
            content.title,
            recipient.email,
            config.smtp_server,
            config.smtp_port
        );

        match tokio::time::timeout(SMTP_SEND_TIMEOUT, mailer.send(message)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DeliveryFailure::delivery(format!("SMTP send failed: {e}"))),
            Err(_) => Err(DeliveryFailure::delivery(format!(
                "SMTP send timed out after {}s",
                SMTP_SEND_TIMEOUT.as_secs()
            ))),
        }
    }
}

/// "click_through_rate" -> "Click Through Rate"
pub fn metric_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_text_body(content: &UpdateContent, recipient_name: &str) -> String {
    let mut text = format!(
        "Hello {},\n\n{}\n\n{}\n\n",
        recipient_name, content.title, content.summary
    );

    if !content.metrics.is_empty() {
        text.push_str("KEY METRICS:\n");
        for (metric, value) in &content.metrics {
            text.push_str(&format!("- {}: {}\n", metric_label(metric), value));
        }
        text.push('\n');
    }

    if !content.highlights.is_empty() {
        text.push_str("HIGHLIGHTS:\n");
        for highlight in &content.highlights {
            text.push_str(&format!("- {highlight}\n"));
        }
        text.push('\n');
    }

    if !content.recommendations.is_empty() {
        text.push_str("RECOMMENDATIONS:\n");
        for recommendation in &content.recommendations {
            text.push_str(&format!("- {recommendation}\n"));
        }
        text.push('\n');
    }

    text.push_str("This update was generated by the campaign update service.\n");
    text
}

pub fn render_html_body(content: &UpdateContent, recipient_name: &str) -> String {
    let mut html = String::from(
        "<html><head><style>\
         body{font-family:Arial,sans-serif;line-height:1.6;color:#333;max-width:600px;margin:0 auto}\
         .header{background-color:#4285f4;color:white;padding:20px;text-align:center}\
         .content{padding:20px}\
         .metrics{display:flex;flex-wrap:wrap;background-color:#f9f9f9;padding:15px;border-radius:5px}\
         .metric{flex:1;min-width:120px;padding:10px;text-align:center}\
         .metric-value{font-size:24px;font-weight:bold;color:#4285f4}\
         .metric-label{font-size:14px;color:#666}\
         .footer{font-size:12px;color:#999;text-align:center;margin-top:30px;border-top:1px solid #eee}\
         </style></head><body>",
    );

    html.push_str(&format!(
        "<div class=\"header\"><h1>{}</h1></div><div class=\"content\">",
        escape_html(&content.title)
    ));
    html.push_str(&format!(
        "<p>Hello {},</p><p>{}</p>",
        escape_html(recipient_name),
        escape_html(&content.summary)
    ));

    if !content.metrics.is_empty() {
        html.push_str("<h2>Key Metrics</h2><div class=\"metrics\">");
        for (metric, value) in &content.metrics {
            html.push_str(&format!(
                "<div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">{}</div></div>",
                value,
                escape_html(&metric_label(metric))
            ));
        }
        html.push_str("</div>");
    }

    push_html_list(&mut html, "Highlights", &content.highlights);
    push_html_list(&mut html, "Recommendations", &content.recommendations);

    html.push_str(
        "</div><div class=\"footer\">This update was generated by the campaign update service.</div></body></html>",
    );
    html
}

fn push_html_list(html: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<h2>{heading}</h2><ul>"));
    for item in items {
        html.push_str(&format!("<li>{}</li>", escape_html(item)));
    }
    html.push_str("</ul>");
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
