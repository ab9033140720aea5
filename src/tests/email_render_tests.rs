//! tests/email_render_tests.rs
//! Cuerpos de email generados a partir del contenido estructurado.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::models::update_model::UpdateContent;
    use crate::services::email_service::{metric_label, render_html_body, render_text_body};

    fn sample() -> UpdateContent {
        let mut metrics = BTreeMap::new();
        metrics.insert("click_through_rate".to_string(), 3.5);
        metrics.insert("open_rate".to_string(), 41.0);
        UpdateContent {
            title: "Spring <Launch>".to_string(),
            summary: "Traffic & signups grew".to_string(),
            metrics,
            highlights: vec!["New hero banner".to_string()],
            recommendations: vec!["Raise the budget".to_string()],
        }
    }

    #[test]
    fn metric_keys_become_labels() {
        assert_eq!(metric_label("click_through_rate"), "Click Through Rate");
        assert_eq!(metric_label("roi"), "Roi");
        assert_eq!(metric_label("__cost__"), "Cost");
    }

    #[test]
    fn text_body_lists_every_section() {
        let text = render_text_body(&sample(), "Ana");
        assert!(text.starts_with("Hello Ana,"));
        assert!(text.contains("KEY METRICS:\n- Click Through Rate: 3.5\n- Open Rate: 41\n"));
        assert!(text.contains("HIGHLIGHTS:\n- New hero banner\n"));
        assert!(text.contains("RECOMMENDATIONS:\n- Raise the budget\n"));
    }

    #[test]
    fn text_body_omits_empty_sections() {
        let content = UpdateContent {
            title: "Short".to_string(),
            summary: String::new(),
            metrics: BTreeMap::new(),
            highlights: vec![],
            recommendations: vec![],
        };
        let text = render_text_body(&content, "Ana");
        assert!(!text.contains("KEY METRICS"));
        assert!(!text.contains("HIGHLIGHTS"));
        assert!(!text.contains("RECOMMENDATIONS"));
    }

    #[test]
    fn html_body_escapes_user_content() {
        let html = render_html_body(&sample(), "Ana <admin>");
        assert!(html.contains("<h1>Spring &lt;Launch&gt;</h1>"));
        assert!(html.contains("Hello Ana &lt;admin&gt;,"));
        assert!(html.contains("Traffic &amp; signups grew"));
        assert!(html.contains("<li>New hero banner</li>"));
        assert!(html.contains("Click Through Rate"));
        assert!(!html.contains("<Launch>"));
    }
}
