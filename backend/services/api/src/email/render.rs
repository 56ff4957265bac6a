use crate::alerts::requests::AlertItem;

/// Plain HTML listing of triggered alerts.
pub fn render_alerts_html(subject: &str, alerts: &[AlertItem]) -> String {
    let mut html = format!("<h2>{}</h2>\n<ul>\n", escape(subject));
    for alert in alerts {
        html.push_str(&format!(
            "<li><strong>{}</strong>: {} (current: {}, threshold: {})</li>\n",
            escape(&alert.alert_type),
            escape(&alert.product_name),
            alert.current_value,
            alert.threshold,
        ));
    }
    html.push_str("</ul>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
