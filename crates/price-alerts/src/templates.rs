use crate::{Alert, AlertKind};

pub struct AlertTemplate;

impl AlertTemplate {
    pub fn title(alert: &Alert) -> String {
        format!("Price alert: {}", alert.symbol)
    }

    /// One-line notification text, e.g. `Alert: AAPL hit $99.00 (lower threshold)`
    pub fn message(alert: &Alert) -> String {
        format!(
            "Alert: {} hit ${:.2} ({} threshold)",
            alert.symbol,
            alert.price,
            alert.kind.as_str()
        )
    }

    /// Embed payload for Discord-style webhooks
    pub fn webhook_payload(alert: &Alert) -> serde_json::Value {
        let color = match alert.kind {
            AlertKind::Lower => 0xff0000,
            AlertKind::Upper => 0x00ff00,
        };

        serde_json::json!({
            "embeds": [{
                "title": Self::title(alert),
                "description": Self::message(alert),
                "color": color,
                "fields": [
                    {"name": "Price", "value": format!("${:.2}", alert.price), "inline": true},
                    {"name": "Threshold", "value": format!("${:.2}", alert.threshold), "inline": true},
                ],
                "timestamp": alert.timestamp.to_rfc3339(),
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alert(kind: AlertKind, price: f64, threshold: f64) -> Alert {
        Alert {
            id: 1,
            symbol: "TSLA".to_string(),
            price,
            kind,
            threshold,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_message() {
        assert_eq!(
            AlertTemplate::message(&alert(AlertKind::Upper, 251.457, 250.0)),
            "Alert: TSLA hit $251.46 (upper threshold)"
        );
        assert_eq!(
            AlertTemplate::message(&alert(AlertKind::Lower, 99.0, 100.0)),
            "Alert: TSLA hit $99.00 (lower threshold)"
        );
    }

    #[test]
    fn test_webhook_payload() {
        let payload = AlertTemplate::webhook_payload(&alert(AlertKind::Lower, 99.0, 100.0));
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Price alert: TSLA");
        assert_eq!(embed["color"], 0xff0000);
        assert_eq!(embed["fields"][1]["value"], "$100.00");
    }
}
