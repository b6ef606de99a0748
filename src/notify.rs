// SPDX-License-Identifier: GPL-3.0-only
//! Desktop notifications over D-Bus
//!
//! Eject failures are shown through the freedesktop notification service of
//! the user session. The diagnostic text is passed through unchanged.

use std::collections::HashMap;

use zbus::{Connection, proxy, zvariant::Value};

pub const APP_NAME: &str = "nvidia-eject-tray";
const ICON: &str = "video-display";

/// freedesktop notification service D-Bus proxy
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Send one notification, returning the server-assigned id
pub async fn send(summary: &str, body: &str) -> zbus::Result<u32> {
    let connection = Connection::session().await?;
    let proxy = NotificationsProxy::new(&connection).await?;

    let urgency = Value::from(2u8);
    let mut hints = HashMap::new();
    hints.insert("urgency", &urgency);

    proxy
        .notify(APP_NAME, 0, ICON, summary, body, &[], &hints, -1)
        .await
}

/// Fire-and-forget variant for callers on the tray loop
pub fn spawn_notification(summary: &str, body: &str) {
    let summary = summary.to_string();
    let body = body.to_string();
    tokio::spawn(async move {
        match send(&summary, &body).await {
            Ok(id) => debug!("Posted notification {}", id),
            Err(e) => warn!("Failed to post desktop notification: {}", e),
        }
    });
}
