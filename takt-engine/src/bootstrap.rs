use takt_client::TaktClient;

use crate::app::App;
use crate::runtime::events::EventTx;
use crate::runtime::{spawn_session_stats_fetch, spawn_sessions_fetch};

/// Load initial state from the backend. Reads degrade gracefully: a
/// failed load is logged and leaves its slice of state empty so the rest
/// of the client stays usable.
pub async fn initialize_app_state(app: &mut App, client: &TaktClient, tx: &EventTx) {
    match client.category_tree().await {
        Ok(categories) => app.apply_categories(categories),
        Err(e) => tracing::warn!(error = %e, "could not load categories"),
    }

    match client.tags().await {
        Ok(tags) => app.apply_tags(tags),
        Err(e) => tracing::warn!(error = %e, "could not load tags"),
    }

    // If the backend reports a session still running (started from
    // another client, or before a restart), adopt it: the clock anchors
    // on its original start instant, so elapsed time is correct no matter
    // how long ago that was.
    match client.running_session().await {
        Ok(Some(session)) => {
            let category = session.category;
            app.start_session(session);
            spawn_session_stats_fetch(category, app, client, tx);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not check for a running session"),
    }

    spawn_sessions_fetch(app, client, tx);
}
