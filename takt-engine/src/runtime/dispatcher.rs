use anyhow::Result;
use takt_client::dto::{StartTimerRequest, UpsertEntryRequest};
use takt_client::TaktClient;
use time::OffsetDateTime;

use crate::app::{format_duration, App, PendingEdit};
use crate::duration;
use crate::sequencer::{FetchScope, RequestToken};

use super::events::{AppEvent, EntryEdit, EventTx, ScopePayload};

/// Process one event against the owned state.
///
/// Mutating operations (start, stop, edit, delete) are awaited inline and
/// surface their failures through the status message; reads are spawned
/// with a sequence token and come back as `ResponseArrived` events.
pub async fn dispatch(
    event: AppEvent,
    app: &mut App,
    client: &TaktClient,
    tx: &EventTx,
) -> Result<()> {
    match event {
        AppEvent::Start(req) => handle_start(req, app, client, tx).await,
        AppEvent::Stop => handle_stop(app, client, tx).await,
        AppEvent::Tick => handle_tick(app, client, tx),
        AppEvent::FilterChanged {
            category,
            include_descendants,
        } => handle_filter_changed(category, include_descendants, app),
        AppEvent::ResponseArrived { token, payload } => {
            apply_response(app, token, payload);
            Ok(())
        }
        AppEvent::SaveEntryEdit(edit) => handle_save_entry_edit(edit, app, client, tx).await,
        AppEvent::ConfirmOverlongEdit => handle_confirm_overlong(app, client, tx).await,
        AppEvent::CancelOverlongEdit => {
            app.pending_overlong = None;
            app.set_status("Edit cancelled".to_string());
            Ok(())
        }
        AppEvent::DeleteSession { entry_id } => handle_delete(entry_id, app, client).await,
        AppEvent::Refresh => {
            spawn_sessions_fetch(app, client, tx);
            Ok(())
        }
        AppEvent::Shutdown => {
            app.quit();
            Ok(())
        }
    }
}

async fn handle_start(
    req: StartTimerRequest,
    app: &mut App,
    client: &TaktClient,
    tx: &EventTx,
) -> Result<()> {
    if app.clock.is_running() {
        app.set_status("Session already running".to_string());
        return Ok(());
    }

    match client.start_timer(&req).await {
        Ok(session) => {
            let category = session.category;
            app.start_session(session);
            app.clear_status();
            spawn_session_stats_fetch(category, app, client, tx);
            spawn_sessions_fetch(app, client, tx);
        }
        Err(e) => {
            app.set_status(format!("Error starting session: {}", e));
        }
    }
    Ok(())
}

async fn handle_stop(app: &mut App, client: &TaktClient, tx: &EventTx) -> Result<()> {
    let Some(entry_id) = app.session_id() else {
        app.set_status("No active session to stop".to_string());
        return Ok(());
    };

    match client.stop_timer(entry_id).await {
        Ok(finalized) => {
            app.clear_session();
            app.set_status(format!(
                "Saved {} to {}",
                format_duration(finalized.duration_seconds),
                finalized.category_name,
            ));
            spawn_sessions_fetch(app, client, tx);
        }
        Err(e) => {
            app.set_status(format!("Error stopping session: {}", e));
        }
    }
    Ok(())
}

fn handle_tick(app: &mut App, client: &TaktClient, tx: &EventTx) -> Result<()> {
    app.tick(OffsetDateTime::now_utc());

    if let Some(filter) = app.filter_debounce.poll() {
        app.filter = filter;
        if app.filter.category.is_some() {
            spawn_tasks_fetch(app, client, tx);
        }
        spawn_sessions_fetch(app, client, tx);
    }
    Ok(())
}

fn handle_filter_changed(
    category: Option<i64>,
    include_descendants: bool,
    app: &mut App,
) -> Result<()> {
    // Reject anything still in flight for the old parameters before the
    // debounced fetch for the new ones is even scheduled.
    app.sequencer.invalidate(FetchScope::Tasks);
    app.sequencer.invalidate(FetchScope::Sessions);

    let mut filter = app.filter.clone();
    filter.category = category;
    filter.include_descendants = include_descendants;

    if category.is_none() {
        // No category, nothing to fetch tasks for.
        app.tasks.clear();
    }
    app.filter_debounce.schedule(filter);
    Ok(())
}

fn apply_response(app: &mut App, token: RequestToken, payload: ScopePayload) {
    if !app.sequencer.is_current(token) {
        // Logically obsolete, not failed: no state mutation, no error.
        tracing::trace!(scope = ?token.scope(), "dropping stale response");
        return;
    }
    match payload {
        ScopePayload::Tasks(tasks) => app.apply_tasks(tasks),
        ScopePayload::Sessions(sessions) => app.apply_sessions(sessions),
        ScopePayload::CategoryStats(stats) => app.apply_session_stats(stats),
    }
}

async fn handle_save_entry_edit(
    edit: EntryEdit,
    app: &mut App,
    client: &TaktClient,
    tx: &EventTx,
) -> Result<()> {
    let resolved = match app.resolver.resolve_time_of_day(
        edit.date,
        &edit.start_clock,
        edit.end_clock.as_deref(),
    ) {
        Ok(resolved) => resolved,
        Err(e) => {
            app.set_status(format!("Invalid interval: {}", e));
            return Ok(());
        }
    };
    // The resolver validated the clock strings above; rebuild the start
    // instant it anchored the interval on.
    let start_time = match duration::parse_clock(&edit.start_clock) {
        Ok(t) => t,
        Err(e) => {
            app.set_status(format!("Invalid interval: {}", e));
            return Ok(());
        }
    };
    let start_at = OffsetDateTime::new_utc(edit.date, start_time);

    let (end_at, overlong, seconds) = match resolved {
        Some(r) => (
            Some(start_at + time::Duration::seconds(r.seconds)),
            r.overlong,
            r.seconds,
        ),
        None => (None, false, 0),
    };

    let request = UpsertEntryRequest {
        category: edit.category,
        task: edit.task,
        start_at,
        end_at,
        note: edit.note,
    };

    if overlong {
        app.set_status(format!(
            "Session of {:.1} hours detected, confirm to save",
            seconds as f64 / 3600.0
        ));
        app.pending_overlong = Some(PendingEdit {
            entry_id: edit.entry_id,
            request,
            seconds,
        });
        return Ok(());
    }

    persist_entry_edit(edit.entry_id, &request, app, client, tx).await;
    Ok(())
}

async fn handle_confirm_overlong(app: &mut App, client: &TaktClient, tx: &EventTx) -> Result<()> {
    let Some(pending) = app.pending_overlong.take() else {
        return Ok(());
    };
    persist_entry_edit(pending.entry_id, &pending.request, app, client, tx).await;
    Ok(())
}

async fn persist_entry_edit(
    entry_id: i64,
    request: &UpsertEntryRequest,
    app: &mut App,
    client: &TaktClient,
    tx: &EventTx,
) {
    match client.update_session(entry_id, request).await {
        Ok(_) => {
            app.set_status("Entry updated".to_string());
            spawn_sessions_fetch(app, client, tx);
        }
        Err(e) => {
            app.set_status(format!("Error saving entry: {}", e));
        }
    }
}

async fn handle_delete(entry_id: i64, app: &mut App, client: &TaktClient) -> Result<()> {
    match client.delete_session(entry_id).await {
        Ok(()) => {
            app.sessions.retain(|e| e.id != entry_id);
            app.set_status("Entry deleted".to_string());
        }
        Err(e) => {
            app.set_status(format!("Delete failed: {}", e));
        }
    }
    Ok(())
}

/// Issue a session-list read under a fresh token. A transport failure
/// degrades to an empty list so the surrounding state stays usable.
pub(crate) fn spawn_sessions_fetch(app: &mut App, client: &TaktClient, tx: &EventTx) {
    let token = app.sequencer.begin_request(FetchScope::Sessions);
    let filter = app.filter.clone();
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let sessions = match client.sessions(&filter).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "session list fetch failed");
                Vec::new()
            }
        };
        let _ = tx.send(AppEvent::ResponseArrived {
            token,
            payload: ScopePayload::Sessions(sessions),
        });
    });
}

fn spawn_tasks_fetch(app: &mut App, client: &TaktClient, tx: &EventTx) {
    let token = app.sequencer.begin_request(FetchScope::Tasks);
    let category = app.filter.category;
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let tasks = match client.tasks(category).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "task fetch failed");
                Vec::new()
            }
        };
        let _ = tx.send(AppEvent::ResponseArrived {
            token,
            payload: ScopePayload::Tasks(tasks),
        });
    });
}

/// Fetch pace statistics for the running session's category. Unlike list
/// reads there is no usable empty value (stale zeros would read as a
/// first-ever session), so a failed fetch applies nothing.
pub(crate) fn spawn_session_stats_fetch(
    category: i64,
    app: &mut App,
    client: &TaktClient,
    tx: &EventTx,
) {
    let token = app.sequencer.begin_request(FetchScope::CategoryStats);
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        match client.category_stats(category).await {
            Ok(stats) => {
                let _ = tx.send(AppEvent::ResponseArrived {
                    token,
                    payload: ScopePayload::CategoryStats(stats),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "category stats fetch failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaktConfig;
    use crate::pace::Pace;
    use crate::runtime::events::channel;
    use takt_client::domain::{CategoryStats, EntryFilter, Session};
    use time::macros::{date, datetime};

    fn test_app() -> App {
        App::new(&TaktConfig::default())
    }

    /// Config with no debounce delay so a Tick right after a filter
    /// change fires the coalesced fetches.
    fn instant_config() -> TaktConfig {
        TaktConfig {
            filter_debounce_ms: 0,
            ..TaktConfig::default()
        }
    }

    fn entry(id: i64, start: OffsetDateTime) -> Session {
        Session {
            id,
            category: 2,
            category_name: "/Work/Deep Focus".to_string(),
            task: None,
            task_name: None,
            tags: vec![],
            note: String::new(),
            start_at: start,
            end_at: None,
            duration_seconds: 0,
            is_running: false,
        }
    }

    fn start_request(category_id: i64) -> StartTimerRequest {
        StartTimerRequest {
            category_id,
            task_id: None,
            tag_ids: vec![],
            note: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn stale_response_is_dropped_without_mutation() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let stale = app.sequencer.begin_request(FetchScope::Sessions);
        app.sequencer.invalidate(FetchScope::Sessions);

        let payload =
            ScopePayload::Sessions(vec![entry(99, datetime!(2024-03-01 09:00:00 UTC))]);
        dispatch(
            AppEvent::ResponseArrived {
                token: stale,
                payload,
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        assert!(app.sessions.is_empty());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn current_response_is_applied() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let token = app.sequencer.begin_request(FetchScope::Sessions);
        let payload =
            ScopePayload::Sessions(vec![entry(99, datetime!(2024-03-01 09:00:00 UTC))]);
        dispatch(
            AppEvent::ResponseArrived { token, payload },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        assert_eq!(app.sessions.len(), 1);
        assert_eq!(app.sessions[0].id, 99);
    }

    #[tokio::test]
    async fn only_the_most_recent_request_wins_regardless_of_arrival_order() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let first = app.sequencer.begin_request(FetchScope::Sessions);
        let second = app.sequencer.begin_request(FetchScope::Sessions);

        // The second (current) request's result arrives first...
        dispatch(
            AppEvent::ResponseArrived {
                token: second,
                payload: ScopePayload::Sessions(vec![entry(
                    2,
                    datetime!(2024-03-01 10:00:00 UTC),
                )]),
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        // ...then the first one completes late and must be ignored.
        dispatch(
            AppEvent::ResponseArrived {
                token: first,
                payload: ScopePayload::Sessions(vec![entry(
                    1,
                    datetime!(2024-03-01 09:00:00 UTC),
                )]),
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        assert_eq!(app.sessions.len(), 1);
        assert_eq!(app.sessions[0].id, 2);
    }

    #[tokio::test]
    async fn start_anchors_the_clock_and_requests_stats() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, mut rx) = channel();

        dispatch(AppEvent::Start(start_request(2)), &mut app, &client, &tx)
            .await
            .unwrap();

        assert!(app.clock.is_running());
        assert!(app.session.is_some());
        assert!(app.pace.is_none());

        // Drain the spawned stats + session fetches and apply them.
        let mut saw_stats = false;
        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            if let AppEvent::ResponseArrived {
                payload: ScopePayload::CategoryStats(_),
                ..
            } = &event
            {
                saw_stats = true;
            }
            dispatch(event, &mut app, &client, &tx).await.unwrap();
        }
        assert!(saw_stats);
        assert!(app.session_stats.is_some());

        // With stats in place, ticking produces a pace readout.
        dispatch(AppEvent::Tick, &mut app, &client, &tx).await.unwrap();
        assert!(app.pace.is_some());
    }

    #[tokio::test]
    async fn starting_twice_reports_instead_of_restarting() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        dispatch(AppEvent::Start(start_request(2)), &mut app, &client, &tx)
            .await
            .unwrap();
        let first_id = app.session_id();

        dispatch(AppEvent::Start(start_request(3)), &mut app, &client, &tx)
            .await
            .unwrap();
        assert_eq!(app.session_id(), first_id);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Session already running")
        );
    }

    #[tokio::test]
    async fn stop_clears_the_session_and_reports_the_saved_duration() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        dispatch(AppEvent::Start(start_request(2)), &mut app, &client, &tx)
            .await
            .unwrap();
        dispatch(AppEvent::Stop, &mut app, &client, &tx).await.unwrap();

        assert!(!app.clock.is_running());
        assert!(app.session.is_none());
        let status = app.status_message.clone().unwrap();
        assert!(status.starts_with("Saved 00:00:0"), "{status}");
        assert!(status.ends_with("/Work/Deep Focus"), "{status}");
    }

    #[tokio::test]
    async fn stop_without_a_session_is_reported_not_an_error() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        dispatch(AppEvent::Stop, &mut app, &client, &tx).await.unwrap();
        assert_eq!(
            app.status_message.as_deref(),
            Some("No active session to stop")
        );
    }

    #[tokio::test]
    async fn filter_change_invalidates_in_flight_reads_and_debounces() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let in_flight = app.sequencer.begin_request(FetchScope::Sessions);
        dispatch(
            AppEvent::FilterChanged {
                category: Some(2),
                include_descendants: true,
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        assert!(!app.sequencer.is_current(in_flight));
        assert!(app.filter_debounce.is_pending());
        // The filter itself only changes when the debounce fires.
        assert_eq!(app.filter.category, None);
    }

    #[tokio::test]
    async fn clearing_the_category_clears_tasks_immediately() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        app.apply_tasks(client.tasks(Some(2)).await.unwrap());
        assert!(!app.tasks.is_empty());

        dispatch(
            AppEvent::FilterChanged {
                category: None,
                include_descendants: false,
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();
        assert!(app.tasks.is_empty());
    }

    #[tokio::test]
    async fn tick_fires_the_debounced_fetches() {
        let mut app = App::new(&instant_config());
        let client = TaktClient::dev();
        let (tx, mut rx) = channel();

        dispatch(
            AppEvent::FilterChanged {
                category: Some(2),
                include_descendants: true,
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();
        dispatch(AppEvent::Tick, &mut app, &client, &tx).await.unwrap();

        assert_eq!(app.filter.category, Some(2));

        // Tasks + sessions both arrive and both apply.
        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            dispatch(event, &mut app, &client, &tx).await.unwrap();
        }
        assert!(!app.tasks.is_empty());
        assert!(app.tasks.iter().all(|t| t.category == 2));
        assert!(!app.sessions.is_empty());
        assert!(app
            .sessions
            .iter()
            .all(|s| s.category_name.starts_with("/Work/Deep Focus")));
    }

    #[tokio::test]
    async fn overlong_edit_waits_for_confirmation() {
        let mut app = App::new(&TaktConfig {
            long_session_hours: 8,
            ..TaktConfig::default()
        });
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let edit = EntryEdit {
            entry_id: 1,
            date: date!(2024 - 03 - 01),
            start_clock: "09:00".to_string(),
            end_clock: Some("18:00".to_string()),
            category: 2,
            task: None,
            note: "long day".to_string(),
        };
        dispatch(AppEvent::SaveEntryEdit(edit), &mut app, &client, &tx)
            .await
            .unwrap();

        let pending = app.pending_overlong.as_ref().expect("edit parked");
        assert_eq!(pending.seconds, 9 * 3600);
        let status = app.status_message.clone().unwrap();
        assert!(status.contains("9.0 hours"), "{status}");

        dispatch(AppEvent::ConfirmOverlongEdit, &mut app, &client, &tx)
            .await
            .unwrap();
        assert!(app.pending_overlong.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Entry updated"));
    }

    #[tokio::test]
    async fn cancelled_overlong_edit_is_discarded() {
        let mut app = App::new(&TaktConfig {
            long_session_hours: 8,
            ..TaktConfig::default()
        });
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let edit = EntryEdit {
            entry_id: 1,
            date: date!(2024 - 03 - 01),
            start_clock: "09:00".to_string(),
            end_clock: Some("18:00".to_string()),
            category: 2,
            task: None,
            note: String::new(),
        };
        dispatch(AppEvent::SaveEntryEdit(edit), &mut app, &client, &tx)
            .await
            .unwrap();
        dispatch(AppEvent::CancelOverlongEdit, &mut app, &client, &tx)
            .await
            .unwrap();
        assert!(app.pending_overlong.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Edit cancelled"));
    }

    #[tokio::test]
    async fn midnight_crossing_edit_persists_without_confirmation() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let edit = EntryEdit {
            entry_id: 1,
            date: date!(2024 - 03 - 01),
            start_clock: "23:30".to_string(),
            end_clock: Some("01:30".to_string()),
            category: 2,
            task: None,
            note: "late".to_string(),
        };
        dispatch(AppEvent::SaveEntryEdit(edit), &mut app, &client, &tx)
            .await
            .unwrap();

        assert!(app.pending_overlong.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Entry updated"));

        let updated = client
            .sessions(&EntryFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.id == 1)
            .unwrap();
        assert_eq!(updated.duration_seconds, 7200);
        assert_eq!(updated.start_at.date(), date!(2024 - 03 - 01));
        assert_eq!(updated.end_at.unwrap().date(), date!(2024 - 03 - 02));
    }

    #[tokio::test]
    async fn invalid_clock_surfaces_a_correctable_error() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        let edit = EntryEdit {
            entry_id: 1,
            date: date!(2024 - 03 - 01),
            start_clock: "25:00".to_string(),
            end_clock: Some("10:00".to_string()),
            category: 2,
            task: None,
            note: String::new(),
        };
        dispatch(AppEvent::SaveEntryEdit(edit), &mut app, &client, &tx)
            .await
            .unwrap();

        let status = app.status_message.clone().unwrap();
        assert!(status.starts_with("Invalid interval:"), "{status}");
        assert!(app.pending_overlong.is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_entry_locally_on_success() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        app.apply_sessions(client.sessions(&EntryFilter::default()).await.unwrap());
        let before = app.sessions.len();

        dispatch(
            AppEvent::DeleteSession { entry_id: 1 },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        assert_eq!(app.sessions.len(), before - 1);
        assert!(app.sessions.iter().all(|e| e.id != 1));
        assert_eq!(app.status_message.as_deref(), Some("Entry deleted"));
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        dispatch(AppEvent::Shutdown, &mut app, &client, &tx).await.unwrap();
        assert!(!app.running);
    }

    #[tokio::test]
    async fn record_pace_flows_end_to_end() {
        let mut app = test_app();
        let client = TaktClient::dev();
        let (tx, _rx) = channel();

        dispatch(AppEvent::Start(start_request(2)), &mut app, &client, &tx)
            .await
            .unwrap();

        // Seeded /Work/Deep Focus history: two 2-hour sessions.
        let token = app.sequencer.begin_request(FetchScope::CategoryStats);
        dispatch(
            AppEvent::ResponseArrived {
                token,
                payload: ScopePayload::CategoryStats(CategoryStats {
                    total_entries: 2,
                    avg_duration: 7200.0,
                    min_duration: 7200,
                    max_duration: 7200,
                    total_time: 14400,
                    recent_avg: 7200.0,
                }),
            },
            &mut app,
            &client,
            &tx,
        )
        .await
        .unwrap();

        dispatch(AppEvent::Tick, &mut app, &client, &tx).await.unwrap();
        // A session a few seconds old is far under the 2-hour minimum.
        assert_eq!(app.pace, Some(Pace::Record));
    }
}
