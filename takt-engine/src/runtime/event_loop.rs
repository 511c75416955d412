use std::time::{Duration, Instant};

use anyhow::Result;
use takt_client::TaktClient;
use tokio::time::MissedTickBehavior;

use crate::app::App;

use super::dispatcher::dispatch;
use super::events::{AppEvent, EventRx, EventTx};

/// Background polling: re-pull the session list once a minute so entries
/// created from other clients show up without a filter change.
const SESSIONS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Pump events through the dispatcher, synthesizing a `Tick` at a fixed
/// cadence. The tick both refreshes the clock readout and polls the
/// filter debouncer, so no separate timer wheel is needed.
///
/// The display layer (out of scope here) reads `App` between iterations
/// and feeds UI intents into the channel; dropping every sender ends the
/// loop, as does a `Shutdown` event.
pub async fn run(
    app: &mut App,
    client: &TaktClient,
    rx: &mut EventRx,
    tx: &EventTx,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_sessions_refresh = Instant::now();

    loop {
        tokio::select! {
            maybe_event = rx.recv() => match maybe_event {
                Some(event) => dispatch(event, app, client, tx).await?,
                None => break,
            },
            _ = ticker.tick() => dispatch(AppEvent::Tick, app, client, tx).await?,
        }

        if last_sessions_refresh.elapsed() >= SESSIONS_REFRESH_INTERVAL {
            dispatch(AppEvent::Refresh, app, client, tx).await?;
            last_sessions_refresh = Instant::now();
        }

        if !app.running {
            break;
        }
    }

    Ok(())
}
