// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unito watch`: keep the subscription state fresh until interrupted.

use tokio_util::sync::CancellationToken;
use tracing::info;
use unito_billing::PortalContext;
use unito_core::{SessionEvent, UnitoError};

pub async fn run_watch(portal: &PortalContext) -> Result<(), UnitoError> {
    if !portal.session().is_logged_in().await {
        return Err(UnitoError::SessionExpired);
    }

    portal.refresh_all().await;
    match portal.lock_reason() {
        Some(reason) => println!("Portal is locked: {reason}."),
        None => println!("Portal is open."),
    }

    let mut events = portal.events().subscribe();
    let cancel = CancellationToken::new();
    let mut poller = portal.spawn_poller(cancel.clone());
    println!(
        "Polling subscription status every {}s. Press Ctrl+C to stop.",
        portal.config().billing.subscription_poll_secs
    );

    let mut was_locked = portal.is_locked();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, stopping watch");
                cancel.cancel();
                break;
            }
            _ = &mut poller => {
                break;
            }
            event = events.recv() => {
                if let Ok(SessionEvent::Expired) = event {
                    println!("Session expired. Run `unito login` to continue.");
                }
                let locked = portal.is_locked();
                if locked != was_locked {
                    match portal.lock_reason() {
                        Some(reason) => println!("Portal is now locked: {reason}."),
                        None => println!("Portal is open again."),
                    }
                    was_locked = locked;
                }
            }
        }
    }

    if !poller.is_finished() {
        let _ = poller.await;
    }
    Ok(())
}
