// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unito status` command implementation.
//!
//! Refreshes both lifecycle machines and prints the subscription, the
//! contract and whether the portal is locked.

use std::io::IsTerminal;

use serde::Serialize;
use unito_billing::{ContractSummary, LockReason, PortalContext, SubscriptionSummary};
use unito_core::UnitoError;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub logged_in: bool,
    pub base_url: String,
    pub locked: bool,
    pub lock_reason: Option<LockReason>,
    pub subscription: Option<SubscriptionSummary>,
    pub contract: ContractSummary,
}

impl StatusReport {
    pub async fn collect(portal: &PortalContext) -> Self {
        let warning_days = portal.config().billing.trial_warning_days;
        Self {
            logged_in: portal.session().is_logged_in().await,
            base_url: portal.config().client.base_url.clone(),
            locked: portal.is_locked(),
            lock_reason: portal.lock_reason(),
            subscription: portal.subscription().summary(warning_days),
            contract: portal.contract().summary(),
        }
    }
}

/// Human form of a day count.
pub fn format_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

pub async fn run_status(portal: &PortalContext, json: bool, plain: bool) -> Result<(), UnitoError> {
    if !portal.session().is_logged_in().await {
        if json {
            print_json(&StatusReport::collect(portal).await);
        } else {
            println!("Not logged in. Run `unito login --email <EMAIL>`.");
        }
        return Ok(());
    }

    portal.refresh_all().await;
    let report = StatusReport::collect(portal).await;

    if json {
        print_json(&report);
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
    Ok(())
}

fn print_json(report: &StatusReport) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_report(report: &StatusReport, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  unito status");
    println!("  {}", "-".repeat(35));
    println!("    Backend:      {}", report.base_url);

    match &report.subscription {
        Some(sub) => {
            println!("    Plan:         {} ({})", sub.plan, sub.status);
            if sub.status == unito_billing::BillingStatus::Trialing {
                let left = format!("{} left", format_days(sub.trial_days_remaining));
                if sub.is_trial_ending_soon && use_color {
                    println!("    Trial:        {}", left.yellow());
                } else {
                    println!("    Trial:        {left}");
                }
            }
        }
        None => println!("    Plan:         unknown"),
    }

    println!("    Contract:     {}", report.contract.status);
    if let Some(days) = report.contract.days_until_service_end {
        println!("    Service ends: in {}", format_days(days));
    }
    if let Some(days) = report.contract.days_until_access_expires {
        println!("    Read-only:    {} remaining", format_days(days));
    }

    match (report.lock_reason, use_color) {
        (Some(reason), true) => println!("    Access:       {} {}", "✗".red(), reason.to_string().red()),
        (Some(reason), false) => println!("    Access:       [LOCKED] {reason}"),
        (None, true) => println!("    Access:       {} {}", "✓".green(), "full".green()),
        (None, false) => println!("    Access:       [OK] full"),
    }

    if report.contract.needs_signing {
        println!();
        println!("  Sign your service agreement with: unito contract sign");
    }
    println!();
}
