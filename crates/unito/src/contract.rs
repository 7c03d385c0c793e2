// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unito contract` subcommands.

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use unito_billing::{ContractStatus, ContractSummary, PortalContext};
use unito_core::UnitoError;

use crate::status::format_days;

pub async fn run_show(portal: &PortalContext, json: bool) -> Result<(), UnitoError> {
    portal.contract().fetch(portal.gateway()).await?;
    let summary = portal.contract().summary();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

pub async fn run_template(portal: &PortalContext) -> Result<(), UnitoError> {
    let template = portal.contract().fetch_template(portal.gateway()).await?;
    println!("{} (version {})", template.title, template.version);
    println!();
    println!("{}", template.body);
    Ok(())
}

pub async fn run_export(portal: &PortalContext, out: Option<&Path>) -> Result<(), UnitoError> {
    let data = portal.contract().export_data(portal.gateway()).await?;
    let rendered = serde_json::to_string_pretty(&data)
        .map_err(|e| UnitoError::Internal(format!("failed to render export: {e}")))?;

    match out {
        Some(path) => {
            std::fs::write(path, rendered + "\n").map_err(|e| UnitoError::Storage {
                source: Box::new(e),
            })?;
            println!("Data exported to {}.", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub async fn run_sign(portal: &PortalContext, yes: bool) -> Result<(), UnitoError> {
    portal.refresh_all().await;
    let status = portal.contract().status();
    if !status.needs_signing() {
        println!("Nothing to sign: contract is {status}.");
        return Ok(());
    }

    let template = portal.contract().fetch_template(portal.gateway()).await?;
    println!("{} (version {})", template.title, template.version);
    println!();
    println!("{}", template.body);
    println!();

    if !yes && !confirm("Sign this agreement?")? {
        println!("Not signed.");
        return Ok(());
    }

    let view = portal.sign_contract().await?;
    println!("Contract signed. Status: {}.", view.status());
    Ok(())
}

pub async fn run_cancel(
    portal: &PortalContext,
    reason: Option<&str>,
    yes: bool,
) -> Result<(), UnitoError> {
    portal.refresh_all().await;
    if portal.contract().status() != ContractStatus::Active {
        println!(
            "Only an active contract can be cancelled (current status: {}).",
            portal.contract().status()
        );
        return Ok(());
    }

    let preview = portal.preview_cancellation()?;
    println!(
        "Service will end on {} after a {}-month notice period.",
        preview.service_end_date, preview.notice_months
    );
    println!(
        "Read-only access continues until {}.",
        preview.read_only_access_until
    );

    if !yes && !confirm("Request cancellation?")? {
        println!("Cancellation not requested.");
        return Ok(());
    }

    let view = portal.request_cancellation(reason).await?;
    match view.contract().and_then(|c| c.service_end_date) {
        Some(end) => println!("Cancellation requested. Service ends on {end}."),
        None => println!("Cancellation requested."),
    }
    Ok(())
}

fn print_summary(summary: &ContractSummary) {
    println!("Status:         {}", summary.status);
    if let Some(contract) = &summary.contract {
        if !contract.version.is_empty() {
            println!("Version:        {}", contract.version);
        }
        if let Some(signed) = contract.signed_at {
            println!("Signed:         {}", signed.format("%Y-%m-%d"));
        }
        if let Some(start) = contract.service_start_date {
            println!("Service start:  {start}");
        }
        println!(
            "Notice period:  {} month(s)",
            contract.cancellation_notice_months
        );
        if let Some(end) = contract.service_end_date {
            let left = summary
                .days_until_service_end
                .map(format_days)
                .unwrap_or_default();
            println!("Service end:    {end} ({left})");
        }
        if let Some(until) = contract.read_only_access_until {
            let left = summary
                .days_until_access_expires
                .map(format_days)
                .unwrap_or_default();
            println!("Read-only until {until} ({left})");
        }
    }
    if summary.needs_signing {
        println!();
        println!("Sign with: unito contract sign");
    }
}

/// Ask a yes/no question on the terminal. Without a terminal this is an error.
fn confirm(question: &str) -> Result<bool, UnitoError> {
    if !std::io::stdin().is_terminal() {
        return Err(UnitoError::Config(
            "confirmation required; pass --yes when not running interactively".to_string(),
        ));
    }

    eprint!("{question} [y/N] ");
    std::io::stderr()
        .flush()
        .map_err(|e| UnitoError::Internal(format!("failed to write prompt: {e}")))?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| UnitoError::Internal(format!("failed to read answer: {e}")))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
