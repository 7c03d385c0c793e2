// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service contract lifecycle.
//!
//! ```text
//! no_contract / pending --sign--> active --request_cancellation--> cancellation_requested
//!                                   |                                   |
//!                                   +--expire--> expired <--expire------+
//!                                                                       |
//!                         cancelled <--service end date reached---------+
//! ```
//!
//! A cancelled contract keeps read-only access for 365 days after its
//! service end date.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};
use unito_core::{Clock, TransitionError, UnitoError};
use unito_gateway::RequestGateway;

pub const CONTRACT_PATH: &str = "/auth/contract/";
pub const CONTRACT_SIGN_PATH: &str = "/auth/contract/sign/";
pub const CONTRACT_CANCEL_PATH: &str = "/auth/contract/cancel/";
pub const CONTRACT_TEMPLATE_PATH: &str = "/auth/contract-template/";
pub const CONTRACT_EXPORT_PATH: &str = "/auth/contract/export/";

/// Notice period applied when the backend does not say otherwise.
pub const DEFAULT_NOTICE_MONTHS: u32 = 2;

/// Read-only access retained after the service end date.
pub const READ_ONLY_RETENTION_DAYS: u64 = 365;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContractStatus {
    NoContract,
    Pending,
    Active,
    CancellationRequested,
    Cancelled,
    Expired,
}

impl ContractStatus {
    /// Statuses in which the portal must route the user to the signing page.
    pub fn needs_signing(self) -> bool {
        matches!(self, Self::NoContract | Self::Pending)
    }

    /// Statuses in which a service end date may be set.
    fn may_have_service_end(self) -> bool {
        matches!(
            self,
            Self::CancellationRequested | Self::Cancelled | Self::Expired
        )
    }
}

/// A record that breaks the contract date invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("service_end_date set while contract is `{0}`")]
    PrematureServiceEnd(ContractStatus),

    #[error("cancelled contract has no service_end_date")]
    CancelledWithoutServiceEnd,

    #[error("read_only_access_until set while contract is `{0}`")]
    PrematureReadOnly(ContractStatus),

    #[error("read_only_access_until {actual} is not service end plus 365 days ({expected})")]
    ReadOnlyMismatch {
        expected: NaiveDate,
        actual: NaiveDate,
    },
}

/// The host's service contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    #[serde(default)]
    pub version: String,
    pub status: ContractStatus,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub service_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub cancellation_requested_at: Option<DateTime<Utc>>,
    #[serde(default = "default_notice_months")]
    pub cancellation_notice_months: u32,
    #[serde(default)]
    pub service_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub read_only_access_until: Option<NaiveDate>,
    /// Reason given when cancellation was requested from this client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

fn default_notice_months() -> u32 {
    DEFAULT_NOTICE_MONTHS
}

/// Last day of read-only access for a contract whose service ends on `service_end`.
pub fn read_only_until(service_end: NaiveDate) -> Result<NaiveDate, TransitionError> {
    service_end
        .checked_add_days(Days::new(READ_ONLY_RETENTION_DAYS))
        .ok_or(TransitionError::DateOverflow)
}

fn days_until(date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    date.map(|d| (d - today).num_days().max(0))
}

impl Contract {
    /// A fresh, unsigned contract.
    pub fn unsigned(status: ContractStatus) -> Self {
        Self {
            id: 0,
            version: String::new(),
            status,
            signed_at: None,
            service_start_date: None,
            cancellation_requested_at: None,
            cancellation_notice_months: DEFAULT_NOTICE_MONTHS,
            service_end_date: None,
            read_only_access_until: None,
            cancellation_reason: None,
        }
    }

    fn not_allowed(&self, action: &'static str) -> TransitionError {
        TransitionError::NotAllowed {
            action,
            from: self.status.to_string(),
        }
    }

    /// `no_contract | pending -> active`.
    pub fn sign(&self, now: DateTime<Utc>) -> Result<Contract, TransitionError> {
        if !self.status.needs_signing() {
            return Err(self.not_allowed("sign"));
        }
        Ok(Contract {
            status: ContractStatus::Active,
            signed_at: Some(now),
            service_start_date: Some(now.date_naive()),
            ..self.clone()
        })
    }

    /// `active -> cancellation_requested`, with the service ending
    /// `cancellation_notice_months` calendar months from today.
    pub fn request_cancellation(
        &self,
        now: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<Contract, TransitionError> {
        if self.status != ContractStatus::Active {
            return Err(self.not_allowed("request cancellation of"));
        }
        let service_end = now
            .date_naive()
            .checked_add_months(Months::new(self.cancellation_notice_months))
            .ok_or(TransitionError::DateOverflow)?;

        Ok(Contract {
            status: ContractStatus::CancellationRequested,
            cancellation_requested_at: Some(now),
            service_end_date: Some(service_end),
            cancellation_reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            ..self.clone()
        })
    }

    /// `cancellation_requested -> cancelled`, once `today` has reached the
    /// service end date.
    pub fn complete_cancellation(&self, today: NaiveDate) -> Result<Contract, TransitionError> {
        if self.status != ContractStatus::CancellationRequested {
            return Err(self.not_allowed("complete cancellation of"));
        }
        let service_end = self
            .service_end_date
            .ok_or(TransitionError::MissingServiceEnd)?;
        if today < service_end {
            return Err(TransitionError::NoticePeriodRunning { ends: service_end });
        }

        Ok(Contract {
            status: ContractStatus::Cancelled,
            read_only_access_until: Some(read_only_until(service_end)?),
            ..self.clone()
        })
    }

    /// `active | cancellation_requested -> expired`. Terminal.
    pub fn expire(&self) -> Result<Contract, TransitionError> {
        if !matches!(
            self.status,
            ContractStatus::Active | ContractStatus::CancellationRequested
        ) {
            return Err(self.not_allowed("expire"));
        }
        Ok(Contract {
            status: ContractStatus::Expired,
            ..self.clone()
        })
    }

    pub fn days_until_service_end(&self, today: NaiveDate) -> Option<i64> {
        days_until(self.service_end_date, today)
    }

    pub fn days_until_access_expires(&self, today: NaiveDate) -> Option<i64> {
        days_until(self.read_only_access_until, today)
    }

    /// Check the date invariants.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.service_end_date.is_some() && !self.status.may_have_service_end() {
            return Err(ContractViolation::PrematureServiceEnd(self.status));
        }
        match (self.status, self.read_only_access_until) {
            (ContractStatus::Cancelled, read_only) => {
                let service_end = self
                    .service_end_date
                    .ok_or(ContractViolation::CancelledWithoutServiceEnd)?;
                match (read_only, read_only_until(service_end)) {
                    (Some(actual), Ok(expected)) if actual != expected => {
                        Err(ContractViolation::ReadOnlyMismatch { expected, actual })
                    }
                    _ => Ok(()),
                }
            }
            (status, Some(_)) => Err(ContractViolation::PrematureReadOnly(status)),
            (_, None) => Ok(()),
        }
    }

    /// Bring a backend record in line with the local date rules.
    ///
    /// The read-only date is a projection of the service end date: it is
    /// recomputed for cancelled contracts and dropped for every other status.
    fn normalize(mut self) -> Self {
        let projected = match (self.status, self.service_end_date) {
            (ContractStatus::Cancelled, Some(end)) => read_only_until(end).ok(),
            _ => None,
        };
        if self.read_only_access_until != projected {
            debug!(
                status = %self.status,
                received = ?self.read_only_access_until,
                "read-only date replaced by local projection"
            );
            self.read_only_access_until = projected;
        }
        self
    }

    /// Freeze the derived day counts at `today` for display.
    pub fn summary(&self, today: NaiveDate) -> ContractSummary {
        ContractSummary {
            status: self.status,
            needs_signing: self.status.needs_signing(),
            contract: Some(self.clone()),
            days_until_service_end: self.days_until_service_end(today),
            days_until_access_expires: self.days_until_access_expires(today),
        }
    }
}

/// What the backend said about the host's contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractView {
    /// Only a status is known: no contract record exists yet, or the record
    /// could not be decoded.
    Absent { status: ContractStatus },
    Present(Contract),
}

impl Default for ContractView {
    fn default() -> Self {
        Self::Absent {
            status: ContractStatus::NoContract,
        }
    }
}

#[derive(Deserialize)]
struct AbsentBody {
    status: ContractStatus,
}

impl ContractView {
    /// Parse a contract response.
    ///
    /// A body without an `id` is the status-only "no contract" shape. A full
    /// record is normalized and must satisfy the date invariants.
    pub fn from_value(value: Value) -> Result<Self, UnitoError> {
        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        if !has_id {
            let AbsentBody { status } = serde_json::from_value(value)
                .map_err(|e| UnitoError::Decode(format!("contract status: {e}")))?;
            return Ok(Self::Absent { status });
        }

        let contract = serde_json::from_value::<Contract>(value)
            .map_err(|e| UnitoError::Decode(format!("contract: {e}")))?
            .normalize();
        contract
            .validate()
            .map_err(|e| UnitoError::Decode(format!("contract: {e}")))?;
        Ok(Self::Present(contract))
    }

    pub fn status(&self) -> ContractStatus {
        match self {
            Self::Absent { status } => *status,
            Self::Present(contract) => contract.status,
        }
    }

    pub fn contract(&self) -> Option<&Contract> {
        match self {
            Self::Absent { .. } => None,
            Self::Present(contract) => Some(contract),
        }
    }

    /// Local `sign` transition from whatever is known.
    pub fn sign(&self, now: DateTime<Utc>) -> Result<Contract, TransitionError> {
        match self {
            Self::Absent { status } => Contract::unsigned(*status).sign(now),
            Self::Present(contract) => contract.sign(now),
        }
    }

    pub fn summary(&self, today: NaiveDate) -> ContractSummary {
        match self {
            Self::Absent { status } => ContractSummary {
                status: *status,
                needs_signing: status.needs_signing(),
                contract: None,
                days_until_service_end: None,
                days_until_access_expires: None,
            },
            Self::Present(contract) => contract.summary(today),
        }
    }
}

/// Contract facts plus derived day counts evaluated on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSummary {
    pub status: ContractStatus,
    pub needs_signing: bool,
    pub contract: Option<Contract>,
    pub days_until_service_end: Option<i64>,
    pub days_until_access_expires: Option<i64>,
}

/// Projected dates shown before the user confirms a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationPreview {
    pub notice_months: u32,
    pub service_end_date: NaiveDate,
    pub read_only_access_until: NaiveDate,
}

/// The agreement text presented for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub version: String,
    pub title: String,
    pub body: String,
}

/// Cached contract view and template, swapped atomically.
///
/// Starts as [`ContractView::Absent`] with status `no_contract`.
pub struct ContractState {
    current: ArcSwap<ContractView>,
    template: ArcSwapOption<ContractTemplate>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ContractState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractState")
            .field("current", &self.current.load_full())
            .finish_non_exhaustive()
    }
}

impl ContractState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            current: ArcSwap::from_pointee(ContractView::default()),
            template: ArcSwapOption::empty(),
            clock,
        }
    }

    pub fn view(&self) -> Arc<ContractView> {
        self.current.load_full()
    }

    pub fn status(&self) -> ContractStatus {
        self.current.load().status()
    }

    /// A cancelled contract locks the portal.
    pub fn is_portal_locked(&self) -> bool {
        self.status() == ContractStatus::Cancelled
    }

    pub fn template(&self) -> Option<Arc<ContractTemplate>> {
        self.template.load_full()
    }

    pub fn summary(&self) -> ContractSummary {
        self.current.load().summary(self.clock.now().date_naive())
    }

    /// Replace the cached view.
    pub fn apply(&self, view: ContractView) -> Arc<ContractView> {
        let previous = self.status();
        let view = Arc::new(view);
        self.current.store(Arc::clone(&view));
        if view.status() != previous {
            info!(from = %previous, to = %view.status(), "contract status changed");
        }
        view
    }

    /// Fetch the contract. On a transport or API failure the cached view is
    /// kept.
    ///
    /// A record that fails to decode but carries a readable status still
    /// replaces the cached view with that status alone, so a cancelled
    /// contract locks the portal even when its dates are malformed.
    pub async fn fetch(&self, gateway: &RequestGateway) -> Result<Arc<ContractView>, UnitoError> {
        let body: Value = gateway.get(CONTRACT_PATH).await?;
        let status = body
            .get("status")
            .cloned()
            .and_then(|s| serde_json::from_value::<ContractStatus>(s).ok());

        match ContractView::from_value(body) {
            Ok(view) => {
                debug!(status = %view.status(), "contract fetched");
                Ok(self.apply(view))
            }
            Err(e) => {
                if let Some(status) = status {
                    warn!(%status, error = %e, "contract record rejected, keeping its status only");
                    self.apply(ContractView::Absent { status });
                }
                Err(e)
            }
        }
    }

    /// [`fetch`](Self::fetch), logging and swallowing failures.
    pub async fn refresh_quietly(&self, gateway: &RequestGateway) {
        if let Err(e) = self.fetch(gateway).await {
            warn!(error = %e, "contract refresh failed, keeping cached contract");
        }
    }

    /// Fetch and cache the active agreement template.
    pub async fn fetch_template(
        &self,
        gateway: &RequestGateway,
    ) -> Result<Arc<ContractTemplate>, UnitoError> {
        let template: ContractTemplate = gateway.get(CONTRACT_TEMPLATE_PATH).await?;
        let template = Arc::new(template);
        self.template.store(Some(Arc::clone(&template)));
        Ok(template)
    }

    /// Download everything the backend holds for this host as JSON.
    ///
    /// A read-only call, so it keeps working while the portal is locked.
    pub async fn export_data(&self, gateway: &RequestGateway) -> Result<Value, UnitoError> {
        let data: Value = gateway.get(CONTRACT_EXPORT_PATH).await?;
        info!("contract data exported");
        Ok(data)
    }

    /// Sign the agreement. The cached view changes only once the backend
    /// has confirmed.
    pub async fn sign(&self, gateway: &RequestGateway) -> Result<Arc<ContractView>, UnitoError> {
        let body: Value = gateway
            .post(
                CONTRACT_SIGN_PATH,
                Some(&serde_json::json!({ "agreement": true })),
            )
            .await?;
        let contract = require_contract(body, "sign")?;
        info!(version = %contract.version, "contract signed");
        Ok(self.apply(ContractView::Present(contract)))
    }

    /// Ask the backend to start the notice period. The cached view changes
    /// only once the backend has confirmed.
    pub async fn request_cancellation(
        &self,
        gateway: &RequestGateway,
        reason: Option<&str>,
    ) -> Result<Arc<ContractView>, UnitoError> {
        let body: Value = gateway
            .post(
                CONTRACT_CANCEL_PATH,
                Some(&serde_json::json!({ "cancellation_reason": reason.unwrap_or("") })),
            )
            .await?;
        let mut contract = require_contract(body, "cancel")?;
        contract.cancellation_reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        info!(service_end = ?contract.service_end_date, "contract cancellation requested");
        Ok(self.apply(ContractView::Present(contract)))
    }

    /// Dates a cancellation requested now would produce, without contacting
    /// the backend.
    pub fn preview_cancellation(&self) -> Result<CancellationPreview, UnitoError> {
        let view = self.view();
        let contract = view.contract().ok_or_else(|| TransitionError::NotAllowed {
            action: "request cancellation of",
            from: view.status().to_string(),
        })?;
        let requested = contract.request_cancellation(self.clock.now(), None)?;
        let service_end = requested
            .service_end_date
            .ok_or(TransitionError::MissingServiceEnd)?;
        Ok(CancellationPreview {
            notice_months: requested.cancellation_notice_months,
            service_end_date: service_end,
            read_only_access_until: read_only_until(service_end)?,
        })
    }
}

fn require_contract(body: Value, action: &str) -> Result<Contract, UnitoError> {
    match ContractView::from_value(body)? {
        ContractView::Present(contract) => Ok(contract),
        ContractView::Absent { status } => Err(UnitoError::Decode(format!(
            "{action} response carried no contract (status `{status}`)"
        ))),
    }
}
