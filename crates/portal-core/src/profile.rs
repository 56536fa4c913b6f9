//! # Account Profile
//!
//! The value object returned by the remote profile service. A profile is an
//! immutable snapshot: every successful login, registration or refresh
//! replaces it wholesale, and logout discards it.
//!
//! ## Wire Tolerance
//!
//! Every enum carries a `#[serde(other)]` catch-all, and every optional
//! dimension defaults to `None` when absent, so a service that adds a role
//! or status never breaks decoding on the client.
//!
//! ## Investment Stage Casing
//!
//! Stage names arrive as both `PENDING_KYC` and `pending_kyc` depending on
//! the producing code path. [`InvestmentStage::name`] is normalised to upper
//! snake case at decode time so comparisons use a single convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Investment-stage name that gates investors behind KYC upload.
pub const PENDING_KYC_STAGE: &str = "PENDING_KYC";

/// Activation-stage value marking a fully provisioned account.
pub const ACTIVATION_COMPLETED: &str = "completed";

// -- Identifiers ---------------------------------------------------------------

/// Record identifier as issued by the remote service.
///
/// The service emits integer keys for some records and string keys for
/// others; both decode into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

// -- Typed enums matching service values -------------------------------------

/// Portal role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every screen.
    Admin,
    /// Reviews investor KYC submissions.
    #[serde(alias = "onboarding-officer", alias = "kyc_officer")]
    OnboardingOfficer,
    /// Onboarding or onboarded investor.
    Investor,
    /// Read-only visitor account.
    Guest,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Return the wire representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::OnboardingOfficer => "onboarding_officer",
            Self::Investor => "investor",
            Self::Guest => "guest",
            Self::Unknown => "unknown",
        }
    }
}

/// Account standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account in good standing.
    Active,
    /// Account disabled by its owner or not yet enabled.
    Inactive,
    /// Account disabled by an administrator.
    Suspended,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

/// Identity-verification status of an investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// No documents uploaded yet.
    NotSubmitted,
    /// Documents uploaded, awaiting officer review.
    Pending,
    /// Identity verified.
    Approved,
    /// Submission rejected by an officer.
    Rejected,
    /// Forward-compatible catch-all.
    #[serde(other)]
    Unknown,
}

// -- Nested records -----------------------------------------------------------

/// A named milestone in an investor's onboarding progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentStage {
    /// Stage identifier.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Machine name, always upper snake case (e.g. `PENDING_KYC`).
    #[serde(deserialize_with = "upper_snake")]
    pub name: String,
    /// Human-readable label.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Longer description shown on the dashboard.
    #[serde(default)]
    pub description: Option<String>,
}

impl InvestmentStage {
    /// Build a stage from its machine name, normalising casing.
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: normalize_stage_name(name),
            display_name: None,
            description: None,
        }
    }

    /// Whether this stage blocks the investor until KYC documents are uploaded.
    pub fn is_pending_kyc(&self) -> bool {
        self.name == PENDING_KYC_STAGE
    }
}

/// Account-provisioning phase that precedes normal usability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationStage {
    /// Current step, e.g. `pending_password` or `completed`.
    pub stage: String,
    /// Free-form status reported alongside the step.
    #[serde(default)]
    pub status: Option<String>,
    /// Whether the user must act before the account is usable.
    #[serde(default)]
    pub requires_action: bool,
    /// Whether the activation link has expired.
    #[serde(default)]
    pub is_expired: bool,
    /// When the activation link expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ActivationStage {
    /// A completed activation with nothing left to do.
    pub fn completed() -> Self {
        Self {
            stage: ACTIVATION_COMPLETED.to_string(),
            status: None,
            requires_action: false,
            is_expired: false,
            expires_at: None,
        }
    }

    /// A pending activation at `stage` that requires user action.
    pub fn pending(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: None,
            requires_action: true,
            is_expired: false,
            expires_at: None,
        }
    }

    /// Whether the stage has reached `completed`.
    pub fn is_completed(&self) -> bool {
        self.stage.eq_ignore_ascii_case(ACTIVATION_COMPLETED)
    }

    /// Whether the user must still go through the activation screen.
    pub fn needs_activation(&self) -> bool {
        !self.is_completed() || self.requires_action
    }
}

// -- Profile ------------------------------------------------------------------

/// Snapshot of the signed-in account as reported by the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Account identifier.
    pub id: RecordId,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Portal role. `None` when the service omits it.
    #[serde(default)]
    pub role: Option<Role>,
    /// Account standing.
    #[serde(default)]
    pub status: Option<AccountStatus>,
    /// Identity-verification status.
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
    /// Onboarding milestone.
    #[serde(default)]
    pub investment_stage: Option<InvestmentStage>,
    /// Provisioning phase, present until activation completes.
    #[serde(default)]
    pub activation_stage: Option<ActivationStage>,
    /// Whether the NDA has been accepted. `None` when not applicable.
    #[serde(default)]
    pub nda_accepted: Option<bool>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Account creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last profile update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountProfile {
    /// Minimal profile with only identity fields set.
    pub fn new(
        id: impl Into<RecordId>,
        email: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: full_name.into(),
            role: None,
            status: None,
            kyc_status: None,
            investment_stage: None,
            activation_stage: None,
            nda_accepted: None,
            phone: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style role setter.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Builder-style KYC setter.
    pub fn with_kyc(mut self, kyc: KycStatus) -> Self {
        self.kyc_status = Some(kyc);
        self
    }

    /// Builder-style NDA setter.
    pub fn with_nda(mut self, accepted: bool) -> Self {
        self.nda_accepted = Some(accepted);
        self
    }

    /// Builder-style activation setter.
    pub fn with_activation(mut self, stage: ActivationStage) -> Self {
        self.activation_stage = Some(stage);
        self
    }

    /// Builder-style investment-stage setter.
    pub fn with_investment_stage(mut self, stage: InvestmentStage) -> Self {
        self.investment_stage = Some(stage);
        self
    }

    /// Whether the role is exactly `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// Whether activation is unfinished or explicitly requires action.
    pub fn needs_activation(&self) -> bool {
        self.activation_stage
            .as_ref()
            .is_some_and(ActivationStage::needs_activation)
    }

    /// Whether KYC documents still have to be uploaded.
    ///
    /// True when the investment stage is `PENDING_KYC` or KYC was never
    /// submitted. A submission awaiting review does not count.
    pub fn needs_kyc_upload(&self) -> bool {
        self.investment_stage
            .as_ref()
            .is_some_and(InvestmentStage::is_pending_kyc)
            || self.kyc_status == Some(KycStatus::NotSubmitted)
    }

    /// Whether the NDA was explicitly declined or not yet accepted.
    ///
    /// An absent flag does not gate the user.
    pub fn needs_nda(&self) -> bool {
        self.nda_accepted == Some(false)
    }
}

fn normalize_stage_name(name: &str) -> String {
    name.trim().replace(['-', ' '], "_").to_ascii_uppercase()
}

fn upper_snake<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| normalize_stage_name(&s))
}
