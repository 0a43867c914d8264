use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::origination::{generate_schedule, InstallmentSchedule, Quote, ScheduleError};

const PROPOSAL_ID_LEN: usize = 9;

/// Short opaque identifier assigned to a proposal at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub String);

impl ProposalId {
    /// Nine uppercase alphanumeric characters drawn from a random v4 UUID.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..PROPOSAL_ID_LEN].to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a proposal. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    #[serde(alias = "Pendente", alias = "pendente", alias = "Pending")]
    Pending,
    #[serde(alias = "Aprovado", alias = "aprovado", alias = "Approved")]
    Approved,
    #[serde(alias = "Recusado", alias = "recusado", alias = "Rejected")]
    Rejected,
}

impl ProposalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
        }
    }

    /// Label shown to applicants in the client portal.
    pub const fn display_label(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "Em Análise",
            ProposalStatus::Approved => "Aprovado",
            ProposalStatus::Rejected => "Recusado",
        }
    }

    pub const fn client_message(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "Estamos analisando seus documentos. Prazo de até 48h.",
            ProposalStatus::Approved => {
                "Seu crédito foi aprovado! O contrato foi enviado para seu e-mail."
            }
            ProposalStatus::Rejected => {
                "Infelizmente sua proposta não foi aprovada neste momento."
            }
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ProposalStatus::Approved | ProposalStatus::Rejected)
    }

    /// Same-state writes are allowed everywhere so status updates stay idempotent.
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        self == next || (self == ProposalStatus::Pending && next.is_terminal())
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostalAddress {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalReference {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

/// Applicant data captured by the intake form. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub full_name: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub identity_document: String,
    #[serde(default)]
    pub issuing_authority: String,
    /// CPF as typed by the applicant; punctuation is kept.
    pub tax_id: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: PostalAddress,
    #[serde(default)]
    pub monthly_income: String,
    #[serde(default)]
    pub work_situation: String,
    #[serde(default)]
    pub payout_key: String,
    #[serde(default)]
    pub first_reference: PersonalReference,
    #[serde(default)]
    pub second_reference: PersonalReference,
}

/// Intake payload: applicant data plus the simulated loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSubmission {
    #[serde(flatten)]
    pub applicant: ApplicantDetails,
    pub principal: Decimal,
    pub installment_count: u8,
}

/// Persistent proposal: applicant snapshot, frozen financial terms, and lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub submitted_at: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub applicant: ApplicantDetails,
    pub principal: Decimal,
    pub installment_count: u8,
    pub per_installment_payment: Decimal,
    pub total_payable: Decimal,
    pub installment_dates: InstallmentSchedule,
    #[serde(default)]
    pub status: ProposalStatus,
}

impl ProposalRecord {
    /// Freeze a quote into a new pending record. Due dates are anchored on the local
    /// calendar date of submission.
    pub fn create(
        id: ProposalId,
        submitted_at: DateTime<FixedOffset>,
        applicant: ApplicantDetails,
        quote: &Quote,
    ) -> Result<Self, ScheduleError> {
        let installment_dates =
            generate_schedule(submitted_at.date_naive(), quote.installment_count())?;

        Ok(Self {
            id,
            submitted_at,
            applicant,
            principal: quote.principal(),
            installment_count: quote.installment_count(),
            per_installment_payment: quote.per_installment_payment(),
            total_payable: quote.total_payable(),
            installment_dates,
            status: ProposalStatus::Pending,
        })
    }

    pub fn quote(&self) -> Quote {
        Quote::from_payment(
            self.principal,
            self.installment_count,
            self.per_installment_payment,
        )
    }

    /// Copy of this record with only `status` replaced. The receiver is never mutated.
    pub fn with_status(&self, status: ProposalStatus) -> Result<Self, TransitionError> {
        if !self.status.can_transition_to(status) {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.status,
                to: status,
            });
        }

        Ok(Self {
            status,
            ..self.clone()
        })
    }

    pub fn summary(&self) -> ProposalSummary {
        ProposalSummary {
            id: self.id.clone(),
            applicant_name: self.applicant.full_name.clone(),
            submitted_at: self.submitted_at,
            principal: self.principal,
            installment_count: self.installment_count,
            per_installment_payment: self.per_installment_payment,
            total_payable: self.total_payable,
            installment_dates: self.installment_dates.clone(),
            status: self.status.label(),
            status_label: self.status.display_label(),
            status_message: self.status.client_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("proposal {id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub id: ProposalId,
    pub from: ProposalStatus,
    pub to: ProposalStatus,
}

/// Client-facing view of a proposal without contact, address or reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalSummary {
    pub id: ProposalId,
    pub applicant_name: String,
    pub submitted_at: DateTime<FixedOffset>,
    pub principal: Decimal,
    pub installment_count: u8,
    pub per_installment_payment: Decimal,
    pub total_payable: Decimal,
    pub installment_dates: InstallmentSchedule,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_message: &'static str,
}
