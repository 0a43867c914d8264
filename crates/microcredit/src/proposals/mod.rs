//! Proposal records: intake, staff review, client lookup, and the rendered debt instrument.
//!
//! Records are written to a local cache and, when configured, to a remote store of record.
//! Reads merge both sources with remote copies taking precedence.

pub mod access;
pub mod document;
pub mod domain;
pub mod export;
pub mod reconciliation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use access::{
    AccessError, Authenticator, SessionToken, StaffSession, StaticTokenAuthenticator,
};
pub use document::{CreditorProfile, InstrumentAssembler};
pub use domain::{
    ApplicantDetails, PersonalReference, PostalAddress, ProposalId, ProposalRecord,
    ProposalStatus, ProposalSubmission, ProposalSummary, TransitionError,
};
pub use export::write_csv;
pub use reconciliation::{
    find_by_identity, merge_all, tax_id_digits, IdentityQuery, IdentityQueryError,
};
pub use repository::{Notifier, NotifyError, ProposalEvent, RecordStore, StoreError};
pub use router::proposal_router;
pub use service::{IntakeError, ProposalService, ProposalServiceError};
