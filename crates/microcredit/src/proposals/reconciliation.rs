//! Read-only merge of the two record sources and the applicant self-lookup filter.
//!
//! Nothing here touches a store; callers hand in whatever each source returned.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::domain::ProposalRecord;

/// Deduplicate `remote` followed by `local`, keeping the first copy of each id.
///
/// Remote copies therefore win over cached ones for the same proposal.
pub fn merge_all(local: Vec<ProposalRecord>, remote: Vec<ProposalRecord>) -> Vec<ProposalRecord> {
    let mut seen = HashSet::with_capacity(local.len() + remote.len());
    remote
        .into_iter()
        .chain(local)
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

/// Digits of a CPF, whatever punctuation it was typed with.
pub fn tax_id_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalized identity used by the client portal.
///
/// This is a low-assurance filter (tax id plus birth date are both semi-public data), not
/// authentication. Anything it returns should be treated as visible to whoever typed the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityQuery {
    tax_id_digits: String,
    birth_date: NaiveDate,
}

impl IdentityQuery {
    pub fn new(tax_id: &str, birth_date: NaiveDate) -> Result<Self, IdentityQueryError> {
        let digits = tax_id_digits(tax_id);
        if digits.is_empty() {
            return Err(IdentityQueryError::MissingTaxIdDigits);
        }
        Ok(Self {
            tax_id_digits: digits,
            birth_date,
        })
    }

    /// Parse raw form input; the birth date must be `YYYY-MM-DD`.
    pub fn parse(tax_id: &str, birth_date: &str) -> Result<Self, IdentityQueryError> {
        let birth_date = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| IdentityQueryError::InvalidBirthDate(birth_date.to_string()))?;
        Self::new(tax_id, birth_date)
    }

    pub fn matches(&self, record: &ProposalRecord) -> bool {
        record.applicant.birth_date == self.birth_date
            && tax_id_digits(&record.applicant.tax_id) == self.tax_id_digits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityQueryError {
    #[error("tax id must contain digits")]
    MissingTaxIdDigits,
    #[error("birth date '{0}' must be formatted as YYYY-MM-DD")]
    InvalidBirthDate(String),
}

/// Every record belonging to the queried identity, in input order. Empty when none match.
pub fn find_by_identity(records: &[ProposalRecord], query: &IdentityQuery) -> Vec<ProposalRecord> {
    records
        .iter()
        .filter(|record| query.matches(record))
        .cloned()
        .collect()
}
