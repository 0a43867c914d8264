use std::io::Write;

use serde::Serialize;

use super::domain::ProposalRecord;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    submitted_at: String,
    full_name: &'a str,
    tax_id: &'a str,
    birth_date: String,
    whatsapp: &'a str,
    email: &'a str,
    city: &'a str,
    state: &'a str,
    principal: String,
    installment_count: u8,
    per_installment_payment: String,
    total_payable: String,
    first_due_date: String,
    final_due_date: String,
    status: &'static str,
    payout_key: &'a str,
}

impl<'a> From<&'a ProposalRecord> for ExportRow<'a> {
    fn from(record: &'a ProposalRecord) -> Self {
        let dates = record.installment_dates.dates();
        Self {
            id: record.id.as_str(),
            submitted_at: record.submitted_at.to_rfc3339(),
            full_name: &record.applicant.full_name,
            tax_id: &record.applicant.tax_id,
            birth_date: record.applicant.birth_date.to_string(),
            whatsapp: &record.applicant.whatsapp,
            email: &record.applicant.email,
            city: &record.applicant.address.city,
            state: &record.applicant.address.state,
            principal: format!("{:.2}", record.principal),
            installment_count: record.installment_count,
            per_installment_payment: format!("{:.2}", record.per_installment_payment),
            total_payable: format!("{:.2}", record.total_payable),
            first_due_date: dates.first().map(ToString::to_string).unwrap_or_default(),
            final_due_date: dates.last().map(ToString::to_string).unwrap_or_default(),
            status: record.status.label(),
            payout_key: &record.applicant.payout_key,
        }
    }
}

/// Write one CSV row per record (with a header row) and return the number of records written.
pub fn write_csv<W: Write>(records: &[ProposalRecord], writer: W) -> Result<usize, csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(ExportRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::tests::common::{applicant, record_at};
    use rust_decimal_macros::dec;

    #[test]
    fn writes_header_and_one_row_per_record() {
        let record = record_at(applicant(), dec!(300), 3, "2024-01-01T10:00:00-03:00");
        let mut buffer = Vec::new();
        let written = write_csv(std::slice::from_ref(&record), &mut buffer).expect("csv export");
        assert_eq!(written, 1);

        let text = String::from_utf8(buffer).expect("utf-8");
        let mut lines = text.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("id,submitted_at,full_name,tax_id"));

        let row = lines.next().expect("data row");
        assert!(row.starts_with(record.id.as_str()));
        assert!(row.contains("Maria da Silva"));
        assert!(row.contains("478.80"));
        assert!(row.contains("2024-01-31,2024-03-31,pending"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_exports_write_nothing() {
        let mut buffer = Vec::new();
        assert_eq!(write_csv(&[], &mut buffer).expect("csv export"), 0);
        assert!(buffer.is_empty());
    }
}
