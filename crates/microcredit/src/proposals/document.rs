//! Debt-confession instrument ("confissão de dívida") generated from a stored proposal.
//!
//! Documents are never persisted; they are re-rendered from the record on every request, so
//! the output must be a pure function of the record and the creditor profile.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::origination::{cardinal, format_brl, to_words, Gender};

use super::domain::ProposalRecord;

const TITLE: &str = "INSTRUMENTO PARTICULAR DE CONFISSÃO DE DÍVIDA E TERMO DE ACORDO";
const DIVIDER: &str = "------------------------------------------------------------";
const SIGNATURE_LINE: &str = "____________________________________________";

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Identification of the lending party, printed in the qualification and signature blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditorProfile {
    pub name: String,
    /// Free-text qualification, e.g. "brasileiro, advogado, inscrito na OAB/AL sob nº ...".
    pub qualification: String,
    pub tax_id: String,
    /// Venue for the forum clause and the place of signature, e.g. "Maceió/AL".
    pub city: String,
}

/// Renders instrument text for proposal records.
#[derive(Debug, Clone, Default)]
pub struct InstrumentAssembler {
    creditor: CreditorProfile,
}

impl InstrumentAssembler {
    pub fn new(creditor: CreditorProfile) -> Self {
        Self { creditor }
    }

    pub fn creditor(&self) -> &CreditorProfile {
        &self.creditor
    }

    /// Full legal instrument. Missing applicant data shows up as `<<FIELD>>` tokens.
    pub fn render(&self, record: &ProposalRecord) -> String {
        let applicant = &record.applicant;
        let address = &applicant.address;
        let creditor_name = filled(&self.creditor.name, "NOME DO CREDOR");
        let city = filled(&self.creditor.city, "CIDADE");

        let total = amount_clause(record.total_payable);
        let installment = amount_clause(record.per_installment_payment);
        let count = record.installment_count;
        let count_words = cardinal(u64::from(count), Gender::Feminine);
        let installments_phrase = if count == 1 {
            format!("{count} ({count_words}) parcela mensal")
        } else {
            format!("{count} ({count_words}) parcelas mensais e sucessivas")
        };

        let complement = address
            .complement
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| format!("compl: {value}, "))
            .unwrap_or_default();

        let mut lines = vec![
            TITLE.to_string(),
            String::new(),
            "São partes neste instrumento:".to_string(),
            String::new(),
            format!(
                "a) de um lado, na qualidade de CREDOR, {}, {}, inscrito no CPF sob nº {}, doravante denominado simplesmente CREDOR.",
                creditor_name,
                filled(&self.creditor.qualification, "QUALIFICAÇÃO DO CREDOR"),
                filled(&self.creditor.tax_id, "CPF DO CREDOR"),
            ),
            String::new(),
            format!(
                "b) de outro lado, na qualidade de DEVEDOR(A), {}, nacionalidade: {}, estado civil: {}, profissão: {}, RG nº {} - {}, inscrito(a) no CPF sob nº {}, residente e domiciliado(a) no endereço: {}, nº {}, {}bairro: {}, {} / {}, CEP nº {}.",
                filled(&applicant.full_name, "NOME COMPLETO"),
                filled(&applicant.nationality, "NACIONALIDADE"),
                filled(&applicant.marital_status, "ESTADO CIVIL"),
                filled(&applicant.profession, "PROFISSÃO"),
                filled(&applicant.identity_document, "RG"),
                filled(&applicant.issuing_authority, "ÓRGÃO"),
                filled(&applicant.tax_id, "CPF"),
                filled(&address.street, "RUA"),
                filled(&address.number, "Nº"),
                complement,
                filled(&address.neighborhood, "BAIRRO"),
                filled(&address.city, "CIDADE"),
                filled(&address.state, "UF"),
                filled(&address.postal_code, "CEP"),
            ),
            String::new(),
            "As partes acima qualificadas, juridicamente capazes e abaixo assinadas pactuam entre si, justo e acordado, o presente Instrumento Particular de Confissão de Dívida e Termo de Acordo que se regerá pelas seguintes cláusulas:".to_string(),
            String::new(),
            format!(
                "CLÁUSULA PRIMEIRA: O(s) DEVEDOR(es) acima qualificado(s), nesta data confessa(m) e declara(m) dever ao CREDOR, a importância líquida e certa de {total}."
            ),
            String::new(),
            "CLÁUSULA SEGUNDA: A importância descrita na Cláusula 1ª é originária de intermediação e fomento mercantil (microcrédito).".to_string(),
            String::new(),
            format!(
                "CLÁUSULA TERCEIRA: O(s) DEVEDOR(es) compromete(m)-se a pagar o débito no valor total de {total}, em {installments_phrase} de {installment}."
            ),
            String::new(),
            "Cronograma de Vencimentos:".to_string(),
        ];

        lines.extend(
            record
                .installment_dates
                .numbered()
                .map(|(number, due)| format!("Parcela {number} - Vencimento: {}", short_date(due))),
        );

        lines.extend([
            String::new(),
            "CLÁUSULA QUARTA: As parcelas pactuadas na Cláusula 3ª deverão ser pagas por meio de transferência PIX para a chave indicada pelo CREDOR ou via boleto bancário, servindo o comprovante de transação como quitação da respectiva parcela.".to_string(),
            String::new(),
            "CLÁUSULA QUINTA: O não pagamento de quaisquer das parcelas previstas no presente instrumento nas datas aprazadas fará incidir sobre o débito multa de 15%, juros de 1% ao mês e atualização monetária. O atraso superior a 5 dias tornará imediatamente vencidas e exigíveis todas as parcelas vincendas.".to_string(),
            "Parágrafo Único: Este documento constitui-se em TÍTULO EXECUTIVO EXTRAJUDICIAL, apto a embasar processo de execução em caso de inadimplência, com renúncia expressa do devedor a qualquer alegação de impenhorabilidade de bens.".to_string(),
            String::new(),
            "CLÁUSULA SEXTA: O presente instrumento é celebrado em caráter irrevogável e irretratável, vinculando as partes e seus sucessores a qualquer título.".to_string(),
            String::new(),
            format!(
                "CLÁUSULA SÉTIMA: As partes elegem o foro da Comarca de {city} para dirimir quaisquer dúvidas oriundas deste contrato."
            ),
            String::new(),
            format!("{city}, {}.", long_date(record.submitted_at.date_naive())),
            String::new(),
            SIGNATURE_LINE.to_string(),
            filled(&applicant.full_name, "NOME DO DEVEDOR").to_uppercase(),
            format!("DEVEDOR - CPF: {}", filled(&applicant.tax_id, "CPF")),
            String::new(),
            SIGNATURE_LINE.to_string(),
            creditor_name.to_uppercase(),
            "CREDOR".to_string(),
        ]);

        lines.join("\n")
    }

    /// Compact staff summary used for downloads and the outbound notification body.
    pub fn render_summary(&self, record: &ProposalRecord) -> String {
        let applicant = &record.applicant;
        let address = &applicant.address;
        let submitted_on = short_date(record.submitted_at.date_naive());
        let total_words = to_words(record.total_payable)
            .map(|words| words.to_uppercase())
            .unwrap_or_else(|_| placeholder("VALOR POR EXTENSO"));

        let mut lines = vec![
            TITLE.to_string(),
            String::new(),
            format!("PROPOSTA: {}", record.id),
            format!("CREDOR: {}", filled(&self.creditor.name, "NOME DO CREDOR")),
            format!(
                "DEVEDOR: {}",
                filled(&applicant.full_name, "NOME COMPLETO").to_uppercase()
            ),
            format!("CPF: {}", filled(&applicant.tax_id, "CPF")),
            format!("DATA: {submitted_on}"),
            format!("STATUS: {}", record.status.display_label()),
            String::new(),
            DIVIDER.to_string(),
            "CONFISSÃO DE VALORES".to_string(),
            DIVIDER.to_string(),
            String::new(),
            format!("VALOR DO CRÉDITO: {}", format_brl(record.principal)),
            format!("TOTAL A PAGAR (COM JUROS): {}", format_brl(record.total_payable)),
            format!("EXTENSO: {total_words}"),
            String::new(),
            format!(
                "PAGAMENTO: {} parcelas de {}",
                record.installment_count,
                format_brl(record.per_installment_payment)
            ),
            String::new(),
            "CRONOGRAMA DE VENCIMENTOS:".to_string(),
        ];

        lines.extend(
            record
                .installment_dates
                .numbered()
                .map(|(number, due)| format!("Parcela {number}: Vencimento em {}", short_date(due))),
        );

        lines.extend([
            String::new(),
            DIVIDER.to_string(),
            "INFORMAÇÕES ADICIONAIS".to_string(),
            DIVIDER.to_string(),
            format!(
                "PIX PARA DEPÓSITO DO CLIENTE: {}",
                filled(&applicant.payout_key, "CHAVE PIX")
            ),
            format!("WHATSAPP: {}", filled(&applicant.whatsapp, "WHATSAPP")),
            format!(
                "ENDEREÇO: {}, {}, {}, {}-{}",
                filled(&address.street, "RUA"),
                filled(&address.number, "Nº"),
                filled(&address.neighborhood, "BAIRRO"),
                filled(&address.city, "CIDADE"),
                filled(&address.state, "UF"),
            ),
        ]);

        lines.join("\n")
    }

    /// Subject line for the staff notification of a new proposal.
    pub fn notification_subject(&self, record: &ProposalRecord) -> String {
        format!(
            "NOVO CLIENTE: {} ({})",
            filled(&record.applicant.full_name, "NOME COMPLETO"),
            format_brl(record.total_payable)
        )
    }
}

fn placeholder(token: &str) -> String {
    format!("<<{token}>>")
}

fn filled<'a>(value: &'a str, token: &str) -> Cow<'a, str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Cow::Owned(placeholder(token))
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Written-out amount, or the `<<VALOR POR EXTENSO>>` token when it cannot be spelled.
pub(crate) fn amount_in_words(amount: Decimal) -> String {
    to_words(amount).unwrap_or_else(|_| placeholder("VALOR POR EXTENSO"))
}

/// `R$ 478,80 (quatrocentos e setenta e oito reais e oitenta centavos)`
fn amount_clause(amount: Decimal) -> String {
    format!("{} ({})", format_brl(amount), amount_in_words(amount))
}

fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn long_date(date: NaiveDate) -> String {
    format!(
        "{:02} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::tests::common::{applicant, record_at};
    use rust_decimal_macros::dec;

    fn assembler() -> InstrumentAssembler {
        InstrumentAssembler::new(CreditorProfile {
            name: "Fomento Exemplo Ltda".to_string(),
            qualification: "pessoa jurídica de direito privado".to_string(),
            tax_id: "000.000.000-00".to_string(),
            city: "Maceió/AL".to_string(),
        })
    }

    #[test]
    fn renders_amounts_in_figures_and_words() {
        let record = record_at(applicant(), dec!(300), 3, "2024-01-01T10:00:00-03:00");
        let text = assembler().render(&record);

        assert!(text.starts_with(TITLE));
        assert!(text.contains(
            "R$ 478,80 (quatrocentos e setenta e oito reais e oitenta centavos)"
        ));
        assert!(text.contains("3 (três) parcelas mensais e sucessivas de R$ 159,60 (cento e cinquenta e nove reais e sessenta centavos)"));
        assert!(text.contains("Maceió/AL, 01 de janeiro de 2024."));
    }

    #[test]
    fn enumerates_every_due_date() {
        let record = record_at(applicant(), dec!(300), 3, "2024-01-01T10:00:00-03:00");
        let text = assembler().render(&record);

        assert!(text.contains("Parcela 1 - Vencimento: 31/01/2024"));
        assert!(text.contains("Parcela 2 - Vencimento: 01/03/2024"));
        assert!(text.contains("Parcela 3 - Vencimento: 31/03/2024"));
        assert!(!text.contains("Parcela 4"));
    }

    #[test]
    fn single_installment_reads_in_the_singular() {
        let record = record_at(applicant(), dec!(100), 1, "2024-05-10T09:00:00-03:00");
        let text = assembler().render(&record);
        assert!(text.contains("1 (uma) parcela mensal de R$ 120,00 (cento e vinte reais)"));
    }

    #[test]
    fn missing_fields_render_visible_placeholders() {
        let mut details = applicant();
        details.nationality.clear();
        details.address.street = "   ".to_string();
        details.address.complement = None;
        let record = record_at(details, dec!(200), 2, "2024-02-01T12:00:00-03:00");

        let text = InstrumentAssembler::default().render(&record);
        assert!(text.contains("nacionalidade: <<NACIONALIDADE>>"));
        assert!(text.contains("endereço: <<RUA>>"));
        assert!(text.contains("<<NOME DO CREDOR>>"));
        assert!(!text.contains("compl:"));
        assert!(!text.contains(": ,"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let record = record_at(applicant(), dec!(400), 4, "2024-03-15T08:30:00-03:00");
        let assembler = assembler();
        assert_eq!(assembler.render(&record), assembler.render(&record));
    }

    #[test]
    fn summary_lists_totals_and_payout_key() {
        let record = record_at(applicant(), dec!(300), 3, "2024-01-01T10:00:00-03:00");
        let summary = assembler().render_summary(&record);

        assert!(summary.contains("TOTAL A PAGAR (COM JUROS): R$ 478,80"));
        assert!(summary.contains("EXTENSO: QUATROCENTOS E SETENTA E OITO REAIS E OITENTA CENTAVOS"));
        assert!(summary.contains("Parcela 3: Vencimento em 31/03/2024"));
        assert!(summary.contains("PIX PARA DEPÓSITO DO CLIENTE: maria@example.com"));
        assert_eq!(
            assembler().notification_subject(&record),
            "NOVO CLIENTE: Maria da Silva (R$ 478,80)"
        );
    }

    #[test]
    fn unspellable_amounts_render_the_words_token() {
        assert_eq!(
            amount_in_words(dec!(159.60)),
            "cento e cinquenta e nove reais e sessenta centavos"
        );
        assert_eq!(amount_in_words(dec!(-1)), "<<VALOR POR EXTENSO>>");
        assert_eq!(amount_in_words(dec!(1000000000)), "<<VALOR POR EXTENSO>>");
    }
}
