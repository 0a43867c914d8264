use chrono::{Local, NaiveDate};
use clap::Args;
use microcredit::config::AppConfig;
use microcredit::error::AppError;
use microcredit::origination::{
    flat_rate_total, format_brl, generate_schedule, to_words, PricingTable,
};
use microcredit::proposals::{
    write_csv, InstrumentAssembler, ProposalId, ProposalServiceError, RecordStore, StoreError,
};
use microcredit::stores::LocalFileStore;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Principal in reais ("300", "300,00")
    #[arg(long, value_parser = crate::infra::parse_amount)]
    pub(crate) principal: Decimal,
    /// Number of monthly installments (1-5)
    #[arg(long)]
    pub(crate) installments: u8,
    /// Anchor date for the due-date schedule (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct WordsArgs {
    /// Amount in reais
    #[arg(value_parser = crate::infra::parse_amount)]
    pub(crate) amount: Decimal,
}

#[derive(Args, Debug)]
pub(crate) struct ContractArgs {
    /// Proposal id as shown in the staff listing
    #[arg(long)]
    pub(crate) id: String,
    /// Print the short staff summary instead of the full instrument
    #[arg(long)]
    pub(crate) summary: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Destination CSV file
    #[arg(long)]
    pub(crate) output: PathBuf,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        principal,
        installments,
        start,
    } = args;

    let quote = PricingTable::standard()
        .quote(principal, installments)
        .map_err(ProposalServiceError::from)?;
    let anchor = start.unwrap_or_else(|| Local::now().date_naive());
    let schedule = generate_schedule(anchor, quote.installment_count())
        .map_err(ProposalServiceError::from)?;
    let words = to_words(quote.total_payable()).map_err(|err| AppError::Input(err.to_string()))?;

    println!("Quote for {}", format_brl(quote.principal()));
    println!(
        "  {}x {}",
        quote.installment_count(),
        format_brl(quote.per_installment_payment())
    );
    println!("  Total payable: {} ({words})", format_brl(quote.total_payable()));
    println!("  Interest: {}", format_brl(quote.interest()));
    println!("  Due dates (from {}):", anchor.format("%d/%m/%Y"));
    for (number, date) in schedule.numbered() {
        println!("    {number}. {}", date.format("%d/%m/%Y"));
    }

    Ok(())
}

pub(crate) fn run_pricing() -> Result<(), AppError> {
    let table = PricingTable::standard();

    println!("Pricing table (table total vs principal + 20%/month)");
    for quote in table.quotes() {
        let reference = flat_rate_total(quote.principal(), quote.installment_count());
        let marker = if reference == quote.total_payable() {
            ""
        } else {
            "  <- diverges"
        };
        println!(
            "  {:>10} x{}  {:>10} each  total {:>10}  formula {:>10}{marker}",
            format_brl(quote.principal()),
            quote.installment_count(),
            format_brl(quote.per_installment_payment()),
            format_brl(quote.total_payable()),
            format_brl(reference),
        );
    }

    let divergences = table.divergence_report();
    println!(
        "\n{} of {} entries diverge from the formula",
        divergences.len(),
        table.quotes().count()
    );
    for entry in divergences {
        println!(
            "  {} in {}x: table {} vs formula {} (difference {})",
            format_brl(entry.principal),
            entry.installment_count,
            format_brl(entry.table_total),
            format_brl(entry.flat_rate_total),
            format_brl(entry.difference),
        );
    }

    Ok(())
}

pub(crate) fn run_words(args: WordsArgs) -> Result<(), AppError> {
    let words = to_words(args.amount).map_err(|err| AppError::Input(err.to_string()))?;
    println!("{words}");
    Ok(())
}

pub(crate) async fn run_contract(args: ContractArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = LocalFileStore::open(&config.storage.local_path);
    let id = ProposalId(args.id);

    let record = store
        .fetch(&id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;

    let assembler = InstrumentAssembler::new(config.creditor);
    let text = if args.summary {
        assembler.render_summary(&record)
    } else {
        assembler.render(&record)
    };
    println!("{text}");
    Ok(())
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = LocalFileStore::open(&config.storage.local_path);
    let records = store.list().await?;

    let file = File::create(&args.output)?;
    let exported = write_csv(&records, BufWriter::new(file))?;
    println!(
        "Exported {exported} proposal(s) from {} to {}",
        store.path().display(),
        args.output.display()
    );
    Ok(())
}
