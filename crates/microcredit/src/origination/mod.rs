//! Deterministic loan arithmetic: the pricing table, BRL formatting, written-out amounts,
//! and the 30-day due-date cadence.

pub mod money;
pub mod pricing;
pub mod schedule;
pub mod words;

pub use money::{format_brl, round_cents};
pub use pricing::{
    flat_rate_installment, flat_rate_total, FormulaDivergence, PricingTable, PricingTier, Quote,
    QuoteError, MAX_INSTALLMENTS, MIN_INSTALLMENTS, MONTHLY_RATE,
};
pub use schedule::{generate_schedule, InstallmentSchedule, ScheduleError, CADENCE_DAYS};
pub use words::{cardinal, to_words, Gender, WordsError};
