use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::money::round_cents;

/// Flat monthly rate quoted to applicants (20% a.m.).
pub const MONTHLY_RATE: Decimal = dec!(0.20);
pub const MIN_INSTALLMENTS: u8 = 1;
pub const MAX_INSTALLMENTS: u8 = 5;

/// One principal tier and the fixed payment for each offered installment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub principal: Decimal,
    pub payments: BTreeMap<u8, Decimal>,
}

impl PricingTier {
    fn from_row(principal: Decimal, payments: [Decimal; MAX_INSTALLMENTS as usize]) -> Self {
        let payments = (MIN_INSTALLMENTS..=MAX_INSTALLMENTS)
            .zip(payments)
            .collect::<BTreeMap<_, _>>();
        Self {
            principal,
            payments,
        }
    }
}

/// Immutable table of discrete principal tiers. Payments are looked up, never interpolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingTable {
    tiers: Vec<PricingTier>,
}

impl PricingTable {
    /// The product's published table (R$100 to R$500, one to five installments).
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                PricingTier::from_row(
                    dec!(100),
                    [dec!(120.00), dec!(70.00), dec!(53.20), dec!(45.00), dec!(40.00)],
                ),
                PricingTier::from_row(
                    dec!(200),
                    [dec!(240.00), dec!(140.00), dec!(106.40), dec!(90.00), dec!(80.00)],
                ),
                PricingTier::from_row(
                    dec!(300),
                    [dec!(360.00), dec!(210.00), dec!(159.60), dec!(135.00), dec!(120.00)],
                ),
                PricingTier::from_row(
                    dec!(400),
                    [dec!(480.00), dec!(280.00), dec!(213.60), dec!(180.00), dec!(160.00)],
                ),
                PricingTier::from_row(
                    dec!(500),
                    [dec!(600.00), dec!(350.00), dec!(266.00), dec!(225.00), dec!(200.00)],
                ),
            ],
        }
    }

    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// Look up the binding quote for a tier and installment count.
    pub fn quote(&self, principal: Decimal, installments: u8) -> Result<Quote, QuoteError> {
        let tier = self
            .tiers
            .iter()
            .find(|tier| tier.principal == principal)
            .ok_or(QuoteError::UnknownPrincipal(principal))?;

        let payment = tier
            .payments
            .get(&installments)
            .copied()
            .ok_or(QuoteError::UnsupportedInstallments {
                principal,
                installments,
            })?;

        Ok(Quote::from_payment(tier.principal, installments, payment))
    }

    /// Every quote the table can produce, tier by tier.
    pub fn quotes(&self) -> impl Iterator<Item = Quote> + '_ {
        self.tiers.iter().flat_map(|tier| {
            tier.payments
                .iter()
                .map(|(count, payment)| Quote::from_payment(tier.principal, *count, *payment))
        })
    }

    /// Table entries whose total differs from the flat-rate contract formula.
    ///
    /// `difference` is formula minus table, so a negative value means the table charges more.
    pub fn divergence_report(&self) -> Vec<FormulaDivergence> {
        self.quotes()
            .filter_map(|quote| {
                let flat = flat_rate_total(quote.principal(), quote.installment_count());
                let difference = flat - quote.total_payable();
                (!difference.is_zero()).then(|| FormulaDivergence {
                    principal: quote.principal(),
                    installment_count: quote.installment_count(),
                    table_total: quote.total_payable(),
                    flat_rate_total: flat,
                    difference,
                })
            })
            .collect()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derived pricing for one request. `total_payable` is always `payment × count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    principal: Decimal,
    installment_count: u8,
    per_installment_payment: Decimal,
    total_payable: Decimal,
}

impl Quote {
    pub(crate) fn from_payment(principal: Decimal, installment_count: u8, payment: Decimal) -> Self {
        Self {
            principal,
            installment_count,
            per_installment_payment: payment,
            total_payable: payment * Decimal::from(installment_count),
        }
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn installment_count(&self) -> u8 {
        self.installment_count
    }

    pub fn per_installment_payment(&self) -> Decimal {
        self.per_installment_payment
    }

    pub fn total_payable(&self) -> Decimal {
        self.total_payable
    }

    pub fn interest(&self) -> Decimal {
        self.total_payable - self.principal
    }
}

/// Contract-total formula used outside the quote table: principal plus simple monthly
/// interest for each installment. Kept as a reference figure; table totals are binding.
pub fn flat_rate_total(principal: Decimal, installments: u8) -> Decimal {
    principal + principal * MONTHLY_RATE * Decimal::from(installments)
}

pub fn flat_rate_installment(principal: Decimal, installments: u8) -> Decimal {
    if installments == 0 {
        return Decimal::ZERO;
    }
    round_cents(flat_rate_total(principal, installments) / Decimal::from(installments))
}

/// Side-by-side totals for one table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaDivergence {
    pub principal: Decimal,
    pub installment_count: u8,
    pub table_total: Decimal,
    pub flat_rate_total: Decimal,
    pub difference: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("R$ {0} is not an offered principal tier")]
    UnknownPrincipal(Decimal),
    #[error("{installments} installments are not offered for R$ {principal}")]
    UnsupportedInstallments { principal: Decimal, installments: u8 },
}
