//! Brazilian Portuguese written form of currency amounts ("valor por extenso").
//!
//! Amounts are split into magnitude groups of three digits. Each group below one thousand is
//! spelled as hundreds, tens, and units joined by "e"; groups are then joined from the largest
//! down, with "e" only in front of the last group when that group is below one hundred or is a
//! round hundred ("mil e cem", "mil duzentos e cinquenta").

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::money::round_cents;

const UNITS: [&str; 10] = [
    "", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove",
];
const TEENS: [&str; 10] = [
    "dez",
    "onze",
    "doze",
    "treze",
    "quatorze",
    "quinze",
    "dezesseis",
    "dezessete",
    "dezoito",
    "dezenove",
];
const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];
const HUNDREDS: [&str; 10] = [
    "",
    "cento",
    "duzentos",
    "trezentos",
    "quatrocentos",
    "quinhentos",
    "seiscentos",
    "setecentos",
    "oitocentos",
    "novecentos",
];

const THOUSAND: u64 = 1_000;
const MILLION: u64 = 1_000_000;

/// Largest whole-real amount the converter spells out.
pub const MAX_WHOLE_AMOUNT: u64 = 999_999_999;

/// Grammatical gender of the counted noun ("dois reais" vs "duas parcelas").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    Feminine,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordsError {
    #[error("cannot write out negative amount {0}")]
    Negative(Decimal),
    #[error("amount {0} exceeds the largest supported value")]
    TooLarge(Decimal),
}

/// Spell out a currency amount in reais and centavos.
///
/// Cents are rounded to two places first; a zero cents part is left out entirely.
pub fn to_words(amount: Decimal) -> Result<String, WordsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(WordsError::Negative(amount));
    }

    let rounded = round_cents(amount);
    let reais = rounded
        .trunc()
        .to_u64()
        .filter(|value| *value <= MAX_WHOLE_AMOUNT)
        .ok_or(WordsError::TooLarge(amount))?;
    let centavos = (rounded.fract() * Decimal::ONE_HUNDRED)
        .to_u64()
        .ok_or(WordsError::TooLarge(amount))?;

    if reais == 0 && centavos == 0 {
        return Ok("zero reais".to_string());
    }

    let major = (reais > 0).then(|| {
        let unit = if reais == 1 {
            "real"
        } else if reais % MILLION == 0 {
            "de reais"
        } else {
            "reais"
        };
        format!("{} {unit}", cardinal(reais, Gender::Masculine))
    });

    let minor = (centavos > 0).then(|| {
        let unit = if centavos == 1 { "centavo" } else { "centavos" };
        format!("{} {unit}", cardinal(centavos, Gender::Masculine))
    });

    Ok(match (major, minor) {
        (Some(major), Some(minor)) => format!("{major} e {minor}"),
        (Some(major), None) => major,
        (None, Some(minor)) => minor,
        (None, None) => unreachable!("zero amount handled above"),
    })
}

/// Plain cardinal numeral, e.g. `cardinal(3, Gender::Feminine) == "três"`.
pub fn cardinal(value: u64, gender: Gender) -> String {
    if value == 0 {
        return "zero".to_string();
    }

    let millions = value / MILLION;
    let thousands = (value / THOUSAND) % THOUSAND;
    let units = value % THOUSAND;

    let mut groups: Vec<(String, u64)> = Vec::with_capacity(3);
    if millions > 0 {
        let words = if millions == 1 {
            "um milhão".to_string()
        } else {
            format!("{} milhões", group(millions, Gender::Masculine))
        };
        groups.push((words, millions));
    }
    if thousands > 0 {
        let words = if thousands == 1 {
            "mil".to_string()
        } else {
            format!("{} mil", group(thousands, gender))
        };
        groups.push((words, thousands));
    }
    if units > 0 {
        groups.push((group(units, gender), units));
    }

    let last = groups.len() - 1;
    let mut out = String::new();
    for (idx, (words, group_value)) in groups.iter().enumerate() {
        if idx > 0 {
            let takes_conjunction = *group_value < 100 || group_value % 100 == 0;
            out.push_str(if idx == last && takes_conjunction {
                " e "
            } else {
                " "
            });
        }
        out.push_str(words);
    }
    out
}

/// A single group in `1..=999`.
fn group(value: u64, gender: Gender) -> String {
    debug_assert!((1..THOUSAND).contains(&value));

    if value == 100 {
        return "cem".to_string();
    }

    let hundreds = (value / 100) as usize;
    let rest = value % 100;

    if hundreds == 0 {
        return below_hundred(rest, gender);
    }

    let head = hundreds_word(hundreds, gender);
    if rest == 0 {
        head
    } else {
        format!("{head} e {}", below_hundred(rest, gender))
    }
}

fn hundreds_word(hundreds: usize, gender: Gender) -> String {
    let word = HUNDREDS[hundreds];
    match gender {
        Gender::Feminine if hundreds >= 2 => {
            format!("{}as", word.trim_end_matches("os"))
        }
        _ => word.to_string(),
    }
}

fn below_hundred(value: u64, gender: Gender) -> String {
    match value {
        0 => String::new(),
        1..=9 => unit_word(value as usize, gender).to_string(),
        10..=19 => TEENS[(value - 10) as usize].to_string(),
        _ => {
            let tens = TENS[(value / 10) as usize];
            match value % 10 {
                0 => tens.to_string(),
                unit => format!("{tens} e {}", unit_word(unit as usize, gender)),
            }
        }
    }
}

fn unit_word(unit: usize, gender: Gender) -> &'static str {
    match (unit, gender) {
        (1, Gender::Feminine) => "uma",
        (2, Gender::Feminine) => "duas",
        _ => UNITS[unit],
    }
}
