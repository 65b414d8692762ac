use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use super::catalog::{CatalogError, CreditCatalog, FALLBACK_COMMISSION_RATE};

/// Share of the nominal amount a buyer pays for a ceded credit, in percent.
pub const SALE_VALUE_PERCENT: i64 = 70;

/// Amount of euros held as whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(from = "f64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Rounds half away from zero to the nearest cent. Saturates outside the `i64` cent range.
    pub fn from_euros(euros: f64) -> Self {
        Self((euros * 100.0).round() as i64)
    }

    /// Like [`from_euros`](Self::from_euros), but `None` when the cent value is not representable.
    pub fn checked_from_euros(euros: f64) -> Option<Self> {
        let cents = (euros * 100.0).round();
        // `i64::MAX as f64` rounds up to 2^63, so equality is already out of range.
        if cents.is_finite() && cents.abs() < i64::MAX as f64 {
            Some(Self(cents as i64))
        } else {
            None
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_euros(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self * percent / 100`, rounded half-up on the cent.
    pub fn percent(self, percent: i64) -> Money {
        let scaled = i128::from(self.0) * i128::from(percent);
        let quotient = scaled / 100;
        let remainder = scaled % 100;
        let rounded = if remainder * 2 >= 100 {
            quotient + 1
        } else if remainder * 2 <= -100 {
            quotient - 1
        } else {
            quotient
        };
        // Only percentages above 100 can leave the i64 range.
        let clamped = rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        Money(clamped as i64)
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        Money::from_euros(value)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_euros())
    }
}

/// Where the commission rate of an evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Catalog,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub credit_type: String,
    pub commission_rate: u8,
    pub rate_source: RateSource,
    pub nominal_amount: Money,
    pub sale_value: Money,
    pub commission: Money,
    pub net_amount: Money,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValuationError {
    #[error("nominal amount must be a positive number (got {0})")]
    InvalidAmount(f64),
    #[error(transparent)]
    UnknownCredit(#[from] CatalogError),
}

/// Pure estimator for the cession value of a credit.
#[derive(Debug, Clone, Default)]
pub struct ValuationCalculator {
    catalog: CreditCatalog,
}

impl ValuationCalculator {
    pub fn new(catalog: CreditCatalog) -> Self {
        Self { catalog }
    }

    /// Evaluates any credit id; ids missing from the rate table are priced at the fallback rate.
    pub fn evaluate(
        &self,
        credit_type_id: &str,
        nominal_amount: f64,
    ) -> Result<EvaluationResult, ValuationError> {
        let nominal = validate_amount(nominal_amount)?;
        let (rate, source) = match self.catalog.commission_rate(credit_type_id) {
            Some(rate) => (rate, RateSource::Catalog),
            None => {
                warn!(
                    credit_type = credit_type_id,
                    rate = FALLBACK_COMMISSION_RATE,
                    "no commission rate for credit type, using fallback"
                );
                (FALLBACK_COMMISSION_RATE, RateSource::Fallback)
            }
        };

        Ok(compute(credit_type_id, nominal, rate, source))
    }

    /// Same as [`evaluate`](Self::evaluate) but refuses credit ids the catalog does not know.
    pub fn evaluate_strict(
        &self,
        credit_type_id: &str,
        nominal_amount: f64,
    ) -> Result<EvaluationResult, ValuationError> {
        self.catalog.get(credit_type_id)?;
        self.evaluate(credit_type_id, nominal_amount)
    }
}

fn validate_amount(nominal_amount: f64) -> Result<Money, ValuationError> {
    if !nominal_amount.is_finite() || nominal_amount <= 0.0 {
        return Err(ValuationError::InvalidAmount(nominal_amount));
    }
    match Money::checked_from_euros(nominal_amount) {
        Some(nominal) if nominal.cents() > 0 => Ok(nominal),
        _ => Err(ValuationError::InvalidAmount(nominal_amount)),
    }
}

fn compute(credit_type_id: &str, nominal: Money, rate: u8, source: RateSource) -> EvaluationResult {
    let sale_value = nominal.percent(SALE_VALUE_PERCENT);
    let commission = nominal.percent(i64::from(rate));

    EvaluationResult {
        credit_type: credit_type_id.to_string(),
        commission_rate: rate,
        rate_source: source,
        nominal_amount: nominal,
        sale_value,
        commission,
        net_amount: sale_value - commission,
    }
}

/// Parses an amount typed in a form field, accepting `1.234,56`, `1234.56` and a leading `€`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_start_matches('€').trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
