//! Dip-tier investment policy
//!
//! A [`Policy`] maps a [`PriceSample`] to an [`InvestmentDecision`] by
//! looking the dip percentage up in a [`TierTable`]. The two shipped
//! variants differ only in their table and [`PolicyMode`].

use crate::core::price::PriceSample;
use std::fmt::Display;
use thiserror::Error;

pub const WEEKLY_BASE_AMOUNT: u32 = 200;
pub const WEEKLY_CAP: u32 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// One row of a tier table: a dip of at least `threshold` percent earns `amount` USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub threshold: f64,
    pub amount: u32,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ">={}% -> ${}", self.threshold, self.amount)
    }
}

/// Tiers kept in descending threshold order; the first tier whose threshold
/// the dip reaches wins.
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { tiers }
    }

    pub fn lookup(&self, dip_percentage: f64) -> Option<Tier> {
        self.tiers
            .iter()
            .find(|tier| dip_percentage >= tier.threshold)
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    WeeklyBudget,
    ThresholdBuy,
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PolicyKind::WeeklyBudget => "Weekly Budget",
                PolicyKind::ThresholdBuy => "Threshold Buy",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// `min(base + tier amount, cap)`; always notifies.
    Budget { base: u32, cap: u32 },
    /// Tier amount as-is; a zero amount suppresses the notification.
    SuppressAtZero,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    kind: PolicyKind,
    table: TierTable,
    mode: PolicyMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentDecision {
    pub kind: PolicyKind,
    pub suggested_amount: u32,
    pub dip_percentage: f64,
    pub base_amount: u32,
    pub additional_amount: u32,
    pub tier: Option<Tier>,
    pub suppress_notification: bool,
}

/// Relative drop of `current_price` below `monthly_high`, in percent.
pub fn dip_percentage(current_price: f64, monthly_high: f64) -> Result<f64, PolicyError> {
    if !monthly_high.is_finite() || monthly_high <= 0.0 {
        return Err(PolicyError::InvalidInput(format!(
            "monthly high must be a positive number, got {monthly_high}"
        )));
    }
    if !current_price.is_finite() || current_price < 0.0 {
        return Err(PolicyError::InvalidInput(format!(
            "current price must be a non-negative number, got {current_price}"
        )));
    }
    Ok((monthly_high - current_price) / monthly_high * 100.0)
}

impl Policy {
    pub fn new(kind: PolicyKind, table: TierTable, mode: PolicyMode) -> Self {
        Self { kind, table, mode }
    }

    pub fn weekly_budget() -> Self {
        Self::new(
            PolicyKind::WeeklyBudget,
            TierTable::new(vec![
                Tier { threshold: 20.0, amount: 600 },
                Tier { threshold: 10.0, amount: 400 },
                Tier { threshold: 5.0, amount: 200 },
            ]),
            PolicyMode::Budget {
                base: WEEKLY_BASE_AMOUNT,
                cap: WEEKLY_CAP,
            },
        )
    }

    pub fn threshold_buy() -> Self {
        Self::new(
            PolicyKind::ThresholdBuy,
            TierTable::new(vec![
                Tier { threshold: 30.0, amount: 1500 },
                Tier { threshold: 20.0, amount: 1000 },
                Tier { threshold: 5.0, amount: 500 },
            ]),
            PolicyMode::SuppressAtZero,
        )
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn evaluate(&self, sample: &PriceSample) -> Result<InvestmentDecision, PolicyError> {
        let dip = dip_percentage(sample.current_price, sample.monthly_high)?;
        Ok(self.decide(dip))
    }

    /// Applies the tier table and mode to an already computed dip percentage.
    pub fn decide(&self, dip_percentage: f64) -> InvestmentDecision {
        let tier = self.table.lookup(dip_percentage);
        let tier_amount = tier.map_or(0, |t| t.amount);

        match self.mode {
            PolicyMode::Budget { base, cap } => InvestmentDecision {
                kind: self.kind,
                suggested_amount: base.saturating_add(tier_amount).min(cap),
                dip_percentage,
                base_amount: base,
                additional_amount: tier_amount,
                tier,
                suppress_notification: false,
            },
            PolicyMode::SuppressAtZero => InvestmentDecision {
                kind: self.kind,
                suggested_amount: tier_amount,
                dip_percentage,
                base_amount: 0,
                additional_amount: tier_amount,
                tier,
                suppress_notification: tier_amount == 0,
            },
        }
    }
}
