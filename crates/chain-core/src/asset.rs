// chain-core/src/asset.rs

use crate::{ChainError, ChainResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fungible asset classes tracked by the ledger
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Symbol {
    /// Liquid core asset
    Agr,
    /// Price-pegged debt asset
    Agd,
    /// Non-transferable stake
    Vests,
}

impl Symbol {
    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::Agr => "AGR",
            Symbol::Agd => "AGD",
            Symbol::Vests => "VESTS",
        }
    }

    /// Decimal places of the smallest unit
    pub fn precision(&self) -> u32 {
        match self {
            Symbol::Agr | Symbol::Agd => 3,
            Symbol::Vests => 6,
        }
    }
}

/// A signed amount of one asset class.
///
/// Amounts are integer counts of the smallest unit. All consensus
/// arithmetic is checked; mixing symbols is an error, not a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn agr(amount: i64) -> Self {
        Self::new(amount, Symbol::Agr)
    }

    pub fn agd(amount: i64) -> Self {
        Self::new(amount, Symbol::Agd)
    }

    pub fn vests(amount: i64) -> Self {
        Self::new(amount, Symbol::Vests)
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self::new(0, symbol)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub fn checked_add(&self, other: Asset) -> ChainResult<Asset> {
        if self.symbol != other.symbol {
            return Err(ChainError::Consistency(format!(
                "asset symbol mismatch: {} + {}",
                self.symbol.ticker(),
                other.symbol.ticker()
            )));
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(ChainError::Overflow("asset addition"))?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn checked_sub(&self, other: Asset) -> ChainResult<Asset> {
        if self.symbol != other.symbol {
            return Err(ChainError::Consistency(format!(
                "asset symbol mismatch: {} - {}",
                self.symbol.ticker(),
                other.symbol.ticker()
            )));
        }
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(ChainError::Overflow("asset subtraction"))?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn negate(&self) -> Asset {
        Asset::new(-self.amount, self.symbol)
    }

    /// Multiply by a basis-point fraction, rounding down
    pub fn percent(&self, bps: u16) -> Asset {
        let amount = ((self.amount as i128 * bps as i128) / crate::PERCENT_100 as i128) as i64;
        Asset::new(amount, self.symbol)
    }

    /// Convert through a price quote. The asset must be denominated in one
    /// side of the price; the result is the opposite side, rounded down.
    pub fn convert(&self, price: &Price) -> ChainResult<Asset> {
        if self.symbol == price.base.symbol {
            let amount = (self.amount as i128 * price.quote.amount as i128)
                / price.base.amount as i128;
            let amount = i64::try_from(amount).map_err(|_| ChainError::Overflow("price conversion"))?;
            Ok(Asset::new(amount, price.quote.symbol))
        } else if self.symbol == price.quote.symbol {
            let amount = (self.amount as i128 * price.base.amount as i128)
                / price.quote.amount as i128;
            let amount = i64::try_from(amount).map_err(|_| ChainError::Overflow("price conversion"))?;
            Ok(Asset::new(amount, price.base.symbol))
        } else {
            Err(ChainError::Consistency(format!(
                "cannot convert {} through {}/{} price",
                self.symbol.ticker(),
                price.base.symbol.ticker(),
                price.quote.symbol.ticker()
            )))
        }
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.symbol != other.symbol {
            return None;
        }
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision();
        let unit = 10i64.pow(precision);
        let whole = self.amount / unit;
        let frac = (self.amount % unit).unsigned_abs();
        write!(
            f,
            "{}.{:0width$} {}",
            whole,
            frac,
            self.symbol.ticker(),
            width = precision as usize
        )
    }
}

/// Exchange rate between two asset classes, expressed as base per quote.
///
/// Both legs must be positive and of different symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    pub fn new(base: Asset, quote: Asset) -> ChainResult<Self> {
        if base.amount <= 0 || quote.amount <= 0 {
            return Err(ChainError::InvalidOperation(
                "price legs must be positive".into(),
            ));
        }
        if base.symbol == quote.symbol {
            return Err(ChainError::InvalidOperation(
                "price must span two asset classes".into(),
            ));
        }
        Ok(Self { base, quote })
    }

    /// Reciprocal price (quote and base swapped)
    pub fn invert(&self) -> Price {
        Price {
            base: self.quote,
            quote: self.base,
        }
    }

    /// True when `self` and `other` quote the same symbol pair in the same
    /// orientation
    pub fn same_pair(&self, other: &Price) -> bool {
        self.base.symbol == other.base.symbol && self.quote.symbol == other.quote.symbol
    }
}

impl PartialOrd for Price {
    /// Compare by cross-multiplication; only defined for the same pair
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !self.same_pair(other) {
            return None;
        }
        let lhs = self.base.amount as i128 * other.quote.amount as i128;
        let rhs = other.base.amount as i128 * self.quote.amount as i128;
        Some(lhs.cmp(&rhs))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.base, self.quote)
    }
}
