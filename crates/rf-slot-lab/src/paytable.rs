//! Paytable and payout calculation

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult};

use crate::symbols::{BLANK, JACKPOT, Symbol};

/// Positions summed per parallel chunk
const PAYOUT_CHUNK: usize = 4096;

/// Jackpot multiplier of the standard table
const STANDARD_JACKPOT_PAYS: u64 = 100;

/// Maps a symbol code to its payout multiplier (win = multiplier × bet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct PayTable {
    multipliers: Vec<u64>,
}

impl PayTable {
    /// Create a paytable from multipliers indexed by symbol code
    ///
    /// The blank symbol must pay nothing and at least one other symbol
    /// must exist.
    pub fn new(multipliers: Vec<u64>) -> RfResult<Self> {
        if multipliers.len() < 2 {
            return Err(RfError::invalid_param(format!(
                "paytable needs at least 2 symbols, got {}",
                multipliers.len()
            )));
        }
        if multipliers.len() > Symbol::MAX as usize + 1 {
            return Err(RfError::invalid_param(format!(
                "paytable has {} symbols, symbol codes only go up to {}",
                multipliers.len(),
                Symbol::MAX
            )));
        }
        if multipliers[BLANK as usize] != 0 {
            return Err(RfError::invalid_param(format!(
                "blank symbol must pay 0, got {}",
                multipliers[BLANK as usize]
            )));
        }
        Ok(Self { multipliers })
    }

    /// Standard table: blank, 1×..9×, and a 100× jackpot
    pub fn standard() -> Self {
        let mut multipliers: Vec<u64> = (BLANK..JACKPOT).map(u64::from).collect();
        multipliers.push(STANDARD_JACKPOT_PAYS);
        Self { multipliers }
    }

    /// Multiplier for a symbol, `None` for an unmapped code
    #[inline]
    pub fn payout(&self, symbol: Symbol) -> Option<u64> {
        self.multipliers.get(symbol as usize).copied()
    }

    /// Multiplier for a symbol, failing on an unmapped code
    #[inline]
    pub fn try_payout(&self, symbol: Symbol) -> RfResult<u64> {
        self.payout(symbol).ok_or(RfError::InvalidSymbol(symbol))
    }

    /// Number of mapped symbol codes
    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    /// Always false for a validated table
    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    /// Highest mapped symbol code
    pub fn max_symbol(&self) -> Symbol {
        (self.multipliers.len() - 1) as Symbol
    }

    /// Multipliers indexed by symbol code
    pub fn multipliers(&self) -> &[u64] {
        &self.multipliers
    }

    /// Sum of payouts over every position, one credit bet each
    ///
    /// Chunks are reduced in parallel; the first unmapped symbol or a sum
    /// past `u64::MAX` aborts the whole reduction.
    pub fn total_payout(&self, symbols: &[Symbol]) -> RfResult<u64> {
        symbols
            .par_chunks(PAYOUT_CHUNK)
            .map(|chunk| {
                chunk.iter().try_fold(0u64, |acc, &s| -> RfResult<u64> {
                    add_payout(acc, self.try_payout(s)?)
                })
            })
            .try_reduce(|| 0, add_payout)
    }

    /// Theoretical RTP of a symbol sequence (0.0 when empty)
    pub fn rtp_of(&self, symbols: &[Symbol]) -> RfResult<f64> {
        if symbols.is_empty() {
            return Ok(0.0);
        }
        Ok(self.total_payout(symbols)? as f64 / symbols.len() as f64)
    }
}

#[inline]
fn add_payout(a: u64, b: u64) -> RfResult<u64> {
    a.checked_add(b)
        .ok_or_else(|| RfError::Generation("payout sum overflows u64".into()))
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<u64>> for PayTable {
    type Error = RfError;

    fn try_from(multipliers: Vec<u64>) -> RfResult<Self> {
        Self::new(multipliers)
    }
}

impl From<PayTable> for Vec<u64> {
    fn from(table: PayTable) -> Self {
        table.multipliers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_payouts() {
        let table = PayTable::standard();
        assert_eq!(table.payout(BLANK), Some(0));
        assert_eq!(table.payout(3), Some(3));
        assert_eq!(table.payout(JACKPOT), Some(100));
        assert_eq!(table.max_symbol(), JACKPOT);
    }

    #[test]
    fn test_invalid_symbol() {
        let table = PayTable::standard();
        assert_eq!(table.payout(11), None);
        assert!(matches!(table.try_payout(200), Err(RfError::InvalidSymbol(200))));
    }

    #[test]
    fn test_validation() {
        assert!(PayTable::new(vec![0]).is_err());
        assert!(PayTable::new(vec![1, 2, 3]).is_err());
        assert!(PayTable::new(vec![0, 5]).is_ok());
    }

    #[test]
    fn test_total_payout() {
        let table = PayTable::standard();
        let symbols: Vec<Symbol> = (0..10_000).map(|i| (i % 11) as Symbol).collect();
        let expected: u64 = symbols.iter().map(|&s| table.payout(s).unwrap()).sum();
        assert_eq!(table.total_payout(&symbols).unwrap(), expected);
    }

    #[test]
    fn test_total_payout_rejects_unmapped() {
        let table = PayTable::standard();
        let mut symbols = vec![1; 9000];
        symbols[8500] = 42;
        assert!(matches!(table.total_payout(&symbols), Err(RfError::InvalidSymbol(42))));
    }

    #[test]
    fn test_total_payout_overflow() {
        let table = PayTable::new(vec![0, u64::MAX / 2 + 1]).unwrap();
        assert!(matches!(table.total_payout(&[1, 1]), Err(RfError::Generation(_))));
        assert!(matches!(table.rtp_of(&[0, 1, 1]), Err(RfError::Generation(_))));
        // one huge payout still fits
        assert_eq!(table.total_payout(&[0, 1]).unwrap(), u64::MAX / 2 + 1);

        // overflow split across two parallel chunks
        let mut symbols = vec![0; PAYOUT_CHUNK * 2];
        symbols[0] = 1;
        symbols[PAYOUT_CHUNK] = 1;
        assert!(matches!(table.total_payout(&symbols), Err(RfError::Generation(_))));
    }

    #[test]
    fn test_rtp_of() {
        let table = PayTable::standard();
        assert_eq!(table.rtp_of(&[]).unwrap(), 0.0);
        assert_eq!(table.rtp_of(&[0, 0, 1, 1]).unwrap(), 0.5);
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&PayTable::standard()).unwrap();
        assert_eq!(json, "[0,1,2,3,4,5,6,7,8,9,100]");
        assert!(serde_json::from_str::<PayTable>("[3,1]").is_err());
    }
}
