//! Symbol codes

/// A symbol is a small non-negative code; its value comes from the paytable
pub type Symbol = u8;

/// "No win" symbol, also used for padding
pub const BLANK: Symbol = 0;

/// Highest-value symbol of the standard table
pub const JACKPOT: Symbol = 10;
