//! Display formatting for reward values.
//!
//! Purely presentational: the symbol is passed through untouched and no
//! locale-aware grouping is applied.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFormat {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default = "default_position")]
    pub symbol_position: SymbolPosition,
}

fn default_symbol() -> String {
    "$".into()
}
fn default_decimals() -> u8 {
    2
}
fn default_position() -> SymbolPosition {
    SymbolPosition::Prefix
}

impl Default for RewardFormat {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimals: default_decimals(),
            symbol_position: default_position(),
        }
    }
}

impl RewardFormat {
    pub fn new(symbol: impl Into<String>, decimals: u8, symbol_position: SymbolPosition) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            symbol_position,
        }
    }

    /// Render a reward value, e.g. `$100.50` or `-$1.00`.
    pub fn format(&self, value: f64) -> String {
        let sign = if value.is_sign_negative() && value != 0.0 {
            "-"
        } else {
            ""
        };
        format!("{sign}{}", self.unsigned(value.abs()))
    }

    /// Render the transient indicator shown after a cycle, e.g. `+$0.50`.
    pub fn format_step(&self, step: f64) -> String {
        let sign = if step.is_sign_negative() && step != 0.0 {
            "-"
        } else {
            "+"
        };
        format!("{sign}{}", self.unsigned(step.abs()))
    }

    fn unsigned(&self, magnitude: f64) -> String {
        let digits = format!("{:.*}", self.decimals as usize, magnitude);
        match self.symbol_position {
            SymbolPosition::Prefix => format!("{}{digits}", self.symbol),
            SymbolPosition::Suffix => format!("{digits}{}", self.symbol),
        }
    }
}
