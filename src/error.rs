//! Errors reported back to the caller inside a plan

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("No manufacturing or reaction recipe for {0}")]
    NoRecipe(String),

    #[error("Expected '<name> <quantity>' separated by whitespace")]
    MalformedLine,

    #[error("Invalid separator '{0}', use whitespace between name and quantity")]
    InvalidSeparator(char),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Runs must be greater than zero")]
    ZeroRuns,

    #[error("Material efficiency {0} out of range 0-10")]
    MaterialEfficiencyOutOfRange(u8),

    #[error("Time efficiency {0} out of range 0-20")]
    TimeEfficiencyOutOfRange(u8),
}
