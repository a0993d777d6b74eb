use thiserror::Error;

/// Problems found while reading a problem file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("invalid token '{token}', expected {expected}")]
    InvalidToken {
        token: String,
        expected: &'static str,
    },

    #[error("roll width must be positive, got {0}")]
    NonPositiveWidth(i64),

    #[error("instance count must not be negative, got {0}")]
    NegativeTotal(i64),

    #[error("group {group}: count must not be negative, got {count}")]
    NegativeCount { group: usize, count: i64 },

    #[error("group {group}: dimensions must be positive, got {width}x{height}")]
    NonPositiveSide {
        group: usize,
        width: i64,
        height: i64,
    },
}

/// Reasons a packing could not be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackError {
    #[error("roll width must be positive, got {0}")]
    InvalidWidth(u32),

    #[error("item {item} ({width}x{height}) does not fit a roll of width {roll_width} in any orientation")]
    Infeasible {
        item: usize,
        width: u32,
        height: u32,
        roll_width: u32,
    },

    #[error("stacking every piece needs {stacked} length units, more than a roll length can hold")]
    LengthOverflow { stacked: u64 },

    #[error("search budget exhausted after {nodes} nodes without a complete packing")]
    BudgetExhausted { nodes: u64 },
}
