//! Reader for the whitespace-separated problem format.
//!
//! ```text
//! W N
//! count width height
//! ...
//! ```
//!
//! `N` is the number of rectangle instances. Each group line consumes
//! `count` of them, so reading stops once the groups add up to `N`.

use std::str::{FromStr, SplitWhitespace};

use tracing::debug;

use crate::error::InputError;
use crate::types::Demand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub width: u32,
    pub demands: Vec<Demand>,
}

impl Problem {
    pub fn total_items(&self) -> u64 {
        self.demands.iter().map(|d| d.qty as u64).sum()
    }
}

impl FromStr for Problem {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_problem(s)
    }
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next_int(&mut self, expected: &'static str) -> Result<i64, InputError> {
        let token = self
            .inner
            .next()
            .ok_or(InputError::UnexpectedEof { expected })?;
        token.parse::<i64>().map_err(|_| InputError::InvalidToken {
            token: token.to_string(),
            expected,
        })
    }

    fn remaining(self) -> usize {
        self.inner.count()
    }
}

fn to_u32(value: i64, expected: &'static str) -> Result<u32, InputError> {
    u32::try_from(value).map_err(|_| InputError::InvalidToken {
        token: value.to_string(),
        expected,
    })
}

pub fn parse_problem(text: &str) -> Result<Problem, InputError> {
    let mut tokens = Tokens::new(text);

    let width = tokens.next_int("roll width")?;
    if width <= 0 {
        return Err(InputError::NonPositiveWidth(width));
    }
    let width = to_u32(width, "roll width")?;

    let total = tokens.next_int("instance count")?;
    if total < 0 {
        return Err(InputError::NegativeTotal(total));
    }

    let mut demands = Vec::new();
    let mut read = 0i64;
    while read < total {
        let group = demands.len();
        let count = tokens.next_int("group count")?;
        let w = tokens.next_int("group width")?;
        let h = tokens.next_int("group height")?;
        if count < 0 {
            return Err(InputError::NegativeCount { group, count });
        }
        if w <= 0 || h <= 0 {
            return Err(InputError::NonPositiveSide {
                group,
                width: w,
                height: h,
            });
        }
        demands.push(Demand::new(
            to_u32(w, "group width")?,
            to_u32(h, "group height")?,
            to_u32(count, "group count")?,
        ));
        read += count;
    }

    let ignored = tokens.remaining();
    if ignored > 0 {
        debug!(ignored, "ignoring tokens after the last group");
    }

    Ok(Problem { width, demands })
}
