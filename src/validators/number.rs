use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::form::{NoOptions, ValidationContext, Validator, ValidatorResult};

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:-?(?:0|[1-9][0-9]*))$").expect("integer pattern"));

/// Parses plain and scientific decimal notation.
pub(crate) fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn default_inclusive() -> bool {
    true
}

pub struct Integer;

impl Validator for Integer {
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(INTEGER.is_match(ctx.value()).into())
    }
}

pub struct Numeric;

impl Validator for Numeric {
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(parse_decimal(ctx.value()).is_some().into())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BetweenOptions {
    pub min: Decimal,
    pub max: Decimal,
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

pub struct Between;

impl Validator for Between {
    type Options = BetweenOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &BetweenOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        let Some(value) = parse_decimal(ctx.value()) else {
            return Ok(false.into());
        };
        let within = if options.inclusive {
            value >= options.min && value <= options.max
        } else {
            value > options.min && value < options.max
        };
        Ok(within.into())
    }
}

/// Options shared by `greaterThan` and `lessThan`.
#[derive(Clone, Debug, Deserialize)]
pub struct BoundOptions {
    pub value: Decimal,
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

pub struct GreaterThan;

impl Validator for GreaterThan {
    type Options = BoundOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &BoundOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(parse_decimal(ctx.value())
            .is_some_and(|value| {
                if options.inclusive {
                    value >= options.value
                } else {
                    value > options.value
                }
            })
            .into())
    }
}

pub struct LessThan;

impl Validator for LessThan {
    type Options = BoundOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &BoundOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(parse_decimal(ctx.value())
            .is_some_and(|value| {
                if options.inclusive {
                    value <= options.value
                } else {
                    value < options.value
                }
            })
            .into())
    }
}
