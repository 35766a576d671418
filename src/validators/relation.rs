use serde::Deserialize;

use crate::form::{
    FormError, ValidationContext, ValidationStatus, Validator, ValidatorFault, ValidatorResult,
};

#[derive(Clone, Debug, Deserialize)]
pub struct CompareFieldOptions {
    pub field: String,
}

fn fault(error: FormError) -> ValidatorFault {
    ValidatorFault::Message(error.to_string())
}

/// Compares against another field's value. On success the other field's
/// binding of the same name is settled `Valid` as well, so a pair such as
/// password and confirmation clears together.
fn compare(
    ctx: &ValidationContext<'_>,
    options: &CompareFieldOptions,
    accept: impl Fn(&str, &str) -> bool,
) -> ValidatorResult {
    if ctx.value().is_empty() {
        return Ok(true.into());
    }
    let Some(other) = ctx.field_value(&options.field).map_err(fault)? else {
        return Ok(true.into());
    };
    if !accept(ctx.value(), &other) {
        return Ok(false.into());
    }
    ctx.force_status(&options.field, ctx.validator().as_str(), ValidationStatus::Valid)
        .map_err(fault)?;
    Ok(true.into())
}

pub struct Identical;

impl Validator for Identical {
    type Options = CompareFieldOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &CompareFieldOptions) -> ValidatorResult {
        compare(ctx, options, |value, other| value == other)
    }
}

pub struct Different;

impl Validator for Different {
    type Options = CompareFieldOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &CompareFieldOptions) -> ValidatorResult {
        compare(ctx, options, |value, other| value != other)
    }
}
