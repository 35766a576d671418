use serde::Deserialize;

use crate::form::{ValidationContext, Validator, ValidatorResult};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChoiceOptions {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

/// Bounds the number of checked group members or selected options.
pub struct Choice;

impl Validator for Choice {
    type Options = ChoiceOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &ChoiceOptions) -> ValidatorResult {
        let count = ctx.choice_count();
        let too_few = options.min.is_some_and(|min| count < min);
        let too_many = options.max.is_some_and(|max| count > max);
        Ok((!too_few && !too_many).into())
    }
}
