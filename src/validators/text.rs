use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::form::{NoOptions, ValidationContext, Validator, ValidatorResult};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern"));

/// Requires a non-blank value, or at least one checked member for radio and
/// checkbox groups.
pub struct NotEmpty;

impl Validator for NotEmpty {
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        if ctx.kind().is_choice() {
            return Ok((ctx.choice_count() > 0).into());
        }
        Ok((!ctx.value().trim().is_empty()).into())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StringLengthOptions {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

/// Bounds the character count of the trimmed value.
pub struct StringLength;

impl Validator for StringLength {
    type Options = StringLengthOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &StringLengthOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        let length = ctx.value().trim().chars().count();
        let too_short = options.min.is_some_and(|min| length < min);
        let too_long = options.max.is_some_and(|max| length > max);
        Ok((!too_short && !too_long).into())
    }
}

#[derive(Deserialize)]
struct RawRegexp {
    regexp: String,
}

/// Pattern compiled once when the form is built.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawRegexp")]
pub struct RegexpOptions {
    pub regexp: Regex,
}

impl TryFrom<RawRegexp> for RegexpOptions {
    type Error = regex::Error;

    fn try_from(raw: RawRegexp) -> Result<Self, Self::Error> {
        Ok(Self {
            regexp: Regex::new(&raw.regexp)?,
        })
    }
}

/// Matches the value against a pattern. The pattern is not anchored.
pub struct Regexp;

impl Validator for Regexp {
    type Options = RegexpOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &RegexpOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(options.regexp.is_match(ctx.value()).into())
    }
}

pub struct Digits;

impl Validator for Digits {
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        if ctx.value().is_empty() {
            return Ok(true.into());
        }
        Ok(DIGITS.is_match(ctx.value()).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::form::{Element, FieldConfig, ValidationStatus, ValidatorSpec};
    use crate::testing::validate_once;

    fn run(spec: ValidatorSpec, value: &str) -> ValidationStatus {
        validate_once(
            FieldConfig::new("field").validator(spec),
            vec![Element::text("field").with_value(value)],
        )
    }

    #[test]
    fn not_empty_rejects_blank_text() {
        assert_eq!(run(ValidatorSpec::new("notEmpty"), "   "), ValidationStatus::Invalid);
        assert_eq!(run(ValidatorSpec::new("notEmpty"), "x"), ValidationStatus::Valid);
    }

    #[test]
    fn not_empty_counts_checked_group_members() {
        let field = FieldConfig::new("plan").validator(ValidatorSpec::new("notEmpty"));
        let unchecked = vec![Element::radio("plan", "a"), Element::radio("plan", "b")];
        assert_eq!(validate_once(field.clone(), unchecked), ValidationStatus::Invalid);

        let checked = vec![
            Element::radio("plan", "a"),
            Element::radio("plan", "b").with_checked(true),
        ];
        assert_eq!(validate_once(field, checked), ValidationStatus::Valid);
    }

    #[test]
    fn string_length_measures_trimmed_characters() {
        let spec = || ValidatorSpec::new("stringLength").option("min", 3).option("max", 5);
        assert_eq!(run(spec(), " ab "), ValidationStatus::Invalid);
        assert_eq!(run(spec(), "héllo"), ValidationStatus::Valid);
        assert_eq!(run(spec(), "toolong"), ValidationStatus::Invalid);
        assert_eq!(run(spec(), ""), ValidationStatus::Valid);
    }

    #[test]
    fn regexp_searches_unanchored() {
        let spec = || ValidatorSpec::new("regexp").option("regexp", "[A-Z]{3}");
        assert_eq!(run(spec(), "code ABC here"), ValidationStatus::Valid);
        assert_eq!(run(spec(), "abc"), ValidationStatus::Invalid);
    }

    #[test]
    fn digits_rejects_signs_and_separators() {
        assert_eq!(run(ValidatorSpec::new("digits"), "0123"), ValidationStatus::Valid);
        assert_eq!(run(ValidatorSpec::new("digits"), "-12"), ValidationStatus::Invalid);
        assert_eq!(run(ValidatorSpec::new("digits"), "1.5"), ValidationStatus::Invalid);
    }
}
