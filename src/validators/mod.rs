//! Built-in validators addressable by name from form configuration.
//!
//! Every validator except `notEmpty` and `choice` accepts an empty value, so
//! optional fields only need `notEmpty` when they are required.

mod choice;
mod number;
mod relation;
mod remote;
mod text;

pub use choice::{Choice, ChoiceOptions};
pub use number::{Between, BetweenOptions, BoundOptions, GreaterThan, Integer, LessThan, Numeric};
pub use relation::{CompareFieldOptions, Different, Identical};
pub use remote::{Remote, RemoteFuture, RemoteOptions, RemoteRequest, RemoteTransport};
pub use text::{Digits, NotEmpty, Regexp, RegexpOptions, StringLength, StringLengthOptions};

use crate::form::ValidatorRegistry;

impl ValidatorRegistry {
    /// Registry with every synchronous built-in. `remote` needs a transport,
    /// see [`ValidatorRegistry::with_remote`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("notEmpty", NotEmpty)
            .register("stringLength", StringLength)
            .register("regexp", Regexp)
            .register("digits", Digits)
            .register("integer", Integer)
            .register("numeric", Numeric)
            .register("between", Between)
            .register("greaterThan", GreaterThan)
            .register("lessThan", LessThan)
            .register("identical", Identical)
            .register("different", Different)
            .register("choice", Choice);
        registry
    }

    pub fn with_remote(&mut self, transport: impl RemoteTransport) -> &mut Self {
        self.register("remote", Remote::new(transport))
    }
}
