//! Template errors.

use thiserror::Error;

/// Errors raised while parsing or filling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `:` segment without a name.
    #[error("empty parameter name in path template `{template}`")]
    EmptyParamName {
        /// The offending template.
        template: String,
    },

    /// A parameter name containing characters other than `[A-Za-z0-9_]`.
    #[error("invalid parameter name `{name}` in path template `{template}`")]
    InvalidParamName {
        /// The offending name.
        name: String,
        /// The offending template.
        template: String,
    },

    /// The same parameter name appears twice.
    #[error("duplicate parameter `{name}` in path template `{template}`")]
    DuplicateParam {
        /// The repeated name.
        name: String,
        /// The offending template.
        template: String,
    },

    /// An optional segment followed by a non-optional one.
    #[error("optional parameter `{name}` must be trailing in path template `{template}`")]
    OptionalNotTrailing {
        /// The optional parameter.
        name: String,
        /// The offending template.
        template: String,
    },

    /// A required parameter had no value when filling the template.
    #[error("missing value for path parameter `{name}`")]
    MissingParam {
        /// The parameter without a value.
        name: String,
    },
}
