//! Error types for the build engine.

/// Errors raised while registering operators or building SQL.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The requested dialect name is not known.
    #[error("Unknown dialect '{0}'")]
    UnknownDialect(String),

    /// A syntax was registered twice under the same name.
    #[error("Syntax '{0}' is already registered")]
    DuplicateSyntax(String),

    /// An update targeted a syntax that was never registered.
    #[error("Syntax '{0}' is not registered")]
    UnknownSyntax(String),

    /// A syntax template string could not be parsed.
    #[error("Malformed syntax template: {message} in '{template}'")]
    MalformedSyntax {
        /// The offending template source.
        template: String,
        /// What went wrong.
        message: String,
    },

    /// A required slot had no matching key in the query node.
    #[error("Required expression '{0}' is missing")]
    RequiredSlotMissing(String),

    /// An operator key has no registered handler for the active dialect.
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    /// A query key is not declared by the governing grammar, or an
    /// identifier key was paired with a value shape the engine
    /// cannot interpret.
    #[error("Unknown expression '{0}'")]
    UnknownExpression(String),

    /// An operator received a value of an undeclared type.
    #[error("'{operator}' must be type of {expected}")]
    TypeMismatch {
        /// The operator that rejected the value.
        operator: String,
        /// The accepted types, comma separated.
        expected: String,
    },

    /// An operator was used outside the statement context it requires.
    #[error("'{operator}' cannot be used here: {message}")]
    InvalidContext {
        /// The misused operator.
        operator: String,
        /// Why the surrounding context rejects it.
        message: String,
    },

    /// An identifier was empty or otherwise unusable.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// A value could not be bound as a parameter (arrays and objects
    /// are query structure, not bindable values).
    #[error("Value of type {0} cannot be bound as a parameter")]
    UnsupportedValue(&'static str),

    /// A declarative operator definition failed validation.
    #[error("Invalid definition for '{operator}': {message}")]
    InvalidDefinition {
        /// The operator being defined.
        operator: String,
        /// The validation failure.
        message: String,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
