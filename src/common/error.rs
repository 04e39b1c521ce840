use thiserror::Error;

/// Result type for turinc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the turinc code generator
///
/// Every variant aborts the compilation of the current unit; no partial
/// artifact is ever produced for a unit that failed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An AST node kind with no lowering rule in this position
    #[error("Unsupported construct: {node}")]
    UnsupportedConstruct { node: String },

    /// Emission attempted outside the Building state, or double finalization
    #[error("Invalid engine state: cannot {operation} while {state}")]
    InvalidEngineState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Resolution error: {message}")]
    Resolution { message: String },

    #[error("Duplicate artifact: {name}")]
    DuplicateArtifact { name: String },

    #[error("Code generation error: {message}")]
    CodeGen { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create an unsupported construct error naming the offending node
    pub fn unsupported(node: impl Into<String>) -> Self {
        Self::UnsupportedConstruct { node: node.into() }
    }

    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidEngineState { operation, state }
    }

    /// Create a resolution error
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution { message: message.into() }
    }

    /// Create a code generation error
    pub fn codegen_error(message: impl Into<String>) -> Self {
        Self::CodeGen { message: message.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}
