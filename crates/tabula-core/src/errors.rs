use thiserror::Error;

/// Result type alias using TabulaError
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Failure classes with stable `ERR_*` codes
///
/// Logged in place of message text, so dashboards and callers can branch on
/// the code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Registry
    UnknownProperty,
    DuplicateField,
    UnregisteredType,

    // Compilation
    UnsupportedExpression,

    // Materialization
    TypeMismatch,
    PrimaryKeyReassigned,
    InvalidRelationship,

    // Execution
    StorageExecution,
    TransactionAborted,
    QueueUnavailable,

    // Configuration
    Config,
}

impl ExErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnknownProperty => "ERR_UNKNOWN_PROPERTY",
            ExErrorKind::DuplicateField => "ERR_DUPLICATE_FIELD",
            ExErrorKind::UnregisteredType => "ERR_UNREGISTERED_TYPE",
            ExErrorKind::UnsupportedExpression => "ERR_UNSUPPORTED_EXPRESSION",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::PrimaryKeyReassigned => "ERR_PRIMARY_KEY_REASSIGNED",
            ExErrorKind::InvalidRelationship => "ERR_INVALID_RELATIONSHIP",
            ExErrorKind::StorageExecution => "ERR_STORAGE_EXECUTION",
            ExErrorKind::TransactionAborted => "ERR_TRANSACTION_ABORTED",
            ExErrorKind::QueueUnavailable => "ERR_QUEUE_UNAVAILABLE",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Classified failure with optional operation and type context
///
/// Built from a [`TabulaError`] at the operation boundary that logs it.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    type_name: Option<String>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            type_name: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())?;
        match (&self.op, &self.type_name) {
            (Some(op), Some(type_name)) => write!(f, " {}<{}>", op, type_name)?,
            (Some(op), None) => write!(f, " {}", op)?,
            (None, Some(type_name)) => write!(f, " <{}>", type_name)?,
            (None, None) => {}
        }
        match self.message.as_str() {
            "" => Ok(()),
            message => write!(f, " - {}", message),
        }
    }
}

impl std::error::Error for ExError {}

/// Error taxonomy for Tabula operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TabulaError {
    // ===== Registry Errors =====
    /// Property or storage field name not declared for the type
    #[error("Unknown property '{name}' on type {type_name}")]
    UnknownProperty { type_name: String, name: String },

    /// Two descriptors of one type share a property name or storage field name
    #[error("Duplicate field '{name}' declared on type {type_name}")]
    DuplicateField { type_name: String, name: String },

    /// Type has not been registered
    #[error("Type not registered: {type_name}")]
    UnregisteredType { type_name: String },

    // ===== Compilation Errors =====
    /// Predicate node the compiler cannot translate
    #[error("Unsupported expression ({node_kind}): {reason}")]
    UnsupportedExpression { node_kind: String, reason: String },

    // ===== Materialization Errors =====
    /// Stored or supplied value does not fit the declared primitive type
    #[error("Type mismatch for property '{property}': expected {expected}, found {found}")]
    ValueTypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    /// Attempt to overwrite an already assigned primary key
    #[error("Primary key already assigned ({existing}), refusing to reassign to {attempted}")]
    PrimaryKeyReassigned { existing: i64, attempted: i64 },

    /// Fetched property misused (wrong target type or cardinality)
    #[error("Invalid relationship '{property}' on type {type_name}: {reason}")]
    InvalidRelationship {
        type_name: String,
        property: String,
        reason: String,
    },

    // ===== Execution Errors =====
    /// Underlying engine rejected a statement
    #[error("Storage execution failed in {op} for {type_name}: {message}")]
    StorageExecution {
        op: String,
        type_name: String,
        message: String,
    },

    /// A save batch failed and was rolled back
    #[error("Transaction aborted, batch rolled back: {message}")]
    TransactionAborted { message: String },

    /// The execution queue worker is gone
    #[error("Execution queue unavailable: {message}")]
    QueueUnavailable { message: String },

    // ===== Configuration Errors =====
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl TabulaError {
    /// Shorthand for an [`TabulaError::UnsupportedExpression`]
    pub fn unsupported(node_kind: impl Into<String>, reason: impl Into<String>) -> Self {
        TabulaError::UnsupportedExpression {
            node_kind: node_kind.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            TabulaError::UnknownProperty { .. } => ExErrorKind::UnknownProperty,
            TabulaError::DuplicateField { .. } => ExErrorKind::DuplicateField,
            TabulaError::UnregisteredType { .. } => ExErrorKind::UnregisteredType,
            TabulaError::UnsupportedExpression { .. } => ExErrorKind::UnsupportedExpression,
            TabulaError::ValueTypeMismatch { .. } => ExErrorKind::TypeMismatch,
            TabulaError::PrimaryKeyReassigned { .. } => ExErrorKind::PrimaryKeyReassigned,
            TabulaError::InvalidRelationship { .. } => ExErrorKind::InvalidRelationship,
            TabulaError::StorageExecution { .. } => ExErrorKind::StorageExecution,
            TabulaError::TransactionAborted { .. } => ExErrorKind::TransactionAborted,
            TabulaError::QueueUnavailable { .. } => ExErrorKind::QueueUnavailable,
            TabulaError::Config { .. } => ExErrorKind::Config,
        }
    }
}

impl From<TabulaError> for ExError {
    fn from(err: TabulaError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            TabulaError::UnknownProperty { type_name, .. }
            | TabulaError::DuplicateField { type_name, .. }
            | TabulaError::UnregisteredType { type_name }
            | TabulaError::InvalidRelationship { type_name, .. } => ex.with_type_name(type_name),
            TabulaError::StorageExecution { op, type_name, .. } => {
                ex.with_op(op).with_type_name(type_name)
            }
            TabulaError::UnsupportedExpression { .. } => ex.with_op("compile"),
            TabulaError::TransactionAborted { .. } => ex.with_op("save"),
            TabulaError::ValueTypeMismatch { .. }
            | TabulaError::PrimaryKeyReassigned { .. }
            | TabulaError::QueueUnavailable { .. }
            | TabulaError::Config { .. } => ex,
        }
    }
}
