use ticketai_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the pipelines can surface maps to exactly one kind, and every
/// kind has a stable `ERR_*` code. Validation kinds are one-to-one with the
/// validator rules so callers can tell which rule rejected a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Request
    InvalidInput,
    InvalidConfig,
    NotFound,

    // Plan validation (trust boundary)
    ViewRequired,
    ViewNotAllowed,
    SemicolonNotAllowed,
    InvalidFragmentShape,
    TableReference,
    CommentNotAllowed,
    ForbiddenKeyword,
    TextualStatus,
    DanglingConnector,

    // Execution
    UnsupportedView,
    ReadOnlyViolation,

    // Model output
    Decode,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    ExternalService,
    Timeout,
    Cancelled,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ViewRequired => "ERR_VIEW_REQUIRED",
            ExErrorKind::ViewNotAllowed => "ERR_VIEW_NOT_ALLOWED",
            ExErrorKind::SemicolonNotAllowed => "ERR_SEMICOLON_NOT_ALLOWED",
            ExErrorKind::InvalidFragmentShape => "ERR_INVALID_FRAGMENT_SHAPE",
            ExErrorKind::TableReference => "ERR_TABLE_REFERENCE",
            ExErrorKind::CommentNotAllowed => "ERR_COMMENT_NOT_ALLOWED",
            ExErrorKind::ForbiddenKeyword => "ERR_FORBIDDEN_KEYWORD",
            ExErrorKind::TextualStatus => "ERR_TEXTUAL_STATUS",
            ExErrorKind::DanglingConnector => "ERR_DANGLING_CONNECTOR",
            ExErrorKind::UnsupportedView => "ERR_UNSUPPORTED_VIEW",
            ExErrorKind::ReadOnlyViolation => "ERR_READ_ONLY_VIOLATION",
            ExErrorKind::Decode => "ERR_DECODE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for the kinds raised by the plan validator
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExErrorKind::ViewRequired
                | ExErrorKind::ViewNotAllowed
                | ExErrorKind::SemicolonNotAllowed
                | ExErrorKind::InvalidFragmentShape
                | ExErrorKind::TableReference
                | ExErrorKind::CommentNotAllowed
                | ExErrorKind::ForbiddenKeyword
                | ExErrorKind::TextualStatus
                | ExErrorKind::DanglingConnector
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the plan context (view, fragment) so a
/// rejected or failed query can be shown to a human exactly as attempted.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    view: Option<String>,
    fragment: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            view: None,
            fragment: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the view the failing plan targeted
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Add the fragment the failing plan carried
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(view) = &self.view {
            write!(f, " (view: {})", view)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, " (fragment: {})", fragment)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Reasons the plan validator rejects a plan
///
/// One variant per rule; messages are shown to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("View is required.")]
    ViewRequired,

    #[error("View not allowed: {view}")]
    ViewNotAllowed { view: String },

    #[error("Semicolons are not allowed.")]
    SemicolonNotAllowed,

    #[error("Fragment must start with WHERE or ORDER BY or be empty.")]
    InvalidFragmentShape,

    #[error("Fragment must not reference tables/views ({token}).")]
    TableReference { token: String },

    #[error("Comments are not allowed.")]
    CommentNotAllowed,

    #[error("Forbidden keyword in fragment: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Status must be numeric (0..4), not text like 'Open'.")]
    TextualStatus,

    #[error("Invalid fragment: 'WHERE AND ...'.")]
    DanglingConnector,
}

impl ValidationError {
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ValidationError::ViewRequired => ExErrorKind::ViewRequired,
            ValidationError::ViewNotAllowed { .. } => ExErrorKind::ViewNotAllowed,
            ValidationError::SemicolonNotAllowed => ExErrorKind::SemicolonNotAllowed,
            ValidationError::InvalidFragmentShape => ExErrorKind::InvalidFragmentShape,
            ValidationError::TableReference { .. } => ExErrorKind::TableReference,
            ValidationError::CommentNotAllowed => ExErrorKind::CommentNotAllowed,
            ValidationError::ForbiddenKeyword { .. } => ExErrorKind::ForbiddenKeyword,
            ValidationError::TextualStatus => ExErrorKind::TextualStatus,
            ValidationError::DanglingConnector => ExErrorKind::DanglingConnector,
        }
    }
}

impl From<ValidationError> for ExError {
    fn from(err: ValidationError) -> Self {
        ExError::new(err.kind())
            .with_op("validate_plan")
            .with_message(err.to_string())
    }
}

/// Model output that could not be turned into a typed value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Extracted text is not JSON
    #[error("invalid JSON: {0}")]
    Malformed(String),

    /// Valid JSON, but not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl From<DecodeError> for ExError {
    fn from(err: DecodeError) -> Self {
        ExError::new(ExErrorKind::Decode)
            .with_op("decode_model_output")
            .with_message(err.to_string())
    }
}
