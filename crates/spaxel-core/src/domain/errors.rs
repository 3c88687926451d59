use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SpaxelResult<T> = Result<T, SpaxelError>;
pub type EngineResult<T> = SpaxelResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaxelErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl SpaxelErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Error raised at an engine boundary.
///
/// `placeholder` is a stable dotted code (`INPUT.MISSING_COLUMN`,
/// `RUN.METALLICITY_WORKER`, ...) that callers and tests match on; the
/// message carries the human-readable detail (diagnostic, column, row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaxelError {
    category: SpaxelErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SpaxelError {
    pub fn new(
        category: SpaxelErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            SpaxelErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaxelErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaxelErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaxelErrorCategory::InternalError, placeholder, message)
    }

    /// A diagnostic needs a column the table does not carry.
    pub fn missing_column(requirement: impl Display, column: impl Display) -> Self {
        Self::input_validation(
            "INPUT.MISSING_COLUMN",
            format!("{requirement} requires column '{column}' which was not found in the table"),
        )
    }

    pub const fn category(&self) -> SpaxelErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for SpaxelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SpaxelError {}
