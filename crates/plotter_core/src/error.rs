use thiserror::Error;

/// Broad failure class of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Domain,
    Arithmetic,
}

/// Why an expression has no real value at a given `x`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("expression is longer than {0} tokens")]
    TooLong(usize),

    #[error("{function} is undefined at {argument}")]
    Domain { function: &'static str, argument: f64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("malformed bytecode")]
    MalformedBytecode,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Empty
            | EvalError::UnexpectedChar(_)
            | EvalError::MalformedNumber(_)
            | EvalError::UnexpectedToken { .. }
            | EvalError::UnknownFunction(_)
            | EvalError::UnknownVariable(_)
            | EvalError::TooDeep(_)
            | EvalError::TooLong(_)
            | EvalError::MalformedBytecode => ErrorKind::Parse,
            EvalError::Domain { .. } => ErrorKind::Domain,
            EvalError::DivisionByZero | EvalError::NonFinite => ErrorKind::Arithmetic,
        }
    }
}

/// Failure of a whole sampling run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("invalid domain [{min}, {max}]: bounds must be finite with max >= min")]
    InvalidDomain { min: f64, max: f64 },

    #[error("invalid step {0}: must be finite and positive")]
    InvalidStep(f64),

    #[error("invalid scale {0}: must be finite and positive")]
    InvalidScale(f64),

    #[error("invalid discontinuity threshold {0}: must be positive")]
    InvalidThreshold(f64),

    #[error("domain would need {requested} samples (limit {limit})")]
    TooManySamples { requested: usize, limit: usize },

    #[error("no valid points to plot across {samples} samples")]
    NoValidPoints {
        samples: usize,
        /// First evaluation error seen, useful for telling the user why.
        cause: Option<EvalError>,
    },
}

impl SampleError {
    /// True for the "nothing plotted" outcome, as opposed to a rejected configuration.
    pub fn is_no_valid_points(&self) -> bool {
        matches!(self, SampleError::NoValidPoints { .. })
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
pub type SampleResult<T> = Result<T, SampleError>;
