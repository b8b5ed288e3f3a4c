use thiserror::Error;

/// Broad category of an [`NnError`].
///
/// Callers that assemble many candidate models (grid search, bagging) use
/// this to decide whether to skip a configuration or abort the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected hyperparameters or unknown names, raised at construction.
    Configuration,
    /// Layers that do not fit together, raised at assembly time.
    Structural,
    /// Input whose width disagrees with what a layer or network expects.
    Shape,
    /// A layer operation invoked out of its per-batch sequence.
    InvalidState,
    /// Reading or writing JSON files.
    Io,
}

#[derive(Debug, Error)]
pub enum NnError {
    #[error("max_epochs must be greater than zero, got {0}")]
    InvalidMaxEpochs(usize),

    #[error("batch size {batch_size} is not valid for the {optimizer} optimizer")]
    InvalidBatchSize { optimizer: &'static str, batch_size: usize },

    #[error("unknown {kind} `{name}`")]
    UnknownName { kind: &'static str, name: String },

    #[error("{name} must be non-negative, got {value}")]
    NegativeRate { name: &'static str, value: f64 },

    #[error("invalid learning-rate schedule: {0}")]
    InvalidSchedule(String),

    #[error("invalid weight initializer: {0}")]
    InvalidInitializer(String),

    #[error("layer expects {found} inputs but the previous layer has {expected} units")]
    LayerMismatch { expected: usize, found: usize },

    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ParameterShape {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("invalid network topology: {0}")]
    InvalidTopology(String),

    #[error("{context}: expected {expected} columns, got {found}")]
    InputDimension {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("ragged input: row {row} has {found} values, expected {expected}")]
    RaggedRows { row: usize, expected: usize, found: usize },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("cannot {operation} while layer is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("epoch {epoch} appended after epoch {last}")]
    NonMonotonicEpoch { epoch: usize, last: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NnError::InvalidMaxEpochs(_)
            | NnError::InvalidBatchSize { .. }
            | NnError::UnknownName { .. }
            | NnError::NegativeRate { .. }
            | NnError::InvalidSchedule(_)
            | NnError::InvalidInitializer(_) => ErrorKind::Configuration,
            NnError::LayerMismatch { .. }
            | NnError::ParameterShape { .. }
            | NnError::InvalidTopology(_) => ErrorKind::Structural,
            NnError::InputDimension { .. }
            | NnError::RaggedRows { .. }
            | NnError::EmptyDataset => ErrorKind::Shape,
            NnError::InvalidState { .. } | NnError::NonMonotonicEpoch { .. } => {
                ErrorKind::InvalidState
            }
            NnError::Io(_) | NnError::Json(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn unknown(kind: &'static str, name: &str) -> NnError {
        NnError::UnknownName { kind, name: name.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, NnError>;
