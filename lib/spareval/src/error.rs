use std::error::Error;

/// An error raised while evaluating a query against a [`crate::QueryableDataset`].
#[derive(Debug, thiserror::Error)]
pub enum QueryEvaluationError {
    /// The underlying dataset failed to answer a pattern lookup.
    #[error("dataset lookup failed: {0}")]
    Dataset(#[source] Box<dyn Error + Send + Sync>),
    /// A plan node was reached that this evaluator does not (or no longer) support.
    #[error("unsupported query plan: {0}")]
    Unsupported(String),
}

impl QueryEvaluationError {
    pub fn dataset(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Dataset(Box::new(error))
    }
}

/// A local, recoverable evaluation failure (type errors, unbound variables, division by zero...).
///
/// Unlike [`QueryEvaluationError`] this never escapes the expression evaluator: FILTER drops the
/// binding, BIND passes it through unmodified, IN/NOT IN skips the offending comparison value.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("expression evaluation error")]
pub struct EvalError;
