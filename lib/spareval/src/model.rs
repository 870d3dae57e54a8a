use crate::error::QueryEvaluationError;
use oxrdf::{Triple, Variable};
use std::sync::Arc;

/// One row of a `SELECT` result: a binding from (a subset of) the projected variables to terms.
#[derive(Clone, Debug)]
pub struct QuerySolution {
    variables: Arc<[Variable]>,
    values: Vec<Option<oxrdf::Term>>,
}

impl QuerySolution {
    pub(crate) fn new(variables: Arc<[Variable]>, values: Vec<Option<oxrdf::Term>>) -> Self {
        Self { variables, values }
    }

    /// The term bound to `variable`, if any (absent if the variable is not projected, or not
    /// bound in this particular solution).
    pub fn get(&self, variable: impl Into<VariableRef<'_>>) -> Option<&oxrdf::Term> {
        let index = match variable.into() {
            VariableRef::Name(name) => self.variables.iter().position(|v| v.as_str() == name)?,
            VariableRef::Index(i) => i,
        };
        self.values.get(index)?.as_ref()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn values(&self) -> &[Option<oxrdf::Term>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &oxrdf::Term)> {
        self.variables
            .iter()
            .zip(&self.values)
            .filter_map(|(v, t)| Some((v, t.as_ref()?)))
    }
}

/// A lookup key accepted by [`QuerySolution::get`]: either a variable name or a positional index.
pub enum VariableRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for VariableRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Variable> for VariableRef<'a> {
    fn from(variable: &'a Variable) -> Self {
        Self::Name(variable.as_str())
    }
}

impl From<usize> for VariableRef<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// The outcome of evaluating a query, carrying a lazily-produced iterator for the forms whose
/// solutions can be streamed.
pub enum QueryResults {
    Solutions {
        variables: Arc<[Variable]>,
        iter: Box<dyn Iterator<Item = Result<QuerySolution, QueryEvaluationError>>>,
    },
    Boolean(bool),
    Graph(Box<dyn Iterator<Item = Result<Triple, QueryEvaluationError>>>),
}
