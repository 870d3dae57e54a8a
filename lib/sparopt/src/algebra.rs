//! The physical plan tree: the iterator algebra [`spareval`](../spareval/index.html) executes.

pub use spargebra::algebra::{Expression, Function, OrderExpression};
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern, Variable};

/// A root of a query, carrying the pieces that are not themselves [`Plan`] nodes: the
/// template of a `CONSTRUCT`, the resources of a `DESCRIBE`.
#[derive(Debug, Clone)]
pub enum QueryPlan {
    Select { plan: Plan, variables: Vec<Variable> },
    Ask { plan: Plan },
    Construct { plan: Plan, template: Vec<TriplePattern> },
    Describe { plan: Plan, resources: Vec<NamedNodePattern> },
}

/// A node of the physical plan, matching the plan-node catalog of the iterator executor.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Matches `pattern` against quads from `graph`, binding every variable position.
    Scan {
        pattern: TriplePattern,
        graph: PatternValue,
    },
    /// A left-deep nested-loop join: for every `left` binding, re-evaluates `right`.
    Join { left: Box<Self>, right: Box<Self> },
    Filter { expr: Expression, inner: Box<Self> },
    Projection { inner: Box<Self>, variables: Vec<Variable> },
    Limit { inner: Box<Self>, limit: usize },
    Offset { inner: Box<Self>, offset: usize },
    Distinct { inner: Box<Self> },
    /// A `GRAPH` clause: every [`Plan::Scan`] transitively beneath (not crossing into a nested
    /// `Graph` node) is already constrained to `name` by [`crate::optimizer`].
    Graph { name: PatternValue, inner: Box<Self> },
    Bind { inner: Box<Self>, expression: Expression, variable: Variable },
    /// A left-outer join: `expression`, if present, further restricts which `right` bindings
    /// are considered compatible.
    Optional {
        left: Box<Self>,
        right: Box<Self>,
        expression: Option<Expression>,
    },
    Union { left: Box<Self>, right: Box<Self> },
    Minus { left: Box<Self>, right: Box<Self> },
    OrderBy { inner: Box<Self>, expression: Vec<OrderExpression> },
    /// The unit relation: exactly one empty binding. The identity for join.
    Unit,
}

/// A graph-position or term-position value inside a [`Plan::Scan`]: either bound to a concrete
/// term at plan time, or left to be filled in from a binding at evaluation time.
#[derive(Debug, Clone)]
pub enum PatternValue {
    Constant(NamedNodePattern),
    Variable(Variable),
    /// The unnamed graph, matched explicitly rather than left as a wildcard.
    DefaultGraph,
}

impl From<NamedNodePattern> for PatternValue {
    fn from(pattern: NamedNodePattern) -> Self {
        match pattern {
            NamedNodePattern::NamedNode(n) => Self::Constant(NamedNodePattern::NamedNode(n)),
            NamedNodePattern::Variable(v) => Self::Variable(v),
        }
    }
}
