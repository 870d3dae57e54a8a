use crate::error::QueryEvaluationError;
use crate::expression::{self, compare_for_order, term_string_form};
use crate::model::{QueryResults, QuerySolution};
use crate::QueryableDataset;
use oxrdf::{GraphName, NamedNode, NamedOrBlankNode, Term, Triple, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use sparopt::algebra::{
    NamedNodePattern, OrderExpression, PatternValue, Plan, QueryPlan, TermPattern, TriplePattern,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// The binding under construction: a partial map from in-scope variables to terms.
pub(crate) type Binding = FxHashMap<Variable, Term>;

type BindingResult = Result<Binding, QueryEvaluationError>;
type BindingIter = Box<dyn Iterator<Item = BindingResult>>;

/// Plans and runs queries against a dataset.
pub struct QueryEvaluator<D> {
    dataset: D,
}

impl<D: QueryableDataset + Clone + 'static> QueryEvaluator<D> {
    pub fn new(dataset: D) -> Self {
        Self { dataset }
    }

    pub fn execute(&self, plan: &QueryPlan) -> Result<QueryResults, QueryEvaluationError> {
        let ctx = EvalContext {
            dataset: self.dataset.clone(),
        };
        match plan {
            QueryPlan::Select { plan, variables } => {
                let variables: Arc<[Variable]> = variables.clone().into();
                let projected = variables.clone();
                let iter = ctx.eval_plan(plan, Binding::default()).map(move |r| {
                    r.map(|b| {
                        let values = projected.iter().map(|v| b.get(v).cloned()).collect();
                        QuerySolution::new(projected.clone(), values)
                    })
                });
                Ok(QueryResults::Solutions {
                    variables,
                    iter: Box::new(iter),
                })
            }
            QueryPlan::Ask { plan } => match ctx.eval_plan(plan, Binding::default()).next() {
                None => Ok(QueryResults::Boolean(false)),
                Some(Ok(_)) => Ok(QueryResults::Boolean(true)),
                Some(Err(e)) => Err(e),
            },
            QueryPlan::Construct { plan, template } => {
                let template = template.clone();
                let seen = Rc::new(RefCell::new(FxHashSet::default()));
                let iter = ctx.eval_plan(plan, Binding::default()).flat_map(move |r| {
                    let rows: Vec<Result<Triple, QueryEvaluationError>> = match r {
                        Err(e) => vec![Err(e)],
                        Ok(b) => template
                            .iter()
                            .filter_map(|tp| instantiate_triple(tp, &b))
                            .filter_map(|t| {
                                let key = format!("{} {} {}", t.subject, t.predicate, t.object);
                                seen.borrow_mut().insert(key).then_some(Ok(t))
                            })
                            .collect(),
                    };
                    rows
                });
                Ok(QueryResults::Graph(Box::new(iter)))
            }
            QueryPlan::Describe { plan, resources } => {
                let rows: Vec<Binding> = ctx
                    .eval_plan(plan, Binding::default())
                    .collect::<Result<Vec<_>, _>>()?;
                let mut subjects: Vec<NamedOrBlankNode> = Vec::new();
                for r in resources {
                    match r {
                        NamedNodePattern::NamedNode(n) => {
                            subjects.push(NamedOrBlankNode::NamedNode(n.clone()))
                        }
                        NamedNodePattern::Variable(v) => {
                            for row in &rows {
                                if let Some(t) = row.get(v) {
                                    if let Some(s) = term_to_named_or_blank(t.clone()) {
                                        subjects.push(s);
                                    }
                                }
                            }
                        }
                    }
                }
                if resources.is_empty() {
                    for row in &rows {
                        for t in row.values() {
                            if let Some(s) = term_to_named_or_blank(t.clone()) {
                                subjects.push(s);
                            }
                        }
                    }
                }
                subjects.sort_by_key(ToString::to_string);
                subjects.dedup();
                let dataset = ctx.dataset.clone();
                let iter = subjects.into_iter().flat_map(move |resource| {
                    dataset
                        .quads_for_pattern(Some(&resource), None, None, None)
                        .map(|q| {
                            q.map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
                                .map_err(QueryEvaluationError::dataset)
                        })
                        .collect::<Vec<_>>()
                });
                Ok(QueryResults::Graph(Box::new(iter)))
            }
        }
    }
}

/// Carries the dataset handle through plan evaluation; cheap to clone since implementations are
/// expected to be thin `Arc`-backed handles (mirroring how the storage layer hands out handles).
#[derive(Clone)]
pub(crate) struct EvalContext<D> {
    pub dataset: D,
}

impl<D: QueryableDataset + Clone + 'static> EvalContext<D> {
    pub(crate) fn eval_plan(&self, plan: &Plan, binding: Binding) -> BindingIter {
        match plan {
            Plan::Unit => Box::new(std::iter::once(Ok(binding))),
            Plan::Scan { pattern, graph } => self.eval_scan(pattern, graph, binding),
            Plan::Join { left, right } => {
                let right = (**right).clone();
                let ctx = self.clone();
                Box::new(self.eval_plan(left, binding).flat_map(move |r| match r {
                    Err(e) => Box::new(std::iter::once(Err(e))) as BindingIter,
                    Ok(b) => ctx.eval_plan(&right, b),
                }))
            }
            Plan::Filter { expr, inner } => {
                let expr = expr.clone();
                let ctx = self.clone();
                Box::new(self.eval_plan(inner, binding).filter_map(move |r| match r {
                    Err(e) => Some(Err(e)),
                    Ok(b) => match expression::evaluate(&expr, &b, &ctx)
                        .and_then(|t| expression::effective_boolean_value(&t))
                    {
                        Ok(true) => Some(Ok(b)),
                        _ => None,
                    },
                }))
            }
            Plan::Projection { inner, variables } => {
                let variables = variables.clone();
                Box::new(self.eval_plan(inner, binding).map(move |r| {
                    r.map(|b| {
                        variables
                            .iter()
                            .filter_map(|v| b.get(v).map(|t| (v.clone(), t.clone())))
                            .collect()
                    })
                }))
            }
            Plan::Limit { inner, limit } => Box::new(self.eval_plan(inner, binding).take(*limit)),
            Plan::Offset { inner, offset } => Box::new(self.eval_plan(inner, binding).skip(*offset)),
            Plan::Distinct { inner } => {
                let mut seen = FxHashSet::default();
                Box::new(self.eval_plan(inner, binding).filter_map(move |r| match r {
                    Err(e) => Some(Err(e)),
                    Ok(b) => seen.insert(canonical_binding_key(&b)).then_some(Ok(b)),
                }))
            }
            Plan::Graph { name: _, inner } => self.eval_plan(inner, binding),
            Plan::Bind {
                inner,
                expression,
                variable,
            } => {
                let expression = expression.clone();
                let variable = variable.clone();
                let ctx = self.clone();
                Box::new(self.eval_plan(inner, binding).map(move |r| {
                    let b = r?;
                    Ok(match expression::evaluate(&expression, &b, &ctx) {
                        Ok(value) => {
                            let mut b = b;
                            b.insert(variable.clone(), value);
                            b
                        }
                        Err(_) => b,
                    })
                }))
            }
            Plan::Optional {
                left,
                right,
                expression,
            } => {
                let right = (**right).clone();
                let expression = expression.clone();
                let ctx = self.clone();
                Box::new(self.eval_plan(left, binding).flat_map(move |r| {
                    let b = match r {
                        Err(e) => return Box::new(std::iter::once(Err(e))) as BindingIter,
                        Ok(b) => b,
                    };
                    let mut produced = false;
                    let mut rows: Vec<BindingResult> = Vec::new();
                    for extended in ctx.eval_plan(&right, b.clone()) {
                        match extended {
                            Err(e) => rows.push(Err(e)),
                            Ok(merged) => {
                                let keep = match &expression {
                                    None => true,
                                    Some(e) => matches!(
                                        expression::evaluate(e, &merged, &ctx)
                                            .and_then(|t| expression::effective_boolean_value(&t)),
                                        Ok(true)
                                    ),
                                };
                                if keep {
                                    produced = true;
                                    rows.push(Ok(merged));
                                }
                            }
                        }
                    }
                    if !produced {
                        rows.push(Ok(b));
                    }
                    Box::new(rows.into_iter())
                }))
            }
            Plan::Union { left, right } => {
                let left_iter = self.eval_plan(left, binding.clone());
                let right_iter = self.eval_plan(right, binding);
                Box::new(left_iter.chain(right_iter))
            }
            Plan::Minus { left, right } => {
                let right_solutions: Vec<Binding> = self
                    .eval_plan(right, Binding::default())
                    .filter_map(Result::ok)
                    .collect();
                Box::new(self.eval_plan(left, binding).filter_map(move |r| match r {
                    Err(e) => Some(Err(e)),
                    Ok(b) => {
                        let excluded = right_solutions
                            .iter()
                            .any(|rb| compatible_and_shares_variable(&b, rb));
                        (!excluded).then_some(Ok(b))
                    }
                }))
            }
            Plan::OrderBy { inner, expression } => {
                let ctx = self.clone();
                let expression = expression.clone();
                let mut error = None;
                let mut rows: Vec<Binding> = Vec::new();
                for r in self.eval_plan(inner, binding) {
                    match r {
                        Ok(b) => rows.push(b),
                        Err(e) => error = Some(e),
                    }
                }
                rows.sort_by(|a, b| {
                    for condition in &expression {
                        let (expr, ascending) = match condition {
                            OrderExpression::Asc(e) => (e, true),
                            OrderExpression::Desc(e) => (e, false),
                        };
                        let va = expression::evaluate(expr, a, &ctx).ok();
                        let vb = expression::evaluate(expr, b, &ctx).ok();
                        let ord = compare_for_order(va.as_ref(), vb.as_ref());
                        let ord = if ascending { ord } else { ord.reverse() };
                        if ord != std::cmp::Ordering::Equal {
                            return ord;
                        }
                    }
                    std::cmp::Ordering::Equal
                });
                let results: Vec<BindingResult> =
                    rows.into_iter().map(Ok).chain(error.map(Err)).collect();
                Box::new(results.into_iter())
            }
        }
    }

    /// Plans and evaluates the unoptimized pattern carried by `Expression::Exists`, seeded with
    /// the current binding, reporting whether it has at least one solution.
    pub(crate) fn eval_exists(
        &self,
        pattern: &spargebra::algebra::GraphPattern,
        binding: &Binding,
    ) -> bool {
        let plan = sparopt::optimize_pattern(pattern, &PatternValue::DefaultGraph);
        self.eval_plan(&plan, binding.clone())
            .next()
            .is_some_and(|r| r.is_ok())
    }

    fn eval_scan(&self, pattern: &TriplePattern, graph: &PatternValue, binding: Binding) -> BindingIter {
        let Some(subject) = constrain_subject(&pattern.subject, &binding) else {
            return Box::new(std::iter::empty());
        };
        let Some(predicate) = constrain_predicate(&pattern.predicate, &binding) else {
            return Box::new(std::iter::empty());
        };
        let Some(object) = constrain_object(&pattern.object, &binding) else {
            return Box::new(std::iter::empty());
        };
        let Some(graph_constraint) = constrain_graph(graph, &binding) else {
            return Box::new(std::iter::empty());
        };
        let quads: Vec<_> = self
            .dataset
            .quads_for_pattern(
                subject.as_ref(),
                predicate.as_ref(),
                object.as_ref(),
                graph_constraint.as_ref(),
            )
            .collect();
        let pattern = pattern.clone();
        let graph = graph.clone();
        Box::new(quads.into_iter().filter_map(move |quad| {
            let quad = match quad {
                Ok(quad) => quad,
                Err(e) => return Some(Err(QueryEvaluationError::dataset(e))),
            };
            let mut local = Binding::default();
            if !assign_term(&pattern.subject, Term::from(quad.subject), &mut local) {
                return None;
            }
            if !assign_named_node(&pattern.predicate, quad.predicate, &mut local) {
                return None;
            }
            if !assign_term(&pattern.object, quad.object, &mut local) {
                return None;
            }
            if let PatternValue::Variable(v) = &graph {
                let Some(term) = graph_name_to_term(&quad.graph_name) else {
                    return None;
                };
                if !assign_term(&TermPattern::Variable(v.clone()), term, &mut local) {
                    return None;
                }
            }
            merge_bindings(binding.clone(), &local).map(Ok)
        }))
    }
}

fn merge_bindings(mut a: Binding, b: &Binding) -> Option<Binding> {
    for (k, v) in b {
        match a.get(k) {
            Some(existing) if existing != v => return None,
            Some(_) => {}
            None => {
                a.insert(k.clone(), v.clone());
            }
        }
    }
    Some(a)
}

fn compatible_and_shares_variable(a: &Binding, b: &Binding) -> bool {
    let mut shares = false;
    for (k, v) in a {
        if let Some(v2) = b.get(k) {
            shares = true;
            if v != v2 {
                return false;
            }
        }
    }
    shares
}

fn canonical_binding_key(b: &Binding) -> String {
    let mut pairs: Vec<(&str, String)> = b
        .iter()
        .map(|(v, t)| (v.as_str(), term_string_form(t)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(v, t)| format!("{v}={t};"))
        .collect()
}

/// Assigns `value` at `pattern`'s position, enforcing repeated-variable unification against
/// whatever positions of the same triple pattern have already been assigned to `local`.
fn assign_term(pattern: &TermPattern, value: Term, local: &mut Binding) -> bool {
    match pattern {
        TermPattern::Variable(v) => match local.get(v) {
            Some(existing) => existing == &value,
            None => {
                local.insert(v.clone(), value);
                true
            }
        },
        _ => true,
    }
}

fn assign_named_node(pattern: &NamedNodePattern, value: NamedNode, local: &mut Binding) -> bool {
    match pattern {
        NamedNodePattern::Variable(v) => {
            let value = Term::NamedNode(value);
            match local.get(v) {
                Some(existing) => existing == &value,
                None => {
                    local.insert(v.clone(), value);
                    true
                }
            }
        }
        NamedNodePattern::NamedNode(_) => true,
    }
}

/// `None` (outer) means the pattern can never match (e.g. a literal in subject position);
/// `Some(None)` means unconstrained; `Some(Some(t))` constrains the dataset lookup to `t`.
fn constrain_subject(pattern: &TermPattern, binding: &Binding) -> Option<Option<NamedOrBlankNode>> {
    match pattern {
        TermPattern::NamedNode(n) => Some(Some(NamedOrBlankNode::NamedNode(n.clone()))),
        TermPattern::BlankNode(b) => Some(Some(NamedOrBlankNode::BlankNode(b.clone()))),
        TermPattern::Literal(_) => None,
        TermPattern::Variable(v) => match binding.get(v) {
            None => Some(None),
            Some(t) => term_to_named_or_blank(t.clone()).map(Some),
        },
    }
}

fn constrain_predicate(pattern: &NamedNodePattern, binding: &Binding) -> Option<Option<NamedNode>> {
    match pattern {
        NamedNodePattern::NamedNode(n) => Some(Some(n.clone())),
        NamedNodePattern::Variable(v) => match binding.get(v) {
            None => Some(None),
            Some(Term::NamedNode(n)) => Some(Some(n.clone())),
            Some(_) => None,
        },
    }
}

fn constrain_object(pattern: &TermPattern, binding: &Binding) -> Option<Option<Term>> {
    match pattern {
        TermPattern::NamedNode(n) => Some(Some(Term::NamedNode(n.clone()))),
        TermPattern::BlankNode(b) => Some(Some(Term::BlankNode(b.clone()))),
        TermPattern::Literal(l) => Some(Some(Term::Literal(l.clone()))),
        TermPattern::Variable(v) => match binding.get(v) {
            None => Some(None),
            Some(t) => Some(Some(t.clone())),
        },
    }
}

fn constrain_graph(pattern: &PatternValue, binding: &Binding) -> Option<Option<GraphName>> {
    match pattern {
        PatternValue::DefaultGraph => Some(Some(GraphName::DefaultGraph)),
        PatternValue::Constant(NamedNodePattern::NamedNode(n)) => {
            Some(Some(GraphName::NamedNode(n.clone())))
        }
        PatternValue::Constant(NamedNodePattern::Variable(v)) | PatternValue::Variable(v) => {
            match binding.get(v) {
                None => Some(None),
                Some(t) => term_to_graph_name(t).map(Some),
            }
        }
    }
}

fn term_to_named_or_blank(term: Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(n) => Some(NamedOrBlankNode::NamedNode(n)),
        Term::BlankNode(n) => Some(NamedOrBlankNode::BlankNode(n)),
        Term::Literal(_) => None,
    }
}

fn term_to_graph_name(term: &Term) -> Option<GraphName> {
    match term {
        Term::NamedNode(n) => Some(GraphName::NamedNode(n.clone())),
        Term::BlankNode(n) => Some(GraphName::BlankNode(n.clone())),
        Term::Literal(_) => None,
    }
}

/// Named graphs alone can bind a `GRAPH ?g` variable; the default graph has no RDF term to bind
/// it to, so quads from the default graph never match a variable graph position.
fn graph_name_to_term(graph_name: &GraphName) -> Option<Term> {
    match graph_name {
        GraphName::NamedNode(n) => Some(Term::NamedNode(n.clone())),
        GraphName::BlankNode(n) => Some(Term::BlankNode(n.clone())),
        GraphName::DefaultGraph => None,
    }
}

fn resolve_term_pattern_to_term(pattern: &TermPattern, binding: &Binding) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(n) => Some(Term::NamedNode(n.clone())),
        TermPattern::BlankNode(b) => Some(Term::BlankNode(b.clone())),
        TermPattern::Literal(l) => Some(Term::Literal(l.clone())),
        TermPattern::Variable(v) => binding.get(v).cloned(),
    }
}

fn resolve_named_node_pattern(pattern: &NamedNodePattern, binding: &Binding) -> Option<NamedNode> {
    match pattern {
        NamedNodePattern::NamedNode(n) => Some(n.clone()),
        NamedNodePattern::Variable(v) => match binding.get(v) {
            Some(Term::NamedNode(n)) => Some(n.clone()),
            _ => None,
        },
    }
}

fn instantiate_triple(pattern: &sparopt::algebra::TriplePattern, binding: &Binding) -> Option<Triple> {
    let subject = term_to_named_or_blank(resolve_term_pattern_to_term(&pattern.subject, binding)?)?;
    let predicate = resolve_named_node_pattern(&pattern.predicate, binding)?;
    let object = resolve_term_pattern_to_term(&pattern.object, binding)?;
    Some(Triple::new(subject, predicate, object))
}
