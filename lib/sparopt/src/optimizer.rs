use crate::algebra::{Plan, PatternValue, QueryPlan};
use spargebra::algebra::GraphPattern;
use spargebra::term::{TermPattern, TriplePattern, Variable};
use spargebra::Query;

/// Rewrites a parsed query into a [`QueryPlan`].
pub fn optimize_query(query: &Query) -> QueryPlan {
    let plan = match query {
        Query::Select { pattern, .. } => QueryPlan::Select {
            variables: find_projection_variables(pattern),
            plan: optimize_pattern(pattern, &PatternValue::DefaultGraph),
        },
        Query::Ask { pattern, .. } => QueryPlan::Ask {
            plan: Plan::Limit {
                inner: Box::new(optimize_pattern(pattern, &PatternValue::DefaultGraph)),
                limit: 1,
            },
        },
        Query::Construct {
            template, pattern, ..
        } => QueryPlan::Construct {
            plan: optimize_pattern(pattern, &PatternValue::DefaultGraph),
            template: template.clone(),
        },
        Query::Describe {
            resources, pattern, ..
        } => QueryPlan::Describe {
            plan: optimize_pattern(pattern, &PatternValue::DefaultGraph),
            resources: resources.clone(),
        },
    };
    tracing::debug!("optimized query into plan: {plan:?}");
    plan
}

fn find_projection_variables(pattern: &GraphPattern) -> Vec<Variable> {
    match pattern {
        GraphPattern::Slice { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner } => find_projection_variables(inner),
        GraphPattern::Project { variables, .. } => variables.clone(),
        _ => Vec::new(),
    }
}

/// Converts a parsed graph pattern into a plan tree, under the constraint that every scan
/// reads from `graph` unless a nested `GRAPH` clause overrides it.
///
/// Exposed so that `EXISTS`/`NOT EXISTS` can be planned at evaluation time, since they carry
/// an unoptimized [`GraphPattern`] inside [`spargebra::algebra::Expression::Exists`].
pub fn optimize_pattern(pattern: &GraphPattern, graph: &PatternValue) -> Plan {
    match pattern {
        GraphPattern::Bgp { patterns } => optimize_bgp(patterns, graph),
        GraphPattern::Join { left, right } => Plan::Join {
            left: Box::new(optimize_pattern(left, graph)),
            right: Box::new(optimize_pattern(right, graph)),
        },
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => Plan::Optional {
            left: Box::new(optimize_pattern(left, graph)),
            right: Box::new(optimize_pattern(right, graph)),
            expression: expression.clone(),
        },
        GraphPattern::Filter { expr, inner } => Plan::Filter {
            expr: expr.clone(),
            inner: Box::new(optimize_pattern(inner, graph)),
        },
        GraphPattern::Union { left, right } => Plan::Union {
            left: Box::new(optimize_pattern(left, graph)),
            right: Box::new(optimize_pattern(right, graph)),
        },
        GraphPattern::Graph { name, inner } => {
            let name: PatternValue = name.clone().into();
            Plan::Graph {
                inner: Box::new(optimize_pattern(inner, &name)),
                name,
            }
        }
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => Plan::Bind {
            inner: Box::new(optimize_pattern(inner, graph)),
            expression: expression.clone(),
            variable: variable.clone(),
        },
        GraphPattern::Minus { left, right } => Plan::Minus {
            left: Box::new(optimize_pattern(left, graph)),
            right: Box::new(optimize_pattern(right, graph)),
        },
        GraphPattern::OrderBy { inner, expression } => Plan::OrderBy {
            inner: Box::new(optimize_pattern(inner, graph)),
            expression: expression.clone(),
        },
        GraphPattern::Project { inner, variables } => Plan::Projection {
            inner: Box::new(optimize_pattern(inner, graph)),
            variables: variables.clone(),
        },
        // REDUCED is implemented as a pass-through: a documented Open Question resolution.
        GraphPattern::Distinct { inner } => Plan::Distinct {
            inner: Box::new(optimize_pattern(inner, graph)),
        },
        GraphPattern::Reduced { inner } => optimize_pattern(inner, graph),
        GraphPattern::Slice {
            inner,
            start,
            length,
        } => {
            let inner = Plan::Offset {
                inner: Box::new(optimize_pattern(inner, graph)),
                offset: *start,
            };
            match length {
                Some(length) => Plan::Limit {
                    inner: Box::new(inner),
                    limit: *length,
                },
                None => inner,
            }
        }
    }
}

/// Reorders triple patterns lower-selectivity-first (stable on ties) and builds a left-deep
/// nested-loop join chain over the resulting scans.
fn optimize_bgp(patterns: &[TriplePattern], graph: &PatternValue) -> Plan {
    let mut ordered: Vec<&TriplePattern> = patterns.iter().collect();
    ordered.sort_by(|a, b| {
        estimate_selectivity(a)
            .partial_cmp(&estimate_selectivity(b))
            .unwrap()
    });
    let mut scans = ordered.into_iter().map(|pattern| Plan::Scan {
        pattern: pattern.clone(),
        graph: graph.clone(),
    });
    let Some(first) = scans.next() else {
        return Plan::Unit;
    };
    scans.fold(first, |left, right| Plan::Join {
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::SparqlParser;

    fn plan_for(query: &str) -> QueryPlan {
        let query = SparqlParser::new().parse_query(query).unwrap();
        optimize_query(&query)
    }

    #[test]
    fn select_becomes_a_select_plan_carrying_the_projected_variables() {
        let QueryPlan::Select { variables, .. } = plan_for("SELECT ?s WHERE { ?s ?p ?o }") else {
            panic!("expected a select plan");
        };
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].as_str(), "s");
    }

    #[test]
    fn ask_wraps_the_pattern_in_a_limit_one() {
        let QueryPlan::Ask { plan } = plan_for("ASK { ?s ?p ?o }") else {
            panic!("expected an ask plan");
        };
        assert!(matches!(plan, Plan::Limit { limit: 1, .. }));
    }

    #[test]
    fn a_two_triple_bgp_builds_a_single_join_of_two_scans() {
        let QueryPlan::Select { plan, .. } =
            plan_for("SELECT * WHERE { ?s <http://example.com/p1> ?o1 . ?s <http://example.com/p2> ?o2 }")
        else {
            panic!("expected a select plan");
        };
        match plan {
            Plan::Projection { inner, .. } => {
                assert!(matches!(*inner, Plan::Join { .. }));
            }
            other => panic!("expected a projection over a join, got {other:?}"),
        }
    }

    #[test]
    fn bound_positions_are_scanned_before_variable_only_patterns() {
        let bound = TriplePattern {
            subject: TermPattern::NamedNode(spargebra::term::NamedNode::new_unchecked(
                "http://example.com/s",
            )),
            predicate: spargebra::term::NamedNodePattern::Variable(Variable::new("p")),
            object: TermPattern::Variable(Variable::new("o")),
        };
        let free = TriplePattern {
            subject: TermPattern::Variable(Variable::new("s2")),
            predicate: spargebra::term::NamedNodePattern::Variable(Variable::new("p2")),
            object: TermPattern::Variable(Variable::new("o2")),
        };
        assert!(estimate_selectivity(&bound) < estimate_selectivity(&free));
    }
}

fn estimate_selectivity(pattern: &TriplePattern) -> f64 {
    let mut selectivity = 1.0;
    if !matches!(pattern.subject, TermPattern::Variable(_)) {
        selectivity *= 0.01;
    }
    if !matches!(pattern.predicate, spargebra::term::NamedNodePattern::Variable(_)) {
        selectivity *= 0.1;
    }
    if !matches!(pattern.object, TermPattern::Variable(_)) {
        selectivity *= 0.1;
    }
    selectivity
}
