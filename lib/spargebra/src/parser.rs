#![allow(clippy::ignored_unit_patterns)]
use crate::algebra::{Expression, Function, GraphPattern, OrderExpression};
use crate::query::Query;
use crate::term::{NamedNodePattern, TermPattern, TriplePattern, Variable};
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriParseError};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Literal, NamedNode};
use peg::parser;
use peg::str::LineCol;
use std::collections::HashMap;
use std::str::FromStr;

/// A SPARQL query parser.
///
/// ```
/// use spargebra::SparqlParser;
///
/// let query_str = "SELECT ?s ?p ?o WHERE { ?s ?p ?o . }";
/// let query = SparqlParser::new().parse_query(query_str)?;
/// assert_eq!(query.to_string(), query_str);
/// # Ok::<_, spargebra::SparqlSyntaxError>(())
/// ```
#[must_use]
#[derive(Clone, Default)]
pub struct SparqlParser {
    base_iri: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
}

impl SparqlParser {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides an IRI used to resolve relative IRIs in the query.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base_iri = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Sets a default prefix used during parsing.
    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes.insert(
            prefix_name.into(),
            Iri::parse(prefix_iri.into())?.into_inner(),
        );
        Ok(self)
    }

    /// Parses the given query string using the already set options.
    pub fn parse_query(self, query: &str) -> Result<Query, SparqlSyntaxError> {
        let mut state = ParserState::new(self.base_iri, self.prefixes);
        Ok(parser::QueryUnit(query, &mut state).map_err(SparqlSyntaxErrorKind::Syntax)?)
    }
}

/// Error returned during SPARQL parsing.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SparqlSyntaxError {
    #[from]
    kind: SparqlSyntaxErrorKind,
}

impl SparqlSyntaxError {
    pub(crate) fn from_bad_base_iri(e: IriParseError) -> Self {
        SparqlSyntaxErrorKind::InvalidBaseIri(e).into()
    }
}

#[derive(Debug, thiserror::Error)]
enum SparqlSyntaxErrorKind {
    #[error("Invalid SPARQL base IRI provided: {0}")]
    InvalidBaseIri(#[from] IriParseError),
    #[error(transparent)]
    Syntax(#[from] peg::error::ParseError<LineCol>),
}

struct ParserState {
    base_iri: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
}

impl ParserState {
    fn new(base_iri: Option<Iri<String>>, prefixes: HashMap<String, String>) -> Self {
        Self { base_iri, prefixes }
    }

    fn parse_iri(&self, iri: String) -> Result<Iri<String>, IriParseError> {
        if let Some(base_iri) = &self.base_iri {
            base_iri.resolve(&iri)
        } else {
            Iri::parse(iri)
        }
    }
}

fn unescape_iriref(mut input: &str) -> Result<String, &'static str> {
    let mut output = String::with_capacity(input.len());
    while let Some((before, after)) = input.split_once('\\') {
        output.push_str(before);
        let mut after = after.chars();
        let (escape, after) = match after.next() {
            Some('u') => read_hex_char::<4>(after.as_str())?,
            Some('U') => read_hex_char::<8>(after.as_str())?,
            Some(_) => {
                return Err(
                    "IRIs are only allowed to contain escape sequences \\uXXXX and \\UXXXXXXXX",
                );
            }
            None => return Err("IRIs are not allowed to end with a '\\'"),
        };
        output.push(escape);
        input = after;
    }
    output.push_str(input);
    Ok(output)
}

fn unescape_string(mut input: &str) -> Result<String, &'static str> {
    let mut output = String::with_capacity(input.len());
    while let Some((before, after)) = input.split_once('\\') {
        output.push_str(before);
        let mut after = after.chars();
        let (escape, after) = match after.next() {
            Some('t') => ('\u{0009}', after.as_str()),
            Some('b') => ('\u{0008}', after.as_str()),
            Some('n') => ('\u{000A}', after.as_str()),
            Some('r') => ('\u{000D}', after.as_str()),
            Some('f') => ('\u{000C}', after.as_str()),
            Some('"') => ('\u{0022}', after.as_str()),
            Some('\'') => ('\u{0027}', after.as_str()),
            Some('\\') => ('\u{005C}', after.as_str()),
            Some('u') => read_hex_char::<4>(after.as_str())?,
            Some('U') => read_hex_char::<8>(after.as_str())?,
            Some(_) => return Err("The characters that can be escaped in strings are tbnrf\"'\\"),
            None => return Err("strings are not allowed to end with a '\\'"),
        };
        output.push(escape);
        input = after;
    }
    output.push_str(input);
    Ok(output)
}

fn read_hex_char<const SIZE: usize>(input: &str) -> Result<(char, &str), &'static str> {
    if let Some(escape) = input.get(..SIZE) {
        if let Some(char) = u32::from_str_radix(escape, 16)
            .ok()
            .and_then(char::from_u32)
        {
            Ok((char, &input[SIZE..]))
        } else {
            Err("\\u escape sequence should be followed by hexadecimal digits")
        }
    } else {
        Err("\\u escape sequence should be followed by hexadecimal digits")
    }
}

/// Joins two sub-patterns, dropping empty BGPs rather than wrapping them in a no-op `Join`.
fn new_join(l: GraphPattern, r: GraphPattern) -> GraphPattern {
    if let GraphPattern::Bgp { patterns: pl } = &l {
        if pl.is_empty() {
            return r;
        }
    }
    if let GraphPattern::Bgp { patterns: pr } = &r {
        if pr.is_empty() {
            return l;
        }
    }
    match (l, r) {
        (GraphPattern::Bgp { patterns: mut pl }, GraphPattern::Bgp { patterns: pr }) => {
            pl.extend(pr);
            GraphPattern::Bgp { patterns: pl }
        }
        (l, r) => GraphPattern::Join {
            left: Box::new(l),
            right: Box::new(r),
        },
    }
}

enum PartialGraphPattern {
    Optional(GraphPattern, Option<Expression>),
    Minus(GraphPattern),
    Bind(Expression, Variable),
    Filter(Expression),
    Other(GraphPattern),
}

enum SelectionOption {
    Distinct,
    Reduced,
    Default,
}

enum SelectionMember {
    Variable(Variable),
    Expression(Expression, Variable),
}

enum SelectionVariables {
    Explicit(Vec<SelectionMember>),
    Star,
    /// Used for CONSTRUCT/DESCRIBE/ASK, which have no `SELECT` clause of their own.
    Everything,
}

struct Selection {
    option: SelectionOption,
    variables: SelectionVariables,
}

impl Selection {
    fn no_op() -> Self {
        Self {
            option: SelectionOption::Default,
            variables: SelectionVariables::Everything,
        }
    }
}

fn build_select(
    select: Selection,
    where_: GraphPattern,
    order_by: Option<Vec<OrderExpression>>,
    limit_offset: Option<(usize, Option<usize>)>,
) -> GraphPattern {
    let mut p = where_;
    if let Some(expression) = order_by {
        p = GraphPattern::OrderBy {
            inner: Box::new(p),
            expression,
        };
    }
    match select.variables {
        SelectionVariables::Explicit(members) => {
            let mut variables = Vec::with_capacity(members.len());
            for member in members {
                match member {
                    SelectionMember::Variable(v) => variables.push(v),
                    SelectionMember::Expression(expression, variable) => {
                        p = GraphPattern::Extend {
                            inner: Box::new(p),
                            variable: variable.clone(),
                            expression,
                        };
                        variables.push(variable);
                    }
                }
            }
            p = GraphPattern::Project {
                inner: Box::new(p),
                variables,
            };
        }
        SelectionVariables::Star => {
            let mut variables = Vec::new();
            p.on_in_scope_variable(|v| {
                if !variables.contains(v) {
                    variables.push(v.clone());
                }
            });
            p = GraphPattern::Project {
                inner: Box::new(p),
                variables,
            };
        }
        SelectionVariables::Everything => {}
    }
    match select.option {
        SelectionOption::Distinct => p = GraphPattern::Distinct { inner: Box::new(p) },
        SelectionOption::Reduced => p = GraphPattern::Reduced { inner: Box::new(p) },
        SelectionOption::Default => {}
    }
    if let Some((start, length)) = limit_offset {
        p = GraphPattern::Slice {
            inner: Box::new(p),
            start,
            length,
        };
    }
    p
}

parser! {
    grammar parser(state: &mut ParserState) for str {
        pub rule QueryUnit() -> Query = Query()

        rule Query() -> Query = _ Prologue() _ q:(SelectQuery() / ConstructQuery() / DescribeQuery() / AskQuery()) _ { q }

        rule Prologue() = (BaseDecl() _ / PrefixDecl() _)* {}

        rule BaseDecl() = i("BASE") _ i:IRIREF() {
            state.base_iri = Some(i);
        }

        rule PrefixDecl() = i("PREFIX") _ ns:PNAME_NS() _ i:IRIREF() {
            state.prefixes.insert(ns.into(), i.into_inner());
        }

        rule SelectQuery() -> Query = s:SelectClause() _ w:WhereClause() _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
            Query::Select {
                pattern: build_select(s, w, o, l),
                base_iri: state.base_iri.clone(),
            }
        }

        rule SelectClause() -> Selection = i("SELECT") _ o:SelectClause_option() _ v:SelectClause_variables() {
            Selection { option: o, variables: v }
        }
        rule SelectClause_option() -> SelectionOption =
            i("DISTINCT") { SelectionOption::Distinct } /
            i("REDUCED") { SelectionOption::Reduced } /
            { SelectionOption::Default }
        rule SelectClause_variables() -> SelectionVariables =
            "*" { SelectionVariables::Star } /
            p:SelectClause_member()+ { SelectionVariables::Explicit(p) }
        rule SelectClause_member() -> SelectionMember =
            v:Var() _ { SelectionMember::Variable(v) } /
            "(" _ e:Expression() _ i("AS") _ v:Var() _ ")" _ { SelectionMember::Expression(e, v) }

        rule ConstructQuery() -> Query =
            i("CONSTRUCT") _ c:ConstructTemplate() _ w:WhereClause() _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
                Query::Construct {
                    template: c,
                    pattern: build_select(Selection::no_op(), w, o, l),
                    base_iri: state.base_iri.clone(),
                }
            } /
            i("CONSTRUCT") _ i("WHERE") _ "{" _ c:ConstructTriples()? _ "}" _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
                let c = c.unwrap_or_default();
                Query::Construct {
                    template: c.clone(),
                    pattern: build_select(Selection::no_op(), GraphPattern::Bgp { patterns: c }, o, l),
                    base_iri: state.base_iri.clone(),
                }
            }

        rule DescribeQuery() -> Query =
            i("DESCRIBE") _ "*" _ w:WhereClause()? _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
                Query::Describe {
                    resources: Vec::new(),
                    pattern: build_select(Selection::no_op(), w.unwrap_or_default(), o, l),
                    base_iri: state.base_iri.clone(),
                }
            } /
            i("DESCRIBE") _ p:DescribeQuery_item()+ _ w:WhereClause()? _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
                Query::Describe {
                    resources: p,
                    pattern: build_select(Selection::no_op(), w.unwrap_or_default(), o, l),
                    base_iri: state.base_iri.clone(),
                }
            }
        rule DescribeQuery_item() -> NamedNodePattern = i:VarOrIri() _ { i }

        rule AskQuery() -> Query = i("ASK") _ w:WhereClause() _ SolutionModifierIgnored() _ o:OrderClause()? _ l:LimitOffsetClauses()? {
            Query::Ask {
                pattern: build_select(Selection::no_op(), w, o, l),
                base_iri: state.base_iri.clone(),
            }
        }

        /// `GROUP BY` and `HAVING` are accepted syntactically and have no effect on the
        /// resulting algebra.
        rule SolutionModifierIgnored() = GroupClause()? _ HavingClause()? {}

        rule GroupClause() = i("GROUP") _ i("BY") _ GroupCondition() ++ (_) {}
        rule GroupCondition() = "(" _ Expression() _ (i("AS") _ Var() _)? ")" {} / BuiltInCall() {} / Var() {}

        rule HavingClause() = i("HAVING") _ Expression() ++ (_) {}

        rule WhereClause() -> GraphPattern = i("WHERE")? _ p:GroupGraphPattern() { p }

        rule OrderClause() -> Vec<OrderExpression> = i("ORDER") _ i("BY") _ c:OrderCondition() ++ (_) { c }
        rule OrderCondition() -> OrderExpression =
            i("ASC") _ e:BrackettedExpression() { OrderExpression::Asc(e) } /
            i("DESC") _ e:BrackettedExpression() { OrderExpression::Desc(e) } /
            e:(BrackettedExpression() / BuiltInCall() / Var_as_expr()) { OrderExpression::Asc(e) }
        rule Var_as_expr() -> Expression = v:Var() { v.into() }

        rule LimitOffsetClauses() -> (usize, Option<usize>) =
            l:LimitClause() _ o:OffsetClause()? { (o.unwrap_or(0), Some(l)) } /
            o:OffsetClause() _ l:LimitClause()? { (o, l) }
        rule LimitClause() -> usize = i("LIMIT") _ l:$(INTEGER()) {?
            usize::from_str(l).map_err(|_| "The limit value should be a non negative integer")
        }
        rule OffsetClause() -> usize = i("OFFSET") _ o:$(INTEGER()) {?
            usize::from_str(o).map_err(|_| "The offset value should be a non negative integer")
        }

        rule GroupGraphPattern() -> GraphPattern = "{" _ p:GroupGraphPatternSub() _ "}" { p }

        rule GroupGraphPatternSub() -> GraphPattern = a:TriplesBlock()? _ b:GroupGraphPatternSub_item()* {
            let mut filter: Option<Expression> = None;
            let mut g = a.map_or_else(GraphPattern::default, |patterns| GraphPattern::Bgp { patterns });
            for e in b.into_iter().flatten() {
                match e {
                    PartialGraphPattern::Optional(p, f) => {
                        g = GraphPattern::LeftJoin { left: Box::new(g), right: Box::new(p), expression: f };
                    }
                    PartialGraphPattern::Minus(p) => {
                        g = GraphPattern::Minus { left: Box::new(g), right: Box::new(p) };
                    }
                    PartialGraphPattern::Bind(expression, variable) => {
                        g = GraphPattern::Extend { inner: Box::new(g), variable, expression };
                    }
                    PartialGraphPattern::Filter(expr) => {
                        filter = Some(if let Some(f) = filter {
                            Expression::And(Box::new(f), Box::new(expr))
                        } else {
                            expr
                        });
                    }
                    PartialGraphPattern::Other(e) => g = new_join(g, e),
                }
            }
            if let Some(expr) = filter {
                GraphPattern::Filter { expr, inner: Box::new(g) }
            } else {
                g
            }
        }
        rule GroupGraphPatternSub_item() -> Vec<PartialGraphPattern> = a:GraphPatternNotTriples() _ ("." _)? b:TriplesBlock()? _ {
            let mut result = vec![a];
            if let Some(v) = b {
                result.push(PartialGraphPattern::Other(GraphPattern::Bgp { patterns: v }));
            }
            result
        }

        rule TriplesBlock() -> Vec<TriplePattern> = h:(TriplesSameSubject() ++ ("." _)) ("." _)? {
            h.into_iter().flatten().collect()
        }

        rule GraphPatternNotTriples() -> PartialGraphPattern =
            GroupOrUnionGraphPattern() /
            OptionalGraphPattern() /
            MinusGraphPattern() /
            GraphGraphPattern() /
            Filter() /
            Bind()

        rule OptionalGraphPattern() -> PartialGraphPattern = i("OPTIONAL") _ p:GroupGraphPattern() {
            match p {
                GraphPattern::Filter { expr, inner } => PartialGraphPattern::Optional(*inner, Some(expr)),
                p => PartialGraphPattern::Optional(p, None),
            }
        }

        rule MinusGraphPattern() -> PartialGraphPattern = i("MINUS") _ p: GroupGraphPattern() {
            PartialGraphPattern::Minus(p)
        }

        rule GraphGraphPattern() -> PartialGraphPattern = i("GRAPH") _ name:VarOrIri() _ p:GroupGraphPattern() {
            PartialGraphPattern::Other(GraphPattern::Graph { name, inner: Box::new(p) })
        }

        rule Bind() -> PartialGraphPattern = i("BIND") _ "(" _ e:Expression() _ i("AS") _ v:Var() _ ")" {
            PartialGraphPattern::Bind(e, v)
        }

        rule Filter() -> PartialGraphPattern = i("FILTER") _ c:Constraint() {
            PartialGraphPattern::Filter(c)
        }

        rule Constraint() -> Expression = BrackettedExpression() / FunctionCall() / BuiltInCall()

        rule FunctionCall() -> Expression = f:iri() _ a:ArgList() {
            Expression::FunctionCall(Function::Custom(f), a)
        }

        rule ArgList() -> Vec<Expression> =
            NIL() { Vec::new() } /
            "(" _ a:(Expression() ** ("," _)) _ ")" { a }

        rule ExpressionList() -> Vec<Expression> =
            NIL() { Vec::new() } /
            "(" _ e:(Expression() ** ("," _)) _ ")" { e }

        rule ConstructTemplate() -> Vec<TriplePattern> = "{" _ t:ConstructTriples()? _ "}" { t.unwrap_or_default() }

        rule ConstructTriples() -> Vec<TriplePattern> = t:(TriplesSameSubject() ++ ("." _)) ("." _)? {
            t.into_iter().flatten().collect()
        }

        rule TriplesSameSubject() -> Vec<TriplePattern> = _ s:VarOrTerm() _ po:PropertyListNotEmpty() _ {
            let mut patterns = Vec::new();
            for (p, objects) in po {
                for o in objects {
                    patterns.push(TriplePattern::new(s.clone(), p.clone(), o));
                }
            }
            patterns
        }

        rule PropertyListNotEmpty() -> Vec<(NamedNodePattern, Vec<TermPattern>)> =
            hp:Verb() _ ho:ObjectList() _ t:PropertyListNotEmpty_item()* {
                let mut result = vec![(hp, ho)];
                result.extend(t.into_iter().flatten());
                result
            }
        rule PropertyListNotEmpty_item() -> Option<(NamedNodePattern, Vec<TermPattern>)> = ";" _ c:(Verb_ObjectList())? {
            c
        }
        rule Verb_ObjectList() -> (NamedNodePattern, Vec<TermPattern>) = p:Verb() _ o:ObjectList() _ { (p, o) }

        rule Verb() -> NamedNodePattern = VarOrIri() / "a" { rdf::TYPE.into_owned().into() }

        rule ObjectList() -> Vec<TermPattern> = o:(Object() ++ ("," _)) { o }
        rule Object() -> TermPattern = t:VarOrTerm() _ { t }

        rule VarOrTerm() -> TermPattern =
            v:Var() { v.into() } /
            i:iri() { i.into() } /
            l:RDFLiteral() { l.into() } /
            l:NumericLiteral() { l.into() } /
            l:BooleanLiteral() { l.into() } /
            b:BlankNode() { b.into() }

        rule VarOrIri() -> NamedNodePattern =
            v:Var() { v.into() } /
            i:iri() { i.into() }

        rule Var() -> Variable = name:(VAR1() / VAR2()) { Variable::new(name) }

        rule Expression() -> Expression = e:ConditionalOrExpression() { e }

        rule ConditionalOrExpression() -> Expression = e:(ConditionalAndExpression() ++ ("||" _)) {
            e.into_iter().reduce(|a, b| Expression::Or(Box::new(a), Box::new(b))).unwrap()
        }

        rule ConditionalAndExpression() -> Expression = e:(ValueLogical() ++ ("&&" _)) {
            e.into_iter().reduce(|a, b| Expression::And(Box::new(a), Box::new(b))).unwrap()
        }

        rule ValueLogical() -> Expression = RelationalExpression()

        rule RelationalExpression() -> Expression = a:NumericExpression() _ o:RelationalExpression_inner()? {
            match o {
                Some(("=", Some(b), None)) => Expression::Equal(Box::new(a), Box::new(b)),
                Some(("!=", Some(b), None)) => Expression::Not(Box::new(Expression::Equal(Box::new(a), Box::new(b)))),
                Some((">", Some(b), None)) => Expression::Greater(Box::new(a), Box::new(b)),
                Some((">=", Some(b), None)) => Expression::GreaterOrEqual(Box::new(a), Box::new(b)),
                Some(("<", Some(b), None)) => Expression::Less(Box::new(a), Box::new(b)),
                Some(("<=", Some(b), None)) => Expression::LessOrEqual(Box::new(a), Box::new(b)),
                Some(("IN", None, Some(l))) => Expression::In(Box::new(a), l),
                Some(("NOT IN", None, Some(l))) => Expression::Not(Box::new(Expression::In(Box::new(a), l))),
                Some(_) => unreachable!(),
                None => a,
            }
        }
        rule RelationalExpression_inner() -> (&'input str, Option<Expression>, Option<Vec<Expression>>) =
            s:$("=" / "!=" / ">=" / ">" / "<=" / "<") _ e:NumericExpression() { (s, Some(e), None) } /
            i("IN") _ l:ExpressionList() { ("IN", None, Some(l)) } /
            i("NOT") _ i("IN") _ l:ExpressionList() { ("NOT IN", None, Some(l)) }

        rule NumericExpression() -> Expression = AdditiveExpression()

        rule AdditiveExpression() -> Expression = a:MultiplicativeExpression() _ o:AdditiveExpression_inner()* {
            o.into_iter().fold(a, |a, (op, b)| match op {
                "+" => Expression::Add(Box::new(a), Box::new(b)),
                _ => Expression::Subtract(Box::new(a), Box::new(b)),
            })
        }
        rule AdditiveExpression_inner() -> (&'input str, Expression) = s:$("+" / "-") _ e:MultiplicativeExpression() _ { (s, e) }

        rule MultiplicativeExpression() -> Expression = a:UnaryExpression() _ o:MultiplicativeExpression_inner()* {
            o.into_iter().fold(a, |a, (op, b)| match op {
                "*" => Expression::Multiply(Box::new(a), Box::new(b)),
                _ => Expression::Divide(Box::new(a), Box::new(b)),
            })
        }
        rule MultiplicativeExpression_inner() -> (&'input str, Expression) = s:$("*" / "/") _ e:UnaryExpression() _ { (s, e) }

        rule UnaryExpression() -> Expression = s:$("!" / "+" / "-")? _ e:PrimaryExpression() {
            match s {
                Some("!") => Expression::Not(Box::new(e)),
                Some("+") => Expression::UnaryPlus(Box::new(e)),
                Some("-") => Expression::UnaryMinus(Box::new(e)),
                Some(_) => unreachable!(),
                None => e,
            }
        }

        rule PrimaryExpression() -> Expression =
            BrackettedExpression() /
            iriOrFunction() /
            v:Var() { v.into() } /
            l:RDFLiteral() { l.into() } /
            l:NumericLiteral() { l.into() } /
            l:BooleanLiteral() { l.into() } /
            BuiltInCall()

        rule BrackettedExpression() -> Expression = "(" _ e:Expression() _ ")" { e }

        rule BuiltInCall() -> Expression =
            i("STR") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Str, vec![e]) } /
            i("LANGMATCHES") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::LangMatches, vec![a, b]) } /
            i("LANG") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Lang, vec![e]) } /
            i("DATATYPE") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Datatype, vec![e]) } /
            i("BOUND") _ "(" _ v:Var() _ ")" { Expression::Bound(v) } /
            i("ABS") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Abs, vec![e]) } /
            i("CEIL") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Ceil, vec![e]) } /
            i("FLOOR") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Floor, vec![e]) } /
            i("ROUND") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::Round, vec![e]) } /
            i("CONCAT") _ e:ExpressionList() { Expression::FunctionCall(Function::Concat, e) } /
            SubstringExpression() /
            i("STRLEN") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::StrLen, vec![e]) } /
            i("UCASE") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::UCase, vec![e]) } /
            i("LCASE") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::LCase, vec![e]) } /
            i("CONTAINS") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::Contains, vec![a, b]) } /
            i("STRSTARTS") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::StrStarts, vec![a, b]) } /
            i("STRENDS") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::StrEnds, vec![a, b]) } /
            i("sameTerm") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::SameTerm(Box::new(a), Box::new(b)) } /
            (i("isIRI") / i("isURI")) _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::IsIri, vec![e]) } /
            i("isBLANK") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::IsBlank, vec![e]) } /
            i("isLITERAL") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::IsLiteral, vec![e]) } /
            i("isNUMERIC") _ "(" _ e:Expression() _ ")" { Expression::FunctionCall(Function::IsNumeric, vec![e]) } /
            RegexExpression() /
            NotExistsFunc() /
            ExistsFunc()

        rule RegexExpression() -> Expression =
            i("REGEX") _ "(" _ a:Expression() _ "," _ b:Expression() _ "," _ c:Expression() _ ")" { Expression::FunctionCall(Function::Regex, vec![a, b, c]) } /
            i("REGEX") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::Regex, vec![a, b]) }

        rule SubstringExpression() -> Expression =
            i("SUBSTR") _ "(" _ a:Expression() _ "," _ b:Expression() _ "," _ c:Expression() _ ")" { Expression::FunctionCall(Function::SubStr, vec![a, b, c]) } /
            i("SUBSTR") _ "(" _ a:Expression() _ "," _ b:Expression() _ ")" { Expression::FunctionCall(Function::SubStr, vec![a, b]) }

        rule ExistsFunc() -> Expression = i("EXISTS") _ p:GroupGraphPattern() { Expression::Exists(Box::new(p)) }

        rule NotExistsFunc() -> Expression = i("NOT") _ i("EXISTS") _ p:GroupGraphPattern() { Expression::Not(Box::new(Expression::Exists(Box::new(p)))) }

        rule iriOrFunction() -> Expression = i:iri() _ a:ArgList_opt() {
            match a {
                Some(a) => Expression::FunctionCall(Function::Custom(i), a),
                None => i.into(),
            }
        }
        rule ArgList_opt() -> Option<Vec<Expression>> = a:ArgList()? { a }

        rule RDFLiteral() -> Literal =
            value:String() _ "^^" _ datatype:iri() { Literal::new_typed_literal(value, datatype) } /
            value:String() _ language:LANGTAG() { Literal::new_language_tagged_literal_unchecked(value, language.into_inner()) } /
            value:String() { Literal::new_simple_literal(value) }

        rule NumericLiteral() -> Literal = NumericLiteralUnsigned() / NumericLiteralPositive() / NumericLiteralNegative()

        rule NumericLiteralUnsigned() -> Literal =
            d:$(DOUBLE()) { Literal::new_typed_literal(d, xsd::DOUBLE.into_owned()) } /
            d:$(DECIMAL()) { Literal::new_typed_literal(d, xsd::DECIMAL.into_owned()) } /
            i:$(INTEGER()) { Literal::new_typed_literal(i, xsd::INTEGER.into_owned()) }

        rule NumericLiteralPositive() -> Literal =
            d:$(DOUBLE_POSITIVE()) { Literal::new_typed_literal(d, xsd::DOUBLE.into_owned()) } /
            d:$(DECIMAL_POSITIVE()) { Literal::new_typed_literal(d, xsd::DECIMAL.into_owned()) } /
            i:$(INTEGER_POSITIVE()) { Literal::new_typed_literal(i, xsd::INTEGER.into_owned()) }

        rule NumericLiteralNegative() -> Literal =
            d:$(DOUBLE_NEGATIVE()) { Literal::new_typed_literal(d, xsd::DOUBLE.into_owned()) } /
            d:$(DECIMAL_NEGATIVE()) { Literal::new_typed_literal(d, xsd::DECIMAL.into_owned()) } /
            i:$(INTEGER_NEGATIVE()) { Literal::new_typed_literal(i, xsd::INTEGER.into_owned()) }

        rule BooleanLiteral() -> Literal =
            "true" { Literal::new_typed_literal("true", xsd::BOOLEAN.into_owned()) } /
            "false" { Literal::new_typed_literal("false", xsd::BOOLEAN.into_owned()) }

        rule String() -> String = STRING_LITERAL_LONG1() / STRING_LITERAL_LONG2() / STRING_LITERAL1() / STRING_LITERAL2()

        rule iri() -> NamedNode = i:(IRIREF() / PrefixedName()) { NamedNode::new_unchecked(i.into_inner()) }

        rule PrefixedName() -> Iri<String> = PNAME_LN() /
            ns:PNAME_NS() {? if let Some(iri) = state.prefixes.get(ns).cloned() {
                Iri::parse(iri).map_err(|_| "prefix IRI parsing failed")
            } else {
                Err("Prefix not found")
            } }

        rule BlankNode() -> BlankNode = id:BLANK_NODE_LABEL() { BlankNode::new(id) } / ANON() { BlankNode::default() }

        rule IRIREF() -> Iri<String> = "<" i:$((!['>'] [_])*) ">" {?
            state.parse_iri(unescape_iriref(i)?).map_err(|_| "IRI parsing failed")
        }

        rule PNAME_NS() -> &'input str = ns:$(PN_PREFIX()?) ":" { ns }

        rule PNAME_LN() -> Iri<String> = ns:PNAME_NS() local:$(PN_LOCAL()) {?
            if let Some(base) = state.prefixes.get(ns) {
                let mut iri = String::with_capacity(base.len() + local.len());
                iri.push_str(base);
                for chunk in local.split('\\') {
                    iri.push_str(chunk);
                }
                Iri::parse(iri).map_err(|_| "IRI parsing failed")
            } else {
                Err("Prefix not found")
            }
        }

        rule BLANK_NODE_LABEL() -> &'input str = "_:" b:$((['0'..='9'] / PN_CHARS_U()) PN_CHARS()* ("."+ PN_CHARS()+)*) { b }

        rule VAR1() -> &'input str = "?" v:$(VARNAME()) { v }
        rule VAR2() -> &'input str = "$" v:$(VARNAME()) { v }

        rule LANGTAG() -> LanguageTag<String> = "@" l:$(['a'..='z' | 'A'..='Z']+ ("-" ['a'..='z' | 'A'..='Z' | '0'..='9']+)*) {?
            LanguageTag::parse(l.to_ascii_lowercase()).map_err(|_| "language tag parsing failed")
        }

        rule INTEGER() = ['0'..='9']+
        rule DECIMAL() = ['0'..='9']* "." ['0'..='9']+
        rule DOUBLE() = (['0'..='9']+ "." ['0'..='9']* / "." ['0'..='9']+ / ['0'..='9']+) EXPONENT()
        rule INTEGER_POSITIVE() = "+" _ INTEGER()
        rule DECIMAL_POSITIVE() = "+" _ DECIMAL()
        rule DOUBLE_POSITIVE() = "+" _ DOUBLE()
        rule INTEGER_NEGATIVE() = "-" _ INTEGER()
        rule DECIMAL_NEGATIVE() = "-" _ DECIMAL()
        rule DOUBLE_NEGATIVE() = "-" _ DOUBLE()
        rule EXPONENT() = ['e' | 'E'] ['+' | '-']? ['0'..='9']+

        rule STRING_LITERAL1() -> String = "'" l:$((STRING_LITERAL1_simple_char() / ECHAR() / UCHAR())*) "'" {?
            unescape_string(l)
        }
        rule STRING_LITERAL1_simple_char() = !['\u{27}' | '\u{5C}' | '\u{0A}' | '\u{0D}'] [_]

        rule STRING_LITERAL2() -> String = "\"" l:$((STRING_LITERAL2_simple_char() / ECHAR() / UCHAR())*) "\"" {?
            unescape_string(l)
        }
        rule STRING_LITERAL2_simple_char() = !['\u{22}' | '\u{5C}' | '\u{0A}' | '\u{0D}'] [_]

        rule STRING_LITERAL_LONG1() -> String = "'''" l:$(STRING_LITERAL_LONG1_inner()*) "'''" {?
            unescape_string(l)
        }
        rule STRING_LITERAL_LONG1_inner() = ("''" / "'")? (STRING_LITERAL_LONG1_simple_char() / ECHAR() / UCHAR())
        rule STRING_LITERAL_LONG1_simple_char() = !['\'' | '\\'] [_]

        rule STRING_LITERAL_LONG2() -> String = "\"\"\"" l:$(STRING_LITERAL_LONG2_inner()*) "\"\"\"" {?
            unescape_string(l)
        }
        rule STRING_LITERAL_LONG2_inner() = ("\"\"" / "\"")? (STRING_LITERAL_LONG2_simple_char() / ECHAR() / UCHAR())
        rule STRING_LITERAL_LONG2_simple_char() = !['"' | '\\'] [_]

        rule UCHAR() = "\\u" HEX() HEX() HEX() HEX() / "\\U" HEX() HEX() HEX() HEX() HEX() HEX() HEX() HEX()
        rule ECHAR() = "\\" ['t' | 'b' | 'n' | 'r' | 'f' | '"' | '\'' | '\\']

        rule NIL() = "(" WS()* ")"

        rule WS() = quiet! { ['\u{20}' | '\u{09}' | '\u{0D}' | '\u{0A}'] }

        rule ANON() = "[" WS()* "]"

        rule PN_CHARS_BASE() = ['A'..='Z' | 'a'..='z' | '\u{00C0}'..='\u{00D6}' | '\u{00D8}'..='\u{00F6}' | '\u{00F8}'..='\u{02FF}' | '\u{0370}'..='\u{037D}' | '\u{037F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}']
        rule PN_CHARS_U() = ['_'] / PN_CHARS_BASE()
        rule VARNAME() = (['0'..='9'] / PN_CHARS_U()) (['0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}'] / PN_CHARS_U())*
        rule PN_CHARS() = ['-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}'] / PN_CHARS_U()
        rule PN_PREFIX() = PN_CHARS_BASE() PN_CHARS()* ("."+ PN_CHARS()+)*
        rule PN_LOCAL() = (PN_CHARS_U() / [':' | '0'..='9'] / PLX()) (PN_CHARS() / [':'] / PLX())* (['.']+ (PN_CHARS() / [':'] / PLX())+)?
        rule PLX() = PERCENT() / PN_LOCAL_ESC()
        rule PERCENT() = ['%'] HEX() HEX()
        rule HEX() = ['0'..='9' | 'A'..='F' | 'a'..='f']
        rule PN_LOCAL_ESC() = ['\\'] ['_' | '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | '/' | '?' | '#' | '@' | '%']

        rule _() = quiet! { ([' ' | '\t' | '\n' | '\r'] / comment())* }
        rule comment() = quiet! { ['#'] (!['\r' | '\n'] [_])* }

        rule i(literal: &'static str) = input: $([_]*<{literal.len()}>) {?
            if input.eq_ignore_ascii_case(literal) {
                Ok(())
            } else {
                Err(literal)
            }
        }

        rule GroupOrUnionGraphPattern() -> PartialGraphPattern = p:(GroupGraphPattern() ++ (i("UNION") _)) {
            PartialGraphPattern::Other(p.into_iter().reduce(|left, right| GraphPattern::Union { left: Box::new(left), right: Box::new(right) }).unwrap())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_star_parses_a_single_bgp_triple() {
        let query = SparqlParser::new()
            .parse_query("SELECT * WHERE { ?s ?p ?o }")
            .unwrap();
        match query {
            Query::Select { pattern, .. } => {
                let GraphPattern::Project { inner, .. } = pattern else {
                    panic!("expected a projection");
                };
                assert!(matches!(*inner, GraphPattern::Bgp { .. }));
            }
            _ => panic!("expected a SELECT query"),
        }
    }

    #[test]
    fn ask_parses_into_an_ask_query() {
        let query = SparqlParser::new()
            .parse_query("ASK { <http://example.com/s> <http://example.com/p> <http://example.com/o> }")
            .unwrap();
        assert!(matches!(query, Query::Ask { .. }));
    }

    #[test]
    fn a_prefix_is_expanded_in_the_parsed_triple() {
        let query = SparqlParser::new()
            .parse_query("PREFIX ex: <http://example.com/> SELECT * WHERE { ?s ex:p ex:o }")
            .unwrap();
        let Query::Select { pattern, .. } = query else {
            panic!("expected a SELECT query");
        };
        let GraphPattern::Project { inner, .. } = pattern else {
            panic!("expected a projection");
        };
        let GraphPattern::Bgp { patterns } = *inner else {
            panic!("expected a BGP");
        };
        assert_eq!(patterns.len(), 1);
        match &patterns[0].predicate {
            NamedNodePattern::NamedNode(n) => assert_eq!(n.as_str(), "http://example.com/p"),
            NamedNodePattern::Variable(_) => panic!("expected a bound predicate"),
        }
    }

    #[test]
    fn an_unclosed_brace_is_a_syntax_error() {
        assert!(SparqlParser::new().parse_query("SELECT * WHERE { ?s ?p ?o").is_err());
    }

    #[test]
    fn a_triples_block_may_follow_a_bind_without_its_own_brace() {
        let query = SparqlParser::new()
            .parse_query(
                "PREFIX ex: <http://example.com/> SELECT * WHERE { \
                 ?s ex:p ?o . BIND(?o AS ?d) . ?d ex:q ?z }",
            )
            .unwrap();
        let Query::Select { pattern, .. } = query else {
            panic!("expected a SELECT query");
        };
        let GraphPattern::Project { inner, .. } = pattern else {
            panic!("expected a projection");
        };
        let GraphPattern::Join { left, .. } = *inner else {
            panic!("expected the trailing triples block to be joined onto the BIND");
        };
        assert!(matches!(*left, GraphPattern::Extend { .. }));
    }
}
