use crate::error::EvalError;
use crate::eval::{Binding, EvalContext};
use crate::QueryableDataset;
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term};
use oxsdatatypes::{Boolean, Decimal, Double, Integer};
use sparopt::algebra::{Expression, Function};

/// A numeric value decoded from a literal, tracking which xsd type it came from so that
/// arithmetic can follow the simplified integer/double promotion rule below.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NumericValue {
    Integer(Integer),
    Decimal(Decimal),
    Double(Double),
}

impl NumericValue {
    fn as_double(self) -> Double {
        match self {
            Self::Integer(i) => i.into(),
            Self::Decimal(d) => d.into(),
            Self::Double(d) => d,
        }
    }
}

impl From<NumericValue> for Literal {
    fn from(value: NumericValue) -> Self {
        match value {
            NumericValue::Integer(i) => i.into(),
            NumericValue::Decimal(d) => d.into(),
            NumericValue::Double(d) => d.into(),
        }
    }
}

/// Decodes a term as a number if it is a literal typed `xsd:integer`, `xsd:decimal` or
/// `xsd:double` with a lexical form that parses as such.
pub(crate) fn extract_numeric(term: &Term) -> Option<NumericValue> {
    let Term::Literal(literal) = term else {
        return None;
    };
    let datatype = literal.datatype();
    if datatype == xsd::INTEGER {
        Some(NumericValue::Integer(literal.value().parse().ok()?))
    } else if datatype == xsd::DECIMAL {
        Some(NumericValue::Decimal(literal.value().parse().ok()?))
    } else if datatype == xsd::DOUBLE {
        Some(NumericValue::Double(literal.value().parse().ok()?))
    } else {
        None
    }
}

/// The "promote both to integer if both are integers, otherwise promote both to double" rule.
fn numeric_binary(
    left: NumericValue,
    right: NumericValue,
    int_op: impl FnOnce(Integer, Integer) -> Option<Integer>,
    double_op: impl FnOnce(Double, Double) -> Double,
) -> Result<NumericValue, EvalError> {
    if let (NumericValue::Integer(l), NumericValue::Integer(r)) = (left, right) {
        int_op(l, r).map(NumericValue::Integer).ok_or(EvalError)
    } else {
        Ok(NumericValue::Double(double_op(
            left.as_double(),
            right.as_double(),
        )))
    }
}

/// The canonical string form used for `DISTINCT` hashing, `ORDER BY` fallback comparison and
/// lexicographic term comparison. Uses `Display` (not `BlankNode::as_str`, which is empty for
/// anonymous blank nodes) so that every term, including unlabeled blank nodes, renders distinctly.
pub(crate) fn term_string_form(term: &Term) -> String {
    term.to_string()
}

fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::Literal(l) if l.is_plain() || l.datatype() == xsd::STRING => Some(l.value()),
        _ => None,
    }
}

/// Effective boolean value: true iff the term is a non-zero/non-NaN number, a non-empty string
/// literal, or the boolean `true`/`1`; every other term (IRIs, blank nodes, other-typed literals,
/// unparsable lexical forms) is an error, not `false`.
pub(crate) fn effective_boolean_value(term: &Term) -> Result<bool, EvalError> {
    if let Some(numeric) = extract_numeric(term) {
        let d = f64::from(numeric.as_double());
        return Ok(d != 0.0 && !d.is_nan());
    }
    if let Term::Literal(l) = term {
        if l.datatype() == xsd::BOOLEAN {
            let b: Boolean = l.value().parse().map_err(|_| EvalError)?;
            return Ok(b.into());
        }
        if l.is_plain() || l.datatype() == xsd::STRING {
            return Ok(!l.value().is_empty());
        }
    }
    Err(EvalError)
}

/// `=`/`!=` use plain RDF term equality; other comparisons are numeric-by-value when both sides
/// are numeric, else lexicographic by [`term_string_form`].
fn compare_terms(left: &Term, right: &Term) -> Result<std::cmp::Ordering, EvalError> {
    if let (Some(l), Some(r)) = (extract_numeric(left), extract_numeric(right)) {
        return f64::from(l.as_double())
            .partial_cmp(&f64::from(r.as_double()))
            .ok_or(EvalError);
    }
    Ok(term_string_form(left).cmp(&term_string_form(right)))
}

/// Total order used by `ORDER BY`: unbound sorts before bound, otherwise [`compare_terms`].
pub(crate) fn compare_for_order(left: Option<&Term>, right: Option<&Term>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => compare_terms(l, r).unwrap_or(Ordering::Equal),
    }
}

pub(crate) fn evaluate<D: QueryableDataset + Clone + 'static>(
    expression: &Expression,
    binding: &Binding,
    ctx: &EvalContext<D>,
) -> Result<Term, EvalError> {
    match expression {
        Expression::NamedNode(n) => Ok(Term::NamedNode(n.clone())),
        Expression::Literal(l) => Ok(Term::Literal(l.clone())),
        Expression::Variable(v) => binding.get(v).cloned().ok_or(EvalError),
        Expression::Bound(v) => Ok(bool_term(binding.contains_key(v))),
        Expression::Not(e) => Ok(bool_term(!effective_boolean_value(&evaluate(e, binding, ctx)?)?)),
        Expression::UnaryPlus(e) => {
            let v = evaluate(e, binding, ctx)?;
            extract_numeric(&v).ok_or(EvalError)?;
            Ok(v)
        }
        Expression::UnaryMinus(e) => {
            let v = extract_numeric(&evaluate(e, binding, ctx)?).ok_or(EvalError)?;
            let negated = match v {
                NumericValue::Integer(i) => NumericValue::Integer(i.checked_neg().ok_or(EvalError)?),
                NumericValue::Decimal(d) => NumericValue::Decimal(d.checked_neg().ok_or(EvalError)?),
                NumericValue::Double(d) => NumericValue::Double(-d),
            };
            Ok(Term::Literal(negated.into()))
        }
        Expression::Or(l, r) => {
            let left = evaluate(l, binding, ctx).and_then(|t| effective_boolean_value(&t));
            if left == Ok(true) {
                return Ok(bool_term(true));
            }
            let right = evaluate(r, binding, ctx).and_then(|t| effective_boolean_value(&t));
            if right == Ok(true) {
                return Ok(bool_term(true));
            }
            Ok(bool_term(left? || right?))
        }
        Expression::And(l, r) => {
            let left = evaluate(l, binding, ctx).and_then(|t| effective_boolean_value(&t));
            if left == Ok(false) {
                return Ok(bool_term(false));
            }
            let right = evaluate(r, binding, ctx).and_then(|t| effective_boolean_value(&t));
            if right == Ok(false) {
                return Ok(bool_term(false));
            }
            Ok(bool_term(left? && right?))
        }
        Expression::Equal(l, r) => {
            let (l, r) = (evaluate(l, binding, ctx)?, evaluate(r, binding, ctx)?);
            Ok(bool_term(l == r))
        }
        Expression::SameTerm(l, r) => {
            let (l, r) = (evaluate(l, binding, ctx)?, evaluate(r, binding, ctx)?);
            Ok(bool_term(l == r))
        }
        Expression::Greater(l, r) => compare_bool(l, r, binding, ctx, |o| o.is_gt()),
        Expression::GreaterOrEqual(l, r) => compare_bool(l, r, binding, ctx, |o| o.is_ge()),
        Expression::Less(l, r) => compare_bool(l, r, binding, ctx, |o| o.is_lt()),
        Expression::LessOrEqual(l, r) => compare_bool(l, r, binding, ctx, |o| o.is_le()),
        Expression::In(e, list) => {
            let value = evaluate(e, binding, ctx)?;
            let mut found = false;
            for candidate in list {
                // A single failing comparison is skipped, not fatal, unless nothing else matches.
                if let Ok(v) = evaluate(candidate, binding, ctx) {
                    if v == value {
                        found = true;
                        break;
                    }
                }
            }
            Ok(bool_term(found))
        }
        Expression::Add(l, r) => numeric_binary_expr(l, r, binding, ctx, |a, b| a.checked_add(b), |a, b| a + b),
        Expression::Subtract(l, r) => numeric_binary_expr(l, r, binding, ctx, |a, b| a.checked_sub(b), |a, b| a - b),
        Expression::Multiply(l, r) => numeric_binary_expr(l, r, binding, ctx, |a, b| a.checked_mul(b), |a, b| a * b),
        Expression::Divide(l, r) => numeric_binary_expr(l, r, binding, ctx, |a, b| a.checked_div(b), |a, b| a / b),
        Expression::Exists(pattern) => Ok(bool_term(ctx.eval_exists(pattern, binding))),
        Expression::FunctionCall(function, args) => evaluate_function(function, args, binding, ctx),
    }
}

fn bool_term(b: bool) -> Term {
    Term::Literal(Boolean::from(b).into())
}

fn compare_bool<D: QueryableDataset + Clone + 'static>(
    l: &Expression,
    r: &Expression,
    binding: &Binding,
    ctx: &EvalContext<D>,
    test: impl FnOnce(std::cmp::Ordering) -> bool,
) -> Result<Term, EvalError> {
    let (l, r) = (evaluate(l, binding, ctx)?, evaluate(r, binding, ctx)?);
    Ok(bool_term(test(compare_terms(&l, &r)?)))
}

fn numeric_binary_expr<D: QueryableDataset + Clone + 'static>(
    l: &Expression,
    r: &Expression,
    binding: &Binding,
    ctx: &EvalContext<D>,
    int_op: impl FnOnce(Integer, Integer) -> Option<Integer>,
    double_op: impl FnOnce(Double, Double) -> Double,
) -> Result<Term, EvalError> {
    let l = extract_numeric(&evaluate(l, binding, ctx)?).ok_or(EvalError)?;
    let r = extract_numeric(&evaluate(r, binding, ctx)?).ok_or(EvalError)?;
    Ok(Term::Literal(numeric_binary(l, r, int_op, double_op)?.into()))
}

fn evaluate_function<D: QueryableDataset + Clone + 'static>(
    function: &Function,
    args: &[Expression],
    binding: &Binding,
    ctx: &EvalContext<D>,
) -> Result<Term, EvalError> {
    match function {
        Function::Custom(name) => evaluate_cast_or_custom(name, args, binding, ctx),
        Function::Str => {
            let v = evaluate(&args[0], binding, ctx)?;
            Ok(Term::Literal(Literal::new_simple_literal(match &v {
                Term::NamedNode(n) => n.as_str().to_owned(),
                Term::BlankNode(b) => b.to_string(),
                Term::Literal(l) => l.value().to_owned(),
            })))
        }
        Function::Lang => {
            let v = evaluate(&args[0], binding, ctx)?;
            let Term::Literal(l) = v else { return Err(EvalError) };
            Ok(Term::Literal(Literal::new_simple_literal(
                l.language().unwrap_or("").to_owned(),
            )))
        }
        Function::LangMatches => {
            let lang = string_term(&evaluate(&args[0], binding, ctx)?)?;
            let range = string_term(&evaluate(&args[1], binding, ctx)?)?;
            Ok(bool_term(lang_matches(&lang, &range)))
        }
        Function::Datatype => {
            let v = evaluate(&args[0], binding, ctx)?;
            let Term::Literal(l) = v else { return Err(EvalError) };
            Ok(Term::NamedNode(l.datatype().into_owned()))
        }
        Function::Abs => numeric_unary(&args[0], binding, ctx, |i: Integer| Ok(i.abs()), |d| d.abs()),
        Function::Ceil => numeric_unary(&args[0], binding, ctx, Ok, |d| d.ceil()),
        Function::Floor => numeric_unary(&args[0], binding, ctx, Ok, |d| d.floor()),
        Function::Round => numeric_unary(&args[0], binding, ctx, Ok, |d| d.round()),
        Function::Concat => {
            let mut out = String::new();
            for a in args {
                out.push_str(&string_term(&evaluate(a, binding, ctx)?)?);
            }
            Ok(Term::Literal(Literal::new_simple_literal(out)))
        }
        Function::SubStr => {
            let source = string_term(&evaluate(&args[0], binding, ctx)?)?;
            let start = numeric_index(&evaluate(&args[1], binding, ctx)?)?;
            let chars: Vec<char> = source.chars().collect();
            let start_index = (start - 1).max(0) as usize;
            let result = if let Some(len_expr) = args.get(2) {
                let len = numeric_index(&evaluate(len_expr, binding, ctx)?)?.max(0) as usize;
                chars.iter().skip(start_index).take(len).collect::<String>()
            } else {
                chars.iter().skip(start_index).collect::<String>()
            };
            Ok(Term::Literal(Literal::new_simple_literal(result)))
        }
        Function::StrLen => {
            let s = string_term(&evaluate(&args[0], binding, ctx)?)?;
            Ok(Term::Literal(Integer::from(s.chars().count() as i64).into()))
        }
        Function::UCase => Ok(Term::Literal(Literal::new_simple_literal(
            string_term(&evaluate(&args[0], binding, ctx)?)?.to_uppercase(),
        ))),
        Function::LCase => Ok(Term::Literal(Literal::new_simple_literal(
            string_term(&evaluate(&args[0], binding, ctx)?)?.to_lowercase(),
        ))),
        Function::Contains => Ok(bool_term(
            string_term(&evaluate(&args[0], binding, ctx)?)?
                .contains(&string_term(&evaluate(&args[1], binding, ctx)?)?),
        )),
        Function::StrStarts => Ok(bool_term(
            string_term(&evaluate(&args[0], binding, ctx)?)?
                .starts_with(&string_term(&evaluate(&args[1], binding, ctx)?)?),
        )),
        Function::StrEnds => Ok(bool_term(
            string_term(&evaluate(&args[0], binding, ctx)?)?
                .ends_with(&string_term(&evaluate(&args[1], binding, ctx)?)?),
        )),
        Function::IsIri => Ok(bool_term(matches!(
            evaluate(&args[0], binding, ctx)?,
            Term::NamedNode(_)
        ))),
        Function::IsBlank => Ok(bool_term(matches!(
            evaluate(&args[0], binding, ctx)?,
            Term::BlankNode(_)
        ))),
        Function::IsLiteral => Ok(bool_term(matches!(
            evaluate(&args[0], binding, ctx)?,
            Term::Literal(_)
        ))),
        Function::IsNumeric => Ok(bool_term(
            extract_numeric(&evaluate(&args[0], binding, ctx)?).is_some(),
        )),
        Function::Regex => {
            let text = string_term(&evaluate(&args[0], binding, ctx)?)?;
            let pattern = string_term(&evaluate(&args[1], binding, ctx)?)?;
            let flags = match args.get(2) {
                Some(e) => string_term(&evaluate(e, binding, ctx)?)?,
                None => String::new(),
            };
            Ok(bool_term(regex_matches(&text, &pattern, &flags)?))
        }
    }
}

fn string_term(term: &Term) -> Result<String, EvalError> {
    string_value(term).map(str::to_owned).ok_or(EvalError)
}

fn numeric_index(term: &Term) -> Result<i64, EvalError> {
    let n = extract_numeric(term).ok_or(EvalError)?;
    Ok(f64::from(n.as_double()).round() as i64)
}

fn numeric_unary<D: QueryableDataset + Clone + 'static>(
    e: &Expression,
    binding: &Binding,
    ctx: &EvalContext<D>,
    int_op: impl FnOnce(Integer) -> Result<Integer, EvalError>,
    double_op: impl FnOnce(Double) -> Double,
) -> Result<Term, EvalError> {
    let v = extract_numeric(&evaluate(e, binding, ctx)?).ok_or(EvalError)?;
    let result = match v {
        NumericValue::Integer(i) => NumericValue::Integer(int_op(i)?),
        NumericValue::Decimal(d) => NumericValue::Double(double_op(d.into())),
        NumericValue::Double(d) => NumericValue::Double(double_op(d)),
    };
    Ok(Term::Literal(result.into()))
}

fn lang_matches(lang: &str, range: &str) -> bool {
    if range == "*" {
        return !lang.is_empty();
    }
    lang.eq_ignore_ascii_case(range)
        || lang
            .to_ascii_lowercase()
            .starts_with(&format!("{}-", range.to_ascii_lowercase()))
}

/// Supports the `i`, `m`, `s` and `x` flags; `q` (literal match) is accepted and ignored since
/// `regex` has no equivalent toggle.
fn regex_matches(text: &str, pattern: &str, flags: &str) -> Result<bool, EvalError> {
    let mut builder = regex::RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'q' => {}
            _ => return Err(EvalError),
        }
    }
    Ok(builder.build().map_err(|_| EvalError)?.is_match(text))
}

/// `Function::Custom` unifies two syntactic shapes: a user-defined function call, and an
/// `xsd:xxx(arg)` cast. A name in the `http://www.w3.org/2001/XMLSchema#` namespace is always
/// treated as a cast to that datatype; anything else is an unsupported custom call.
fn evaluate_cast_or_custom<D: QueryableDataset + Clone + 'static>(
    name: &NamedNode,
    args: &[Expression],
    binding: &Binding,
    ctx: &EvalContext<D>,
) -> Result<Term, EvalError> {
    const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    if !name.as_str().starts_with(XSD) || args.len() != 1 {
        return Err(EvalError);
    }
    let value = evaluate(&args[0], binding, ctx)?;
    let lexical = match &value {
        Term::Literal(l) => l.value().to_owned(),
        Term::NamedNode(n) => n.as_str().to_owned(),
        Term::BlankNode(_) => return Err(EvalError),
    };
    // Round-trip the lexical form through the target type to reject malformed casts.
    match name.as_str() {
        "http://www.w3.org/2001/XMLSchema#integer" => {
            let i: Integer = lexical.parse().map_err(|_| EvalError)?;
            Ok(Term::Literal(i.into()))
        }
        "http://www.w3.org/2001/XMLSchema#decimal" => {
            let d: Decimal = lexical.parse().map_err(|_| EvalError)?;
            Ok(Term::Literal(d.into()))
        }
        "http://www.w3.org/2001/XMLSchema#double" => {
            let d: Double = lexical.parse().map_err(|_| EvalError)?;
            Ok(Term::Literal(d.into()))
        }
        "http://www.w3.org/2001/XMLSchema#boolean" => {
            let b: Boolean = lexical.parse().map_err(|_| EvalError)?;
            Ok(Term::Literal(b.into()))
        }
        "http://www.w3.org/2001/XMLSchema#string" => Ok(Term::Literal(Literal::new_simple_literal(lexical))),
        _ => Ok(Term::Literal(Literal::new_typed_literal(lexical, name.clone()))),
    }
}
