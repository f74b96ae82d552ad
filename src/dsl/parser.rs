//! Parser for the filter DSL.
//!
//! Grammar (in rough EBNF):
//!
//! expression = term (("and" | "or") term)*
//! term       = "(" expression ")" | field operator value | value
//! field      = [A-Za-z0-9_.]+
//! operator   = "=" | "!=" | "<=" | ">=" | "<" | ">" | "in" | "!in"
//!            | "contains_any" | "contains_all"
//! value      = string | regex | array | number | "true" | "false" | "null"
//!
//! The parser is a single forward scan. The cursor is the unconsumed tail of the
//! filter string, threaded through every function as `&mut &str`; it is created fresh
//! for each call to [`parse_filter`] and never moves backwards.
//!
//! Parsing never fails. A term that cannot be parsed ends the enclosing expression and
//! whatever was parsed before it is kept. Some deliberate quirks:
//!
//! - `and` / `or` are matched case-insensitively with no word boundary, so a term
//!   starting with `order` is read as the keyword `or` followed by `der`.
//! - An expression has a single operator. Every keyword overwrites it and the last one
//!   wins for all terms of that expression: `a=1 and b=2 or c=3` is an OR of three terms.
//! - Operators are tried in the order listed above; the first that matches wins.

use winnow::ascii::Caseless;
use winnow::combinator::alt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_till, take_while};

use super::ast::{AstNode, CompareOp, LogicalOp};
use super::value::{RegexLiteral, Value};

type PResult<T> = Result<T, ErrMode<ContextError>>;

/// Deepest nesting of parentheses and arrays.
const MAX_NESTING: usize = 128;

/// Parse a filter string into an AST.
pub fn parse_filter(filter: &str) -> AstNode {
    let mut input = filter;
    let ast = parse_expression(&mut input, 0);

    tracing::debug!(
        "Parsed filter {:?}: {} nodes, {} bytes unparsed",
        filter,
        ast.node_count(),
        input.len()
    );

    ast
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::default())
}

/// expression = term (("and" | "or") term)*
fn parse_expression(input: &mut &str, depth: usize) -> AstNode {
    let mut terms = Vec::new();
    let mut op = None;

    loop {
        skip_space(input);
        if input.is_empty() {
            break;
        }

        if depth >= MAX_NESTING && input.starts_with('(') {
            // A group nested past the limit never matches and ends the parse
            tracing::debug!("Filter nesting exceeds {} levels, ignoring the rest", MAX_NESTING);
            terms.push(AstNode::unmatchable());
            *input = "";
            break;
        } else if symbol(input, '(').is_ok() {
            let group = parse_expression(input, depth + 1);
            // A missing ")" is tolerated
            let _ = symbol(input, ')');
            terms.push(group);
        } else if let Ok(keyword) = keyword(input) {
            op = Some(keyword);
        } else {
            match parse_term(input, depth) {
                Ok(term) => terms.push(term),
                Err(_) => break,
            }
        }
    }

    match <[AstNode; 1]>::try_from(terms) {
        Ok([only]) => only,
        Err(terms) => AstNode::Logical {
            op: op.unwrap_or(LogicalOp::And),
            terms,
        },
    }
}

/// term = field operator value | value
fn parse_term(input: &mut &str, depth: usize) -> PResult<AstNode> {
    skip_space(input);

    // "0" is consumed but not taken as a field name, so a value may follow it
    if let Some(field) = identifier(input).ok().filter(|field| *field != "0") {
        skip_space(input);
        let op = operator(input)?;
        let value = parse_value(input, depth)?;
        return Ok(AstNode::Comparison {
            field: field.to_owned(),
            op,
            value,
        });
    }

    let value = parse_value(input, depth)?;
    Ok(AstNode::Text { value })
}

fn parse_value(input: &mut &str, depth: usize) -> PResult<Value> {
    skip_space(input);

    match input.chars().next() {
        None => Err(backtrack()),
        Some(quote @ ('"' | '\'')) => string_literal(input, quote),
        Some('/') => regex_literal(input),
        Some('[') if depth < MAX_NESTING => array_literal(input, depth + 1),
        Some('0'..='9' | '.' | '-') => number_literal(input),
        Some(_) => constant(input),
    }
}

/// `"text"` or `'text'`, no escapes.
fn string_literal(input: &mut &str, quote: char) -> PResult<Value> {
    symbol(input, quote)?;
    let body = until(input, quote)?;
    symbol(input, quote)?;
    Ok(Value::Str(body.to_owned()))
}

/// `/pattern/flags`; the pattern runs to the next `/`.
fn regex_literal(input: &mut &str) -> PResult<Value> {
    symbol(input, '/')?;
    let pattern = until(input, '/')?;
    symbol(input, '/')?;
    let flags = regex_flags(input)?;
    Ok(Value::Regex(RegexLiteral::new(pattern, flags)))
}

/// `[value, value, ...]`
///
/// An element that fails after consuming input is dropped. One that fails without
/// consuming anything would never make progress, so it fails the whole array.
fn array_literal(input: &mut &str, depth: usize) -> PResult<Value> {
    symbol(input, '[')?;
    let mut items = Vec::new();

    loop {
        skip_space(input);
        if input.is_empty() {
            return Err(backtrack());
        }
        if symbol(input, ']').is_ok() {
            return Ok(Value::List(items));
        }
        if symbol(input, ',').is_ok() {
            continue;
        }

        let before = input.len();
        match parse_value(input, depth) {
            Ok(item) => items.push(item),
            Err(_) if input.len() == before => return Err(backtrack()),
            Err(_) => {}
        }
    }
}

/// The longest run of `[0-9.-]`, accepted only if it is a valid number as a whole.
fn number_literal(input: &mut &str) -> PResult<Value> {
    let run = number_run(input)?;
    run.parse::<f64>().map(Value::Num).map_err(|_| backtrack())
}

fn constant(input: &mut &str) -> PResult<Value> {
    alt((
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        "null".value(Value::Null),
    ))
    .parse_next(input)
}

fn operator(input: &mut &str) -> PResult<CompareOp> {
    alt((
        "=".value(CompareOp::Eq),
        "!=".value(CompareOp::Ne),
        "<=".value(CompareOp::Le),
        ">=".value(CompareOp::Ge),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
        "in".value(CompareOp::In),
        "!in".value(CompareOp::NotIn),
        "contains_any".value(CompareOp::ContainsAny),
        "contains_all".value(CompareOp::ContainsAll),
    ))
    .parse_next(input)
}

fn keyword(input: &mut &str) -> PResult<LogicalOp> {
    alt((
        literal(Caseless("and")).value(LogicalOp::And),
        literal(Caseless("or")).value(LogicalOp::Or),
    ))
    .parse_next(input)
}

fn identifier<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.').parse_next(input)
}

fn number_run<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., ('0'..='9', '.', '-')).parse_next(input)
}

fn regex_flags<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(0.., 'a'..='z').parse_next(input)
}

/// Everything up to (not including) `stop`, or the rest of the input.
fn until<'i>(input: &mut &'i str, stop: char) -> PResult<&'i str> {
    take_till(0.., stop).parse_next(input)
}

fn symbol(input: &mut &str, c: char) -> PResult<char> {
    one_of(c).parse_next(input)
}

fn skip_space(input: &mut &str) {
    let _: PResult<&str> = take_while(0.., is_space).parse_next(input);
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(field: &str, op: CompareOp, value: Value) -> AstNode {
        AstNode::Comparison {
            field: field.into(),
            op,
            value,
        }
    }

    fn text(s: &str) -> AstNode {
        AstNode::Text {
            value: Value::Str(s.into()),
        }
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            parse_filter("name=\"cat\""),
            cmp("name", CompareOp::Eq, Value::Str("cat".into()))
        );
    }

    #[test]
    fn test_whitespace_around_operator() {
        assert_eq!(
            parse_filter("  age >= 3 "),
            cmp("age", CompareOp::Ge, Value::Num(3.0))
        );
    }

    #[test]
    fn test_all_operators() {
        let cases = [
            ("a=1", CompareOp::Eq),
            ("a!=1", CompareOp::Ne),
            ("a<=1", CompareOp::Le),
            ("a>=1", CompareOp::Ge),
            ("a<1", CompareOp::Lt),
            ("a>1", CompareOp::Gt),
        ];
        for (filter, op) in cases {
            assert_eq!(parse_filter(filter), cmp("a", op, Value::Num(1.0)), "{filter}");
        }

        let list = Value::List(vec![Value::Num(1.0)]);
        assert_eq!(parse_filter("a in [1]"), cmp("a", CompareOp::In, list.clone()));
        assert_eq!(parse_filter("a !in [1]"), cmp("a", CompareOp::NotIn, list.clone()));
        assert_eq!(
            parse_filter("a contains_any [1]"),
            cmp("a", CompareOp::ContainsAny, list.clone())
        );
        assert_eq!(
            parse_filter("a contains_all [1]"),
            cmp("a", CompareOp::ContainsAll, list)
        );
    }

    #[test]
    fn test_nested_field_path() {
        assert_eq!(
            parse_filter("owner.address.city='Oslo'"),
            cmp("owner.address.city", CompareOp::Eq, Value::Str("Oslo".into()))
        );
    }

    #[test]
    fn test_and_expression() {
        assert_eq!(
            parse_filter("name=\"cat\" and age>=3"),
            AstNode::Logical {
                op: LogicalOp::And,
                terms: vec![
                    cmp("name", CompareOp::Eq, Value::Str("cat".into())),
                    cmp("age", CompareOp::Ge, Value::Num(3.0)),
                ],
            }
        );
    }

    #[test]
    fn test_last_keyword_wins() {
        let ast = parse_filter("a=1 and b=2 OR c=3");
        match ast {
            AstNode::Logical { op, terms } => {
                assert_eq!(op, LogicalOp::Or);
                assert_eq!(terms.len(), 3);
            }
            other => panic!("expected logical node, got {other:?}"),
        }
    }

    #[test]
    fn test_default_operator_is_and() {
        let ast = parse_filter("a=1 b=2");
        assert!(matches!(ast, AstNode::Logical { op: LogicalOp::And, ref terms } if terms.len() == 2));
    }

    #[test]
    fn test_keyword_without_word_boundary() {
        // "order" is the keyword "or" followed by the field "der"
        assert_eq!(
            parse_filter("order=1"),
            cmp("der", CompareOp::Eq, Value::Num(1.0))
        );
        // "andrew" is "and" + "rew"
        assert_eq!(
            parse_filter("andrew='x'"),
            cmp("rew", CompareOp::Eq, Value::Str("x".into()))
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(parse_filter("(\"cat\")"), text("cat"));
        assert_eq!(
            parse_filter("(a=1 or a=2) and b=3"),
            AstNode::Logical {
                op: LogicalOp::And,
                terms: vec![
                    AstNode::Logical {
                        op: LogicalOp::Or,
                        terms: vec![
                            cmp("a", CompareOp::Eq, Value::Num(1.0)),
                            cmp("a", CompareOp::Eq, Value::Num(2.0)),
                        ],
                    },
                    cmp("b", CompareOp::Eq, Value::Num(3.0)),
                ],
            }
        );
    }

    #[test]
    fn test_missing_close_paren_is_tolerated() {
        assert_eq!(parse_filter("(a=1"), cmp("a", CompareOp::Eq, Value::Num(1.0)));
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(parse_filter("()"), AstNode::empty());
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(parse_filter(""), AstNode::empty());
        assert_eq!(parse_filter("   "), AstNode::empty());
    }

    #[test]
    fn test_full_text_values() {
        assert_eq!(parse_filter("'big cat'"), text("big cat"));
        assert_eq!(
            parse_filter("/^ca+t$/i"),
            AstNode::Text {
                value: Value::Regex(RegexLiteral::new("^ca+t$", "i")),
            }
        );
        assert_eq!(
            parse_filter("-5"),
            AstNode::Text {
                value: Value::Num(-5.0)
            }
        );
    }

    #[test]
    fn test_bare_word_is_dropped() {
        // An identifier must be followed by an operator
        assert_eq!(parse_filter("cat"), AstNode::empty());
        assert_eq!(parse_filter("a=1 cat"), cmp("a", CompareOp::Eq, Value::Num(1.0)));
    }

    #[test]
    fn test_failed_term_ends_expression() {
        assert_eq!(
            parse_filter("a=1 and b=@ and c=2"),
            cmp("a", CompareOp::Eq, Value::Num(1.0))
        );
    }

    #[test]
    fn test_unterminated_string_consumes_rest() {
        assert_eq!(parse_filter("a=\"open and b=1"), AstNode::empty());
        assert_eq!(
            parse_filter("b=1 and a='open"),
            cmp("b", CompareOp::Eq, Value::Num(1.0))
        );
    }

    #[test]
    fn test_quotes_do_not_escape() {
        assert_eq!(
            parse_filter("a='say \"hi\"'"),
            cmp("a", CompareOp::Eq, Value::Str("say \"hi\"".into()))
        );
    }

    #[test]
    fn test_regex_body_is_verbatim() {
        assert_eq!(
            parse_filter(r"a=/\d+\.\d+/"),
            cmp("a", CompareOp::Eq, Value::Regex(RegexLiteral::new(r"\d+\.\d+", "")))
        );
        assert_eq!(parse_filter("a=/open"), AstNode::empty());
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            parse_filter("tags in [ 'a' , 2, true, null, [false] ]"),
            cmp(
                "tags",
                CompareOp::In,
                Value::List(vec![
                    Value::Str("a".into()),
                    Value::Num(2.0),
                    Value::Bool(true),
                    Value::Null,
                    Value::List(vec![Value::Bool(false)]),
                ])
            )
        );
        assert_eq!(
            parse_filter("tags contains_all []"),
            cmp("tags", CompareOp::ContainsAll, Value::List(vec![]))
        );
    }

    #[test]
    fn test_array_drops_consumed_failures() {
        // "1-2" is consumed but is not a number
        assert_eq!(
            parse_filter("a in [1-2, 3]"),
            cmp("a", CompareOp::In, Value::List(vec![Value::Num(3.0)]))
        );
    }

    #[test]
    fn test_array_with_stuck_element_fails() {
        assert_eq!(parse_filter("a in [x]"), AstNode::empty());
        assert_eq!(parse_filter("a in [1, 2"), AstNode::empty());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_filter("a=.5"), cmp("a", CompareOp::Eq, Value::Num(0.5)));
        assert_eq!(parse_filter("a=-2.25"), cmp("a", CompareOp::Eq, Value::Num(-2.25)));
        assert_eq!(parse_filter("a=1.2.3"), AstNode::empty());
        assert_eq!(parse_filter("a=-"), AstNode::empty());
    }

    #[test]
    fn test_constants_are_lowercase() {
        assert_eq!(parse_filter("a=true"), cmp("a", CompareOp::Eq, Value::Bool(true)));
        assert_eq!(parse_filter("a=false"), cmp("a", CompareOp::Eq, Value::Bool(false)));
        assert_eq!(parse_filter("a=null"), cmp("a", CompareOp::Eq, Value::Null));
        assert_eq!(parse_filter("a=TRUE"), AstNode::empty());
    }

    #[test]
    fn test_missing_operator_or_value() {
        assert_eq!(parse_filter("a"), AstNode::empty());
        assert_eq!(parse_filter("a="), AstNode::empty());
        assert_eq!(parse_filter("a ~ 1"), AstNode::empty());
    }

    #[test]
    fn test_two_char_operators_before_one_char() {
        assert_eq!(parse_filter("a<=1"), cmp("a", CompareOp::Le, Value::Num(1.0)));
        assert_eq!(parse_filter("a>=1"), cmp("a", CompareOp::Ge, Value::Num(1.0)));
        assert_eq!(
            parse_filter("a in[1]"),
            cmp("a", CompareOp::In, Value::List(vec![Value::Num(1.0)]))
        );
    }

    #[test]
    fn test_stray_close_paren_stops_parsing() {
        assert_eq!(parse_filter("a=1 ) b=2"), cmp("a", CompareOp::Eq, Value::Num(1.0)));
    }

    #[test]
    fn test_zero_is_not_a_field_name() {
        assert_eq!(parse_filter("0"), AstNode::empty());
        assert_eq!(parse_filter("0 'cat'"), text("cat"));
        assert_eq!(parse_filter("0=1"), AstNode::empty());
        assert_eq!(
            parse_filter("00=1"),
            cmp("00", CompareOp::Eq, Value::Num(1.0))
        );
    }

    #[test]
    fn test_group_past_nesting_limit_never_matches() {
        let record = serde_json::json!({"x": 1});
        let synonyms = crate::synonyms::SynonymTable::default();
        let check = |filter: &str| {
            crate::dsl::evaluate_filter(
                &parse_filter(filter),
                crate::dsl::Subject::Record(&record),
                &synonyms,
            )
        };

        let filter = "((x=5) or x=6";
        let deep = format!("{}{filter}", "(".repeat(MAX_NESTING - 1));
        assert!(!check(filter));
        assert!(!check(&deep));

        let at_limit = format!("{}x=1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(check(&at_limit));
        let past_limit = format!("x=1 or {}x=1", "(".repeat(MAX_NESTING + 1));
        assert_eq!(
            parse_filter(&past_limit),
            AstNode::Logical {
                op: LogicalOp::Or,
                terms: vec![
                    cmp("x", CompareOp::Eq, Value::Num(1.0)),
                    AstNode::unmatchable()
                ],
            }
        );
        assert!(!check(&format!("x=1 and {}x=1", "(".repeat(MAX_NESTING + 1))));
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let filter = format!("{}a=1{}", "(".repeat(10_000), ")".repeat(10_000));
        // Must not overflow the stack
        let _ = parse_filter(&filter);

        let filter = format!("a in {}1{}", "[".repeat(10_000), "]".repeat(10_000));
        let _ = parse_filter(&filter);
    }

    #[test]
    fn test_non_ascii_input() {
        assert_eq!(
            parse_filter("name='Zoë' and 'ünïcode'"),
            AstNode::Logical {
                op: LogicalOp::And,
                terms: vec![
                    cmp("name", CompareOp::Eq, Value::Str("Zoë".into())),
                    text("ünïcode"),
                ],
            }
        );
        let _ = parse_filter("ü=1 ∧ é");
    }
}
