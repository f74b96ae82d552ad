//! Filter language for text and record matching.
//!
//! Syntax:
//!   "big cat", 'cat'          - full-text match (case-insensitive substring, synonyms)
//!   /^ca+t$/i                 - full-text regex match
//!   name="cat"                - strict equality (also !=)
//!   age>=3, age<3, ...        - numeric or string ordering
//!   owner.address.city='Oslo' - nested field path
//!   email=/@example\.com$/    - regex match on a field
//!   color in ['red', 'blue']  - membership (also !in)
//!   tags contains_any [...]   - list intersection is not empty
//!   tags contains_all [...]   - list contains every element
//!   expr and expr, expr or expr
//!   (expr)                    - grouping
//!
//! An expression carries one operator for all of its terms (the last `and`/`or` seen).

mod ast;
mod eval;
mod field;
mod parser;
mod value;

pub use ast::*;
pub use eval::{Subject, evaluate_filter};
pub use field::resolve;
pub use parser::parse_filter;
pub use value::{RegexLiteral, Value, render_number};
