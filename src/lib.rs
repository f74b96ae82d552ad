//! A small filter language for matching text and nested records.
//!
//! ```
//! use serde_json::json;
//! use sift::Engine;
//!
//! let engine = Engine::default();
//! let tree = engine.parse("name='cat' and age>=3");
//! assert!(engine.check(&json!({"name": "cat", "age": 4}), &tree));
//! assert!(!engine.check(&json!({"name": "cat"}), &tree));
//! ```

pub mod config;
pub mod debug;
pub mod dsl;
pub mod engine;
pub mod synonyms;

pub use dsl::{AstNode, CompareOp, LogicalOp, RegexLiteral, Subject, Value};
pub use engine::Engine;
pub use synonyms::SynonymTable;
