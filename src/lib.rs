//! # Sigma-to-Logpoint Query Compiler
//!
//! A Rust library for translating vendor-neutral detection logic into
//! [Logpoint](https://www.logpoint.com/) search queries. The input is an
//! already-parsed detection: named selections (field/value matches with
//! typed modifiers) and a boolean condition tree over the selection names.
//! The output is one or more backend query strings that are semantically
//! equivalent to the original condition, with correct operator precedence,
//! quoting, escaping, and per-modifier translation.
//!
//! Rule-file discovery, YAML parsing of the source rule format, and corpus
//! fetching are deliberately out of scope; external collaborators hand the
//! compiler a validated in-memory [`Detection`].
//!
//! ## Quick Start
//!
//! ```rust
//! use sigma_logpoint::{Compiler, FieldMatch, FieldValue, ModifierTag, Selection};
//!
//! let compiler = Compiler::new();
//! let selections = vec![Selection::new(
//!     "selection",
//!     vec![FieldMatch::new(
//!         "CommandLine",
//!         vec![FieldValue::scalar("whoami")],
//!         vec![ModifierTag::Contains],
//!     )],
//! )];
//!
//! let compiled = compiler.compile_condition("selection", selections)?;
//! assert_eq!(compiled.queries[0].text, "CommandLine=*whoami*");
//! # Ok::<(), sigma_logpoint::BackendError>(())
//! ```
//!
//! ## Batch Compilation
//!
//! Rules compile independently, so batches run in parallel and a malformed
//! rule only fails its own slot:
//!
//! ```rust,ignore
//! let results = compiler.compile_batch(&detections);
//! let (passed, failed): (Vec<_>, Vec<_>) =
//!     results.iter().partition(|r| r.is_ok());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use sigma_logpoint::{Compiler, CompilerConfig, FieldMatch, ModifierPolicy, Selection};
//!
//! let config = CompilerConfig::new()
//!     .with_scope_qualifier("norm_id=WinServer")
//!     .with_modifier_policy(ModifierPolicy::Lenient);
//! let compiler = Compiler::with_config(config);
//!
//! let selections = vec![Selection::new(
//!     "sel",
//!     vec![FieldMatch::scalar("event_id", "4624")],
//! )];
//! let compiled = compiler.compile_condition("sel", selections)?;
//! assert_eq!(compiled.queries[0].text, "norm_id=WinServer event_id=4624");
//! # Ok::<(), sigma_logpoint::BackendError>(())
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod ir;

mod emitter;

// Compiler and configuration
pub use compiler::Compiler;
pub use config::{CompilerConfig, ModifierPolicy};

// Core types and errors
pub use error::{BackendError, Result};
pub use ir::{
    CompiledQuery, CompiledRule, ConditionNode, Detection, FieldMatch, FieldValue, Fragment,
    ModifierTag, Precedence, QuantifierKind, Selection,
};
