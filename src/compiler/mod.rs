//! Detection-to-query compilation.
//!
//! This module turns a parsed detection (selections plus condition tree)
//! into Logpoint query strings. It is organized into several sub-modules:
//! - [`parser`] - tokenization and parsing of condition expressions
//! - [`modifiers`] - resolution of modifier tags into match strategies
//! - [`render`] - value rendering, quoting and escaping
//! - [`codegen`] - quantifier expansion and tree-to-fragment generation

pub(crate) mod codegen;
pub(crate) mod modifiers;
pub(crate) mod parser;
pub(crate) mod render;

use rayon::prelude::*;

use crate::config::CompilerConfig;
use crate::emitter;
use crate::error::Result;
use crate::ir::{CompiledRule, Detection, Selection};

/// The detection rule compiler.
///
/// Stateless apart from its configuration: every call compiles one rule
/// independently, so rules may be compiled in parallel with no
/// synchronization.
///
/// # Examples
///
/// ```rust
/// use sigma_logpoint::{Compiler, FieldMatch, Selection};
///
/// let compiler = Compiler::new();
/// let selections = vec![Selection::new(
///     "sel",
///     vec![FieldMatch::scalar("fieldA", "valueA")],
/// )];
///
/// let compiled = compiler.compile_condition("sel", selections)?;
/// assert_eq!(compiled.queries[0].text, "fieldA=valueA");
/// # Ok::<(), sigma_logpoint::BackendError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    /// Create a compiler with the default configuration (strict modifier
    /// policy, no scope qualifier, no length limit).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one detection into its queries.
    ///
    /// The input is consumed read-only; compiling the same detection twice
    /// yields byte-identical output.
    ///
    /// # Errors
    /// Returns a rule-scoped [`crate::BackendError`] when the condition
    /// references an unknown selection, a modifier combination has no
    /// translation (strict mode), a value is malformed, a quantifier glob
    /// matches nothing, or the rule cannot fit the backend's limits.
    pub fn compile(&self, detection: &Detection) -> Result<CompiledRule> {
        let mut tree_compiler = codegen::TreeCompiler::new(&detection.selections, &self.config);
        let root = tree_compiler.compile_root(&detection.condition)?;
        let queries = emitter::emit(&root, &self.config)?;

        Ok(CompiledRule {
            queries,
            strategies: tree_compiler.coverage.into_iter().collect(),
            warnings: tree_compiler.warnings,
        })
    }

    /// Parse a condition string (e.g. `"not (sel1 or sel2)"`) against the
    /// given selections and compile the result.
    pub fn compile_condition(
        &self,
        condition: &str,
        selections: Vec<Selection>,
    ) -> Result<CompiledRule> {
        let condition = parser::parse_condition(condition)?;
        self.compile(&Detection::new(selections, condition))
    }

    /// Compile a batch of detections in parallel.
    ///
    /// Each rule compiles independently; a malformed rule fails its own
    /// slot without affecting the others. Results keep input order.
    pub fn compile_batch(&self, detections: &[Detection]) -> Vec<Result<CompiledRule>> {
        detections
            .par_iter()
            .map(|detection| self.compile(detection))
            .collect()
    }
}
