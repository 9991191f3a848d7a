/// Harness Generator - Wraps User Code Into a Runnable Program
///
/// **Core Responsibility:**
/// Produce, per language, a self-contained program that embeds the user's
/// code, deserialises the test input, calls the entry point and prints the
/// serialised return value as its only stdout line.
///
/// **Shape per language:**
/// - Scripting (python, javascript): input literal spliced verbatim into an
///   argument tuple/array, exceptions routed to stderr with exit status 1
/// - Compiled (java, cpp): bracket literals rewritten to aggregate
///   initialisers, generated `main` wrapper, compact array serialisation
/// - Anything else (c, go): user source passed through unchanged
///
/// The fixed boilerplate depends only on (language, entry point, source),
/// so it is built once by `prepare` and reused for every test case.

mod cpp;
mod java;
mod javascript;
pub mod literal;
mod python;

use arbiter_common::Language;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Per-language wrapper contract
pub(crate) trait HarnessTemplate: fmt::Debug + Send + Sync {
    /// Code before and after the argument expression
    fn frame(&self, entry_point: &str, user_source: &str, class_based: bool) -> (String, String);

    /// Argument expression for one raw input literal
    fn render_args(&self, raw_input: &str) -> String;
}

/// Dispatch table keyed by language
fn template_for(language: Language) -> Option<&'static dyn HarnessTemplate> {
    match language {
        Language::Python => Some(&python::PythonHarness),
        Language::JavaScript => Some(&javascript::JavaScriptHarness),
        Language::Java => Some(&java::JavaHarness),
        Language::Cpp => Some(&cpp::CppHarness),
        Language::C | Language::Go => None,
    }
}

/// Whether the language has a harness at all
pub fn is_supported(language: Language) -> bool {
    template_for(language).is_some()
}

/// Does the submitted code define the canonical `Solution` type?
pub fn defines_solution_class(user_source: &str) -> bool {
    static SOLUTION_CLASS: OnceLock<Regex> = OnceLock::new();
    SOLUTION_CLASS
        .get_or_init(|| Regex::new(r"\bclass\s+Solution\b").expect("static regex is valid"))
        .is_match(user_source)
}

#[derive(Debug, Clone)]
enum HarnessKind {
    Wrapped {
        prefix: String,
        suffix: String,
        template: &'static dyn HarnessTemplate,
    },
    Passthrough {
        source: String,
    },
}

/// Prepared harness for one (language, entry point, source) triple
#[derive(Debug, Clone)]
pub struct Harness {
    language: Language,
    kind: HarnessKind,
}

impl Harness {
    /// Full program text for one test case input
    pub fn wrap(&self, raw_input: &str) -> String {
        match &self.kind {
            HarnessKind::Wrapped {
                prefix,
                suffix,
                template,
            } => {
                let args = template.render_args(raw_input);
                let mut program = String::with_capacity(prefix.len() + args.len() + suffix.len());
                program.push_str(prefix);
                program.push_str(&args);
                program.push_str(suffix);
                program
            }
            HarnessKind::Passthrough { source } => source.clone(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.kind, HarnessKind::Passthrough { .. })
    }
}

/// Build the fixed part of the harness once per submission
pub fn prepare(language: Language, entry_point: &str, user_source: &str) -> Harness {
    let kind = match template_for(language) {
        Some(template) => {
            let class_based = defines_solution_class(user_source);
            let (prefix, suffix) = template.frame(entry_point, user_source, class_based);
            HarnessKind::Wrapped {
                prefix,
                suffix,
                template,
            }
        }
        None => HarnessKind::Passthrough {
            source: user_source.to_string(),
        },
    };

    Harness { language, kind }
}

/// One-shot convenience: prepare and wrap a single input
pub fn generate(language: Language, entry_point: &str, raw_input: &str, user_source: &str) -> String {
    prepare(language, entry_point, user_source).wrap(raw_input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_class_detection() {
        assert!(defines_solution_class("class Solution:\n    pass"));
        assert!(defines_solution_class("public class  Solution {"));
        assert!(!defines_solution_class("def solve(nums):\n    return nums"));
        assert!(!defines_solution_class("class SolutionHelper {}"));
        assert!(!defines_solution_class("# no class Solutions here"));
    }

    #[test]
    fn test_unknown_harness_passes_source_through() {
        let source = "#include <stdio.h>\nint main(){return 0;}";
        let program = generate(Language::C, "solve", "[1,2]", source);
        assert_eq!(program, source);
        assert!(prepare(Language::Go, "solve", "package main").is_passthrough());
    }

    #[test]
    fn test_every_harnessed_language_embeds_source() {
        let source = "/* user code marker */";
        for language in [
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
        ] {
            let program = generate(language, "solve", "[1,2,3]", source);
            assert!(program.contains("user code marker"), "{} dropped source", language);
            assert!(program.contains("solve"), "{} dropped entry point", language);
        }
    }

    #[test]
    fn test_prepared_harness_reused_across_inputs() {
        let harness = prepare(Language::Python, "twoSum", "def twoSum(nums, target):\n    return [0, 1]");
        let first = harness.wrap("[2,7,11,15], 9");
        let second = harness.wrap("[3,2,4], 6");

        assert!(first.contains("[2,7,11,15], 9"));
        assert!(second.contains("[3,2,4], 6"));
        assert_ne!(first, second);
        assert_eq!(harness.language(), Language::Python);
    }
}
