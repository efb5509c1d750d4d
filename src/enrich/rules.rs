//! Per-language enrichment rule tables.
//!
//! Cyclomatic complexity starts at 1 per function and adds 1 per node
//! whose kind is in `branch_kinds`, plus 1 per binary node (of a kind in
//! `boolean_kinds`) whose operator is in `boolean_operators`. Python
//! counts a same-operator chain once, the way its native AST folds
//! `a and b and c` into one node.
//!
//! | Language   | Branches                                        | Boolean ops      | Eval primitives   |
//! |------------|-------------------------------------------------|------------------|-------------------|
//! | Python     | if, elif, for, while, except                    | and, or          | eval, exec, compile |
//! | JavaScript | if, for, for-in, while, do, case, catch, ?:     | &&, \|\|, ??     | eval, Function    |
//! | TypeScript | same as JavaScript                              | &&, \|\|, ??     | eval, Function    |
//! | Go         | if, for, expression/type/select case            | &&, \|\|         | none              |
//! | Rust       | if, for, while, loop, match arm                 | &&, \|\|         | none              |

use crate::language::Language;

/// Rule table driving `RuleEnricher`.
#[derive(Debug)]
pub struct EnrichmentRules {
    pub language: Language,
    /// Node kinds that own a complexity score.
    pub function_kinds: &'static [&'static str],
    pub branch_kinds: &'static [&'static str],
    pub boolean_kinds: &'static [&'static str],
    pub boolean_operators: &'static [&'static str],
    /// Count a run of the same operator (`a and b and c`) once.
    pub flatten_boolean_chains: bool,
    /// String literal kinds checked for hardcoded secrets.
    pub string_kinds: &'static [&'static str],
    /// Ancestors whose text gives a literal its `name = value` context.
    pub assignment_kinds: &'static [&'static str],
    /// `(node kind, callee field)` pairs for direct calls.
    pub call_kinds: &'static [(&'static str, &'static str)],
    /// Callee names reported as `dynamic_eval`.
    pub eval_callees: &'static [&'static str],
    /// Reject trees with syntax errors instead of analyzing them.
    pub strict_syntax: bool,
}

pub static PYTHON_RULES: EnrichmentRules = EnrichmentRules {
    language: Language::Python,
    function_kinds: &["function_definition"],
    branch_kinds: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
    ],
    boolean_kinds: &["boolean_operator"],
    boolean_operators: &["and", "or"],
    flatten_boolean_chains: true,
    string_kinds: &["string"],
    assignment_kinds: &["assignment", "keyword_argument"],
    call_kinds: &[("call", "function")],
    eval_callees: &["eval", "exec", "compile"],
    strict_syntax: true,
};

const ECMASCRIPT_FUNCTIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const ECMASCRIPT_BRANCHES: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_case",
    "catch_clause",
    "ternary_expression",
];

pub static JAVASCRIPT_RULES: EnrichmentRules = EnrichmentRules {
    language: Language::JavaScript,
    function_kinds: ECMASCRIPT_FUNCTIONS,
    branch_kinds: ECMASCRIPT_BRANCHES,
    boolean_kinds: &["binary_expression"],
    boolean_operators: &["&&", "||", "??"],
    flatten_boolean_chains: false,
    string_kinds: &["string", "template_string"],
    assignment_kinds: &["variable_declarator", "assignment_expression"],
    call_kinds: &[("call_expression", "function"), ("new_expression", "constructor")],
    eval_callees: &["eval", "Function"],
    strict_syntax: false,
};

pub static TYPESCRIPT_RULES: EnrichmentRules = EnrichmentRules {
    language: Language::TypeScript,
    function_kinds: ECMASCRIPT_FUNCTIONS,
    branch_kinds: ECMASCRIPT_BRANCHES,
    boolean_kinds: &["binary_expression"],
    boolean_operators: &["&&", "||", "??"],
    flatten_boolean_chains: false,
    string_kinds: &["string", "template_string"],
    assignment_kinds: &[
        "variable_declarator",
        "assignment_expression",
        "public_field_definition",
    ],
    call_kinds: &[("call_expression", "function"), ("new_expression", "constructor")],
    eval_callees: &["eval", "Function"],
    strict_syntax: false,
};

pub static GO_RULES: EnrichmentRules = EnrichmentRules {
    language: Language::Go,
    function_kinds: &["function_declaration", "method_declaration", "func_literal"],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "expression_case",
        "type_case",
        "communication_case",
    ],
    boolean_kinds: &["binary_expression"],
    boolean_operators: &["&&", "||"],
    flatten_boolean_chains: false,
    string_kinds: &["interpreted_string_literal", "raw_string_literal"],
    assignment_kinds: &[
        "short_var_declaration",
        "assignment_statement",
        "var_spec",
        "const_spec",
    ],
    call_kinds: &[("call_expression", "function")],
    eval_callees: &[],
    strict_syntax: false,
};

pub static RUST_RULES: EnrichmentRules = EnrichmentRules {
    language: Language::Rust,
    function_kinds: &["function_item"],
    branch_kinds: &[
        "if_expression",
        "for_expression",
        "while_expression",
        "loop_expression",
        "match_arm",
    ],
    boolean_kinds: &["binary_expression"],
    boolean_operators: &["&&", "||"],
    flatten_boolean_chains: false,
    string_kinds: &["string_literal", "raw_string_literal"],
    assignment_kinds: &["let_declaration", "assignment_expression", "const_item", "static_item"],
    call_kinds: &[("call_expression", "function")],
    eval_callees: &[],
    strict_syntax: false,
};

/// The rule table for a language.
pub fn rules_for(language: Language) -> &'static EnrichmentRules {
    match language {
        Language::Python => &PYTHON_RULES,
        Language::JavaScript => &JAVASCRIPT_RULES,
        Language::TypeScript => &TYPESCRIPT_RULES,
        Language::Go => &GO_RULES,
        Language::Rust => &RUST_RULES,
    }
}
