//! Native C# nodes to semantic UAST.
//!
//! The table is ordered: within the semantic stage the first mapping that matches a node wins,
//! so the more specific forms of a native type (empty identifiers, `__arglist` parameters) come
//! before the general ones.

use crate::ir::node::{KEY_POS, KEY_TOKEN, KEY_TYPE};
use crate::ir::op::{Mapping, OpRef};
use crate::ir::ops::{
    Obj, any, append, arr, boolean, cases, cases_obj, check, has, has_type, int, null, obj,
    string, var,
};
use crate::ir::transforms::{arr_has_keyword, arr_to_chain};
use crate::normalizer::comments::{comment_node, comment_text};
use crate::uast::{
    FIELD_NODES, SemanticKind, TYPE_IDENTIFIER, TYPE_STRING, map_semantic, uast_type,
};

const ARGLIST: &str = "__arglist";

fn not_missing() -> Obj {
    obj()
        .field("IsMissing", boolean(false))
        .field("IsStructuredTrivia", boolean(false))
}

fn empty_identifier_token() -> Mapping {
    let empty = has(obj()
        .field(KEY_TYPE, string("IdentifierToken"))
        .field("Text", string(""))
        .field("Value", string(""))
        .field("ValueText", string("")));
    Mapping::new("empty-identifier-token", check(empty, any()), null())
}

fn identifier_token() -> Mapping {
    // `Text` keeps the verbatim `@name` spelling; the name itself is in `Value`.
    map_semantic(
        "IdentifierToken",
        SemanticKind::Identifier,
        obj()
            .field("IsMissing", boolean(false))
            .field("Text", any())
            .field("Value", var("name"))
            .field("ValueText", var("name")),
        obj().field("Name", var("name")),
    )
}

fn empty_identifier_name() -> Mapping {
    let empty = has(obj()
        .field(KEY_TYPE, string("IdentifierName"))
        .field("Identifier", null()));
    Mapping::new("empty-identifier-name", check(empty, any()), null())
}

fn identifier_name() -> Mapping {
    let src = not_missing()
        .field(KEY_TYPE, string("IdentifierName"))
        .opt("namePos", KEY_POS, any())
        .field("Identifier", var("ident"))
        .field("Arity", int(0))
        .field("IsUnmanaged", any())
        .field("IsVar", any());
    Mapping::new("IdentifierName", src.into_op(), var("ident"))
}

fn arglist_keyword() -> Mapping {
    map_semantic(
        "ArgListKeyword",
        SemanticKind::Identifier,
        obj()
            .field("IsMissing", boolean(false))
            .field("Text", string(ARGLIST))
            .field("Value", string(ARGLIST))
            .field("ValueText", string(ARGLIST)),
        obj().field("Name", string(ARGLIST)),
    )
}

fn string_literal() -> Mapping {
    let token = obj()
        .field(KEY_TYPE, string("StringLiteralToken"))
        .opt("tokenPos", KEY_POS, any())
        .field("IsMissing", boolean(false))
        .field("Text", any())
        .field("Value", var("val"))
        .field("ValueText", var("val"));
    map_semantic(
        "StringLiteralExpression",
        SemanticKind::String,
        not_missing().field("Token", token.into_op()),
        obj().field("Value", var("val")),
    )
}

fn interpolated_text_token() -> Mapping {
    map_semantic(
        "InterpolatedStringTextToken",
        SemanticKind::String,
        obj()
            .field("IsMissing", boolean(false))
            .field("Text", any())
            .field("Value", var("val"))
            .field("ValueText", var("val")),
        obj().field("Value", var("val")),
    )
}

fn interpolated_text() -> Mapping {
    let text = obj()
        .field(KEY_TYPE, string(TYPE_STRING))
        .opt("textPos", KEY_POS, any())
        .field("Format", string(""))
        .field("Value", var("val"));
    map_semantic(
        "InterpolatedStringText",
        SemanticKind::String,
        not_missing().field("TextToken", text.into_op()),
        obj().field("Value", var("val")),
    )
}

fn bool_literal(native: &str, keyword: &str, value: bool) -> Mapping {
    let text = if value { "true" } else { "false" };
    let token = obj()
        .field(KEY_TYPE, string(keyword))
        .opt("tokenPos", KEY_POS, any())
        .field("Text", string(text))
        .field("Value", boolean(value))
        .field("ValueText", string(text))
        .field("IsMissing", boolean(false));
    map_semantic(
        native,
        SemanticKind::Bool,
        not_missing().field("Token", token.into_op()),
        obj().field("Value", boolean(value)),
    )
}

fn block() -> Mapping {
    map_semantic(
        "Block",
        SemanticKind::Block,
        obj()
            .field("Statements", var("stmts"))
            .field("OpenBraceToken", any())
            .field("CloseBraceToken", any()),
        obj().field("Statements", var("stmts")),
    )
}

fn comment(native: &str, start: &'static str, end: &'static str, block: bool) -> Mapping {
    map_semantic(
        native,
        SemanticKind::Comment,
        obj()
            .field(KEY_TOKEN, comment_text(start, end, "text"))
            .field("IsDirective", boolean(false)),
        comment_node(block, "text"),
    )
}

fn using_directive() -> Mapping {
    map_semantic(
        "UsingDirective",
        SemanticKind::Import,
        obj()
            .field("Name", var("path"))
            .field("SemicolonToken", any())
            .field("UsingKeyword", any()),
        obj().field("Path", var("path")).field("All", boolean(true)),
    )
}

/// `QualifiedName` is a left-leaning linked list. Children are rewritten first, so `Left` is
/// either the last identifier or an already flattened `uast:QualifiedIdentifier`.
fn qualified_name() -> Mapping {
    let src = cases_obj(
        "qualified",
        obj().field("Right", var("right")),
        vec![
            obj().field("Left", check(has_type(TYPE_IDENTIFIER), var("left"))),
            obj().field(
                "Left",
                uast_type(
                    SemanticKind::QualifiedIdentifier,
                    obj()
                        .opt("leftPos", KEY_POS, any())
                        .field("Names", var("names")),
                ),
            ),
        ],
    );
    let dst = cases_obj(
        "qualified",
        obj(),
        vec![
            obj().field("Names", arr(vec![var("left"), var("right")])),
            obj().field("Names", append(vec![var("names"), arr(vec![var("right")])])),
        ],
    );
    map_semantic("QualifiedName", SemanticKind::QualifiedIdentifier, src, dst)
}

/// `Default` is either absent (`Null`) or an `EqualsValueClause` holding the initializer.
/// The `= value` clause is unwrapped. Anything else, such as a group left by hoisting the
/// trivia of `EqualsToken`, is kept as the initializer.
fn default_clause() -> OpRef {
    let clause = obj()
        .field(KEY_TYPE, string("EqualsValueClause"))
        .field("Value", var("init"));
    cases("default", vec![null(), clause.into_op(), var("init")])
}

fn init_value() -> OpRef {
    cases("default", vec![null(), var("init"), var("init")])
}

fn identifier_named(name: Option<&str>) -> OpRef {
    let mut ident = obj().field(KEY_TYPE, string(TYPE_IDENTIFIER));
    if let Some(name) = name {
        ident = ident.field("Name", string(name));
    }
    check(has(ident), var("name"))
}

/// Old style variadic parameter: the magic `__arglist` name.
fn arglist_parameter() -> Mapping {
    map_semantic(
        "Parameter",
        SemanticKind::Argument,
        not_missing()
            .field("Identifier", identifier_named(Some(ARGLIST)))
            .field("AttributeLists", arr(vec![]))
            .field("Default", default_clause())
            .field("Modifiers", arr(vec![]))
            .field("Type", var("type")),
        obj()
            .field("Name", var("name"))
            .field("Type", var("type"))
            .field("Init", init_value())
            .field("Variadic", boolean(true))
            .field("MapVariadic", boolean(false))
            .field("Receiver", boolean(false)),
    )
}

/// `params` makes the parameter variadic and `this` marks an extension method receiver. Any
/// other modifier (`ref`, `out`, `in`) wraps the parameter type.
fn parameter() -> Mapping {
    let modifiers = arr_has_keyword(
        "ParamsKeyword",
        var("variadic"),
        arr_has_keyword("ThisKeyword", var("this"), var("mods")),
    );
    map_semantic(
        "Parameter",
        SemanticKind::Argument,
        obj()
            .field("Identifier", identifier_named(None))
            .field("AttributeLists", arr(vec![]))
            .field("Default", default_clause())
            .field("IsMissing", boolean(false))
            .field("IsStructuredTrivia", any())
            .field("Modifiers", modifiers)
            .field("Type", var("type")),
        obj()
            .field("Name", var("name"))
            .field("Type", arr_to_chain(var("mods"), var("type")))
            .field("Init", init_value())
            .field("Variadic", var("variadic"))
            .field("MapVariadic", boolean(false))
            .field("Receiver", var("this")),
    )
}

/// Methods, constructors and destructors become a function group holding one named function.
fn function_declaration(native: &str) -> Mapping {
    let params = not_missing()
        .field(KEY_TYPE, string("ParameterList"))
        .opt("paramsPos", KEY_POS, any())
        .field("OpenParenToken", any())
        .field("CloseParenToken", any())
        .field("Parameters", var("params"));
    let src = obj()
        .field("Body", var("body"))
        .field("Identifier", var("name"))
        .field("ParameterList", params.into_op())
        .opt("optReturn", "ReturnType", var("rettype"));

    let returns = arr(vec![uast_type(
        SemanticKind::Argument,
        obj().field("Type", var("rettype")),
    )]);
    let signature = uast_type(
        SemanticKind::FunctionType,
        obj()
            .field("Arguments", var("params"))
            .opt("optReturn", "Returns", returns),
    );
    let function = uast_type(
        SemanticKind::Function,
        obj().field("Body", var("body")).field("Type", signature),
    );
    let alias = uast_type(
        SemanticKind::Alias,
        obj().field("Name", var("name")).field("Node", function),
    );
    map_semantic(
        native,
        SemanticKind::FunctionGroup,
        src,
        obj().field(FIELD_NODES, arr(vec![alias])),
    )
}

/// The ordered semantic mapping table.
pub fn normalizers() -> Vec<Mapping> {
    vec![
        empty_identifier_token(),
        identifier_token(),
        empty_identifier_name(),
        identifier_name(),
        arglist_keyword(),
        string_literal(),
        interpolated_text_token(),
        interpolated_text(),
        bool_literal("TrueLiteralExpression", "TrueKeyword", true),
        bool_literal("FalseLiteralExpression", "FalseKeyword", false),
        block(),
        comment("SingleLineCommentTrivia", "//", "", false),
        comment("MultiLineCommentTrivia", "/*", "*/", true),
        comment("SingleLineDocumentationCommentTrivia", "///", "", false),
        using_directive(),
        qualified_name(),
        arglist_parameter(),
        parameter(),
        function_declaration("MethodDeclaration"),
        function_declaration("ConstructorDeclaration"),
        function_declaration("DestructorDeclaration"),
    ]
}
