//! Normalizer configuration.
//!
//! Every table the normalizer consults (which trivia to erase, which nodes use `FullSpan`,
//! where hoisted trivia goes, the role table) is plain data. Defaults describe C# as emitted by
//! the Roslyn-based native parser; a JSON file can override any subset of the fields.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ir::transforms::TriviaRedirect;

/// Roles attached to one native node type by the annotation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub roles: Vec<String>,
    /// Field whose value becomes the node's `@token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Trivia types erased during preprocessing.
    pub erased_trivia: Vec<String>,
    /// Node types whose position comes from `FullSpan` instead of `Span`.
    pub full_span_types: Vec<String>,
    /// Node type → array field receiving hoisted trivia.
    pub trivia_fields: BTreeMap<String, String>,
    /// Comment trivia types; they get an `@token` placeholder during preprocessing.
    pub comment_types: Vec<String>,
    /// Types whose `@token` is read back from the source text when it is available.
    pub source_token_types: Vec<String>,
    /// Native node type → roles.
    pub roles: BTreeMap<String, RoleRule>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rule(roles: &[&str]) -> RoleRule {
    RoleRule {
        roles: strings(roles),
        token_field: None,
    }
}

fn token_rule(roles: &[&str]) -> RoleRule {
    RoleRule {
        roles: strings(roles),
        token_field: Some("Value".to_string()),
    }
}

static DEFAULT_ROLES: Lazy<BTreeMap<String, RoleRule>> = Lazy::new(|| {
    let plain: &[(&str, &[&str])] = &[
        ("CompilationUnit", &["File", "Module"]),
        ("Block", &["Block"]),
        ("NamespaceDeclaration", &["Block", "Scope"]),
        ("ArrayType", &["List", "Incomplete"]),
        ("CastExpression", &["Expression", "Incomplete"]),
        ("PredefinedType", &["Incomplete", "Declaration", "Variable"]),
        ("GenericName", &["Identifier", "Incomplete"]),
        ("ObjectCreationExpression", &["Type", "Instance"]),
        ("SimpleAssignmentExpression", &["Assignment", "Expression"]),
        ("NumericLiteralExpression", &["Expression", "Number", "Literal"]),
        ("CharacterLiteralExpression", &["Expression", "Character", "Literal"]),
        ("StringLiteralExpression", &["Literal", "String", "Expression"]),
        ("TrueLiteralExpression", &["Literal", "Boolean", "Expression"]),
        ("FalseLiteralExpression", &["Literal", "Boolean", "Expression"]),
        ("InvocationExpression", &["Function", "Call"]),
        ("ArgumentList", &["Function", "Call", "Argument", "List"]),
        ("Argument", &["Function", "Call", "Argument"]),
        ("SimpleMemberAccessExpression", &["Qualified"]),
        ("AmpersandAmpersandToken", &["Operator", "Relational", "And"]),
        ("BarBarToken", &["Operator", "Relational", "Or"]),
        ("EqualsEqualsToken", &["Operator", "Relational", "Equal"]),
        ("EqualsToken", &["Operator", "Equal"]),
        ("ExclamationToken", &["Operator", "Not"]),
        ("LessThanToken", &["Operator", "Relational", "LessThan"]),
        ("GreaterThanToken", &["Operator", "Relational", "GreaterThan"]),
        ("PlusToken", &["Operator", "Arithmetic", "Add"]),
        ("MinusToken", &["Operator", "Arithmetic", "Substract"]),
        ("AsteriskToken", &["Operator", "Arithmetic", "Multiply"]),
        ("SlashToken", &["Operator", "Arithmetic", "Divide"]),
        ("PercentToken", &["Operator", "Arithmetic", "Modulo"]),
        ("OpenBraceToken", &["Incomplete"]),
        ("CloseBraceToken", &["Incomplete"]),
        ("OpenParenToken", &["Incomplete"]),
        ("CloseParenToken", &["Incomplete"]),
        ("SemicolonToken", &["Incomplete"]),
        ("CommaToken", &["Incomplete"]),
        ("DotToken", &["Incomplete"]),
        ("EndOfFileToken", &["Incomplete"]),
        ("BinaryExpression_AddExpression", &["Binary", "Expression", "Arithmetic", "Add"]),
        ("BinaryExpression_SubtractExpression", &["Binary", "Expression", "Arithmetic", "Substract"]),
        ("BinaryExpression_EqualsExpression", &["Binary", "Expression", "Relational", "Equal"]),
        ("BinaryExpression_LessThanExpression", &["Binary", "Expression", "Relational", "LessThan"]),
        ("ParenthesizedExpression", &["Expression"]),
        ("LocalDeclarationStatement", &["Declaration", "Expression"]),
        ("VariableDeclaration", &["Declaration", "Variable", "Expression"]),
        ("VariableDeclarator", &["Declaration", "Variable", "Right"]),
        ("EqualsValueClause", &["Assignment", "Right"]),
        ("ExpressionStatement", &["Expression", "Statement"]),
        ("NumericLiteralToken", &["Value", "Number", "Literal"]),
        ("StringLiteralToken", &["Literal", "String"]),
        ("ClassDeclaration", &["Type", "Declaration"]),
        ("FieldDeclaration", &["Type", "Declaration", "Variable"]),
        ("MethodDeclaration", &["Type", "Function", "Declaration"]),
        ("UsingDirective", &["Import", "Statement"]),
        ("IdentifierName", &["Identifier"]),
        ("ParameterList", &["Function", "Declaration", "Argument", "List"]),
        ("Parameter", &["Function", "Declaration", "Argument"]),
        ("ReturnStatement", &["Statement", "Return"]),
        ("WhileStatement", &["While", "Statement"]),
        ("ForStatement", &["For", "Statement"]),
        ("IfStatement", &["If", "Statement"]),
    ];
    let keywords: &[(&str, &[&str])] = &[
        ("IdentifierToken", &["Identifier", "Expression"]),
        ("UsingKeyword", &["Import", "Incomplete"]),
        ("BoolKeyword", &["Boolean", "Declaration"]),
        ("IntKeyword", &["Number", "Declaration"]),
        ("LongKeyword", &["Number", "Declaration"]),
        ("DoubleKeyword", &["Number", "Declaration"]),
        ("StringKeyword", &["String", "Declaration"]),
        ("CharKeyword", &["Character", "Declaration"]),
        ("ClassKeyword", &["Type", "Declaration"]),
        ("StructKeyword", &["Type", "Declaration"]),
        ("NamespaceKeyword", &["Block"]),
        ("NewKeyword", &["Instance"]),
        ("NullKeyword", &["Null", "Literal"]),
        ("ReturnKeyword", &["Return"]),
        ("IfKeyword", &["If"]),
        ("ElseKeyword", &["Else"]),
        ("ForKeyword", &["For"]),
        ("WhileKeyword", &["While"]),
        ("BreakKeyword", &["Break"]),
        ("SwitchKeyword", &["Switch"]),
        ("CaseKeyword", &["Switch", "Case"]),
        ("DefaultKeyword", &["Default"]),
        ("GotoKeyword", &["Goto"]),
        ("PublicKeyword", &["Visibility", "World"]),
        ("PrivateKeyword", &["Visibility", "Instance"]),
        ("ProtectedKeyword", &["Visibility", "Subtype"]),
        ("StaticKeyword", &["Incomplete"]),
        ("ParamsKeyword", &["Incomplete"]),
        ("ThisKeyword", &["Incomplete"]),
        ("VoidKeyword", &["Incomplete"]),
        ("YieldKeyword", &["Return", "Incomplete"]),
        ("TrueKeyword", &["Boolean", "Literal"]),
        ("FalseKeyword", &["Boolean", "Literal"]),
    ];
    plain
        .iter()
        .map(|(t, r)| (t.to_string(), rule(r)))
        .chain(keywords.iter().map(|(t, r)| (t.to_string(), token_rule(r))))
        .collect()
});

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            erased_trivia: strings(&["WhitespaceTrivia", "EndOfLineTrivia", "SkippedTokensTrivia"]),
            full_span_types: strings(&["SingleLineDocumentationCommentTrivia"]),
            trivia_fields: [("Block", "Statements"), ("CompilationUnit", "Members")]
                .into_iter()
                .map(|(t, f)| (t.to_string(), f.to_string()))
                .collect(),
            comment_types: strings(&[
                "SingleLineCommentTrivia",
                "SingleLineDocumentationCommentTrivia",
                "MultiLineCommentTrivia",
            ]),
            source_token_types: strings(&[
                "SingleLineCommentTrivia",
                "SingleLineDocumentationCommentTrivia",
            ]),
            roles: DEFAULT_ROLES.clone(),
        }
    }
}

impl NormalizerConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: NormalizerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(
            path = %path.display(),
            roles = config.roles.len(),
            "loaded normalizer config"
        );
        Ok(config)
    }

    /// Loads `path` if given, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn trivia_redirect(&self) -> Arc<TriviaRedirect> {
        Arc::new(
            self.trivia_fields
                .iter()
                .map(|(t, f)| (t.clone(), f.clone()))
                .collect(),
        )
    }
}
