//! Random C# compilation units for property-based testing.
//!
//! A [`CompilationUnit`] is a small C# file: a few `using` directives and an optional method
//! with modified parameters, each optionally preceded by a comment. [`CompilationUnit::build`]
//! renders both the source text and the native syntax tree describing it, so tests can feed the
//! pair through the normalizer and compare the result with the generated structure.

use quickcheck::{Arbitrary, Gen};
use serde_json::{Value, json};

use super::cst::{CstWriter, Trivia, identifier_name, node, qualified_name};

/// C# keywords that must not be generated as identifiers.
const RESERVED_KEYWORDS: &[&str] = &[
    "as", "do", "if", "in", "is", "for", "int", "new", "out", "ref", "try", "var", "void",
    "this", "using", "params", "class", "static", "return",
];

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: usize, max: usize) -> usize {
    min + (usize::arbitrary(g) % (max - min + 1))
}

fn gen_identifier(g: &mut Gen) -> String {
    let starters: Vec<char> = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ".chars().collect();
    let continuers: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789".chars().collect();
    let len = gen_range(g, 1, 8);
    let mut name = String::new();
    name.push(*g.choose(&starters).unwrap());
    for _ in 1..len {
        name.push(*g.choose(&continuers).unwrap());
    }
    if RESERVED_KEYWORDS.contains(&name.as_str()) {
        name.push('x');
    }
    name
}

fn gen_words(g: &mut Gen) -> String {
    let letters: Vec<char> = "abcdefghijklmnopqrstuvwxyz".chars().collect();
    let words = gen_range(g, 0, 4);
    (0..words)
        .map(|_| {
            let len = gen_range(g, 1, 6);
            (0..len).map(|_| *g.choose(&letters).unwrap()).collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A comment placed on its own line before a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comment {
    Line(String),
    Doc(String),
}

impl Comment {
    pub fn text(&self) -> &str {
        match self {
            Comment::Line(t) | Comment::Doc(t) => t,
        }
    }

    fn trivia(&self) -> Trivia {
        match self {
            Comment::Line(t) => Trivia::Line(t.clone()),
            Comment::Doc(t) => Trivia::Doc(t.clone()),
        }
    }
}

impl Arbitrary for Comment {
    fn arbitrary(g: &mut Gen) -> Self {
        let text = gen_words(g);
        if bool::arbitrary(g) {
            Comment::Line(text)
        } else {
            Comment::Doc(text)
        }
    }
}

fn gen_comment(g: &mut Gen) -> Option<Comment> {
    if u8::arbitrary(g) % 3 == 0 {
        Some(Comment::arbitrary(g))
    } else {
        None
    }
}

fn leading_of(comment: &Option<Comment>) -> Vec<Trivia> {
    match comment {
        Some(c) => vec![c.trivia(), Trivia::Newline],
        None => vec![],
    }
}

/// `using A.B.C;`
#[derive(Clone, Debug)]
pub struct UsingDirective {
    pub comment: Option<Comment>,
    pub path: Vec<String>,
}

impl Arbitrary for UsingDirective {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = gen_range(g, 1, 4);
        UsingDirective {
            comment: gen_comment(g),
            path: (0..len).map(|_| gen_identifier(g)).collect(),
        }
    }
}

/// Parameter modifiers, in the order they are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamModifier {
    This,
    Params,
    Ref,
    Out,
    In,
}

impl ParamModifier {
    pub fn keyword(self) -> &'static str {
        match self {
            ParamModifier::This => "ThisKeyword",
            ParamModifier::Params => "ParamsKeyword",
            ParamModifier::Ref => "RefKeyword",
            ParamModifier::Out => "OutKeyword",
            ParamModifier::In => "InKeyword",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            ParamModifier::This => "this",
            ParamModifier::Params => "params",
            ParamModifier::Ref => "ref",
            ParamModifier::Out => "out",
            ParamModifier::In => "in",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub modifiers: Vec<ParamModifier>,
    pub ty: String,
    pub name: String,
}

impl Arbitrary for Parameter {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALL: &[ParamModifier] = &[
            ParamModifier::This,
            ParamModifier::Params,
            ParamModifier::Ref,
            ParamModifier::Out,
            ParamModifier::In,
        ];
        let modifiers = ALL
            .iter()
            .copied()
            .filter(|_| u8::arbitrary(g) % 4 == 0)
            .collect();
        Parameter {
            modifiers,
            ty: gen_identifier(g),
            name: gen_identifier(g),
        }
    }
}

impl Parameter {
    /// Modifiers other than `this` and `params`, which wrap the parameter type.
    pub fn type_modifiers(&self) -> Vec<ParamModifier> {
        self.modifiers
            .iter()
            .copied()
            .filter(|m| !matches!(m, ParamModifier::This | ParamModifier::Params))
            .collect()
    }
}

/// `void Name(params...) { }`
#[derive(Clone, Debug)]
pub struct Method {
    pub comment: Option<Comment>,
    pub name: String,
    pub params: Vec<Parameter>,
}

impl Arbitrary for Method {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = gen_range(g, 0, 3);
        Method {
            comment: gen_comment(g),
            name: gen_identifier(g),
            params: (0..count).map(|_| Parameter::arbitrary(g)).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub method: Option<Method>,
}

impl Arbitrary for CompilationUnit {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = gen_range(g, 0, 3);
        CompilationUnit {
            usings: (0..count).map(|_| UsingDirective::arbitrary(g)).collect(),
            method: if bool::arbitrary(g) {
                Some(Method::arbitrary(g))
            } else {
                None
            },
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let mut smaller = Vec::new();
        if self.method.is_some() {
            smaller.push(CompilationUnit {
                usings: self.usings.clone(),
                method: None,
            });
        }
        for i in 0..self.usings.len() {
            let mut usings = self.usings.clone();
            usings.remove(i);
            smaller.push(CompilationUnit {
                usings,
                method: self.method.clone(),
            });
        }
        Box::new(smaller.into_iter())
    }
}

fn write_using(w: &mut CstWriter, u: &UsingDirective) -> Value {
    let keyword = w.token("UsingKeyword", "using", &leading_of(&u.comment), &[Trivia::Space]);
    let name = qualified_name(w, &u.path, &[]);
    let semicolon = w.token("SemicolonToken", ";", &[], &[Trivia::Newline]);
    node(
        "UsingDirective",
        vec![
            ("UsingKeyword", keyword),
            ("StaticKeyword", Value::Null),
            ("Alias", Value::Null),
            ("Name", name),
            ("SemicolonToken", semicolon),
        ],
    )
}

fn write_parameter(w: &mut CstWriter, p: &Parameter) -> Value {
    let modifiers: Vec<Value> = p
        .modifiers
        .iter()
        .map(|m| w.token(m.keyword(), m.text(), &[], &[Trivia::Space]))
        .collect();
    let ty = identifier_name(w, &p.ty, &[], &[Trivia::Space]);
    let name = w.token("IdentifierToken", &p.name, &[], &[]);
    node(
        "Parameter",
        vec![
            ("AttributeLists", json!([])),
            ("Modifiers", Value::Array(modifiers)),
            ("Type", ty),
            ("Identifier", name),
            ("Default", Value::Null),
        ],
    )
}

fn write_method(w: &mut CstWriter, m: &Method) -> Value {
    let void = w.token("VoidKeyword", "void", &leading_of(&m.comment), &[Trivia::Space]);
    let return_type = node("PredefinedType", vec![("Keyword", void)]);
    let name = w.token("IdentifierToken", &m.name, &[], &[]);

    let open = w.token("OpenParenToken", "(", &[], &[]);
    let mut params = Vec::new();
    for (i, p) in m.params.iter().enumerate() {
        if i > 0 {
            w.raw(", ");
        }
        params.push(write_parameter(w, p));
    }
    let close = w.token("CloseParenToken", ")", &[], &[Trivia::Space]);
    let param_list = node(
        "ParameterList",
        vec![
            ("OpenParenToken", open),
            ("Parameters", Value::Array(params)),
            ("CloseParenToken", close),
        ],
    );

    let open_brace = w.token("OpenBraceToken", "{", &[], &[Trivia::Space]);
    let close_brace = w.token("CloseBraceToken", "}", &[], &[Trivia::Newline]);
    let body = node(
        "Block",
        vec![
            ("OpenBraceToken", open_brace),
            ("Statements", json!([])),
            ("CloseBraceToken", close_brace),
        ],
    );

    node(
        "MethodDeclaration",
        vec![
            ("AttributeLists", json!([])),
            ("Modifiers", json!([])),
            ("ReturnType", return_type),
            ("ExplicitInterfaceSpecifier", Value::Null),
            ("Identifier", name),
            ("TypeParameterList", Value::Null),
            ("ParameterList", param_list),
            ("ConstraintClauses", json!([])),
            ("Body", body),
            ("ExpressionBody", Value::Null),
        ],
    )
}

impl CompilationUnit {
    /// Renders the unit as `(source, native tree)`.
    pub fn build(&self) -> (String, Value) {
        let mut w = CstWriter::new();
        let usings: Vec<Value> = self.usings.iter().map(|u| write_using(&mut w, u)).collect();
        let members: Vec<Value> = self.method.iter().map(|m| write_method(&mut w, m)).collect();
        let eof = w.token("EndOfFileToken", "", &[], &[]);
        let tree = node(
            "CompilationUnit",
            vec![
                ("Externs", json!([])),
                ("Usings", Value::Array(usings)),
                ("AttributeLists", json!([])),
                ("Members", Value::Array(members)),
                ("EndOfFileToken", eof),
            ],
        );
        (w.into_source(), tree)
    }

    pub fn to_code(&self) -> String {
        self.build().0
    }

    /// Every comment in source order.
    pub fn comments(&self) -> Vec<&Comment> {
        self.usings
            .iter()
            .filter_map(|u| u.comment.as_ref())
            .chain(self.method.iter().filter_map(|m| m.comment.as_ref()))
            .collect()
    }
}
