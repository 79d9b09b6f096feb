use csharp_normalizer::config::NormalizerConfig;
use csharp_normalizer::driver::{Driver, Mode, Request, Status};
use csharp_normalizer::ir::Node;
use serde_json::{Value, json};
use test_utils::ir::generator::{
    Comment, CompilationUnit, Method, ParamModifier, Parameter, UsingDirective,
};

fn using(comment: Option<Comment>, path: &[&str]) -> UsingDirective {
    UsingDirective {
        comment,
        path: path.iter().map(|s| s.to_string()).collect(),
    }
}

fn param(modifiers: Vec<ParamModifier>, ty: &str, name: &str) -> Parameter {
    Parameter {
        modifiers,
        ty: ty.to_string(),
        name: name.to_string(),
    }
}

fn run(mode: Mode, unit: &CompilationUnit) -> Value {
    let (source, tree) = unit.build();
    let driver = Driver::new(NormalizerConfig::default(), mode);
    let response = driver.handle(&Request {
        content: Some(source),
        ast: Node::from(tree),
    });
    assert_eq!(response.status, Status::Ok, "errors: {:?}", response.errors);
    response.ast.expect("ok response carries a tree").to_json()
}

fn collect<'a>(value: &'a Value, typ: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(fields) => {
            if fields.get("@type").and_then(Value::as_str) == Some(typ) {
                out.push(value);
            }
            fields.values().for_each(|v| collect(v, typ, out));
        }
        Value::Array(items) => items.iter().for_each(|v| collect(v, typ, out)),
        _ => {}
    }
}

fn find_all<'a>(value: &'a Value, typ: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    collect(value, typ, &mut out);
    out
}

fn has_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(fields) => fields.contains_key(key) || fields.values().any(|v| has_key(v, key)),
        Value::Array(items) => items.iter().any(|v| has_key(v, key)),
        _ => false,
    }
}

fn sample() -> CompilationUnit {
    CompilationUnit {
        usings: vec![
            using(Some(Comment::Line("hi".into())), &["System", "IO"]),
            using(None, &["Linq"]),
        ],
        method: Some(Method {
            comment: Some(Comment::Doc("runs it".into())),
            name: "Run".into(),
            params: vec![
                param(vec![ParamModifier::Params], "T", "xs"),
                param(vec![ParamModifier::This, ParamModifier::Ref], "U", "y"),
            ],
        }),
    }
}

#[test]
fn test_sample_source() {
    assert_eq!(
        sample().to_code(),
        "// hi\nusing System.IO;\nusing Linq;\n/// runs it\nvoid Run(params T xs, this ref U y) { }\n"
    );
}

#[test]
fn test_native_mode_returns_input() {
    let unit = sample();
    let (_, tree) = unit.build();
    assert_eq!(run(Mode::Native, &unit), tree);
}

#[test]
fn test_preprocessed_tree_has_canonical_positions() {
    let out = run(Mode::Preprocessed, &sample());
    assert!(find_all(&out, "WhitespaceTrivia").is_empty());
    assert!(find_all(&out, "EndOfLineTrivia").is_empty());
    for key in ["Span", "FullSpan", "SpanStart", "spanStart", "spanEnd", "IsEmpty"] {
        assert!(!has_key(&out, key), "{key} left in the preprocessed tree");
    }

    let usings = out["Usings"].as_array().unwrap();
    assert_eq!(
        usings[0]["@pos"],
        json!({
            "@type": "uast:Positions",
            "start": {"@type": "uast:Position", "offset": 6, "line": 2, "col": 1},
            "end": {"@type": "uast:Position", "offset": 22, "line": 2, "col": 17},
        })
    );

    let comment = &usings[0]["UsingKeyword"]["LeadingTrivia"][0];
    assert_eq!(comment["@type"], json!("SingleLineCommentTrivia"));
    assert_eq!(comment["@token"], json!("// hi"));
}

#[test]
fn test_documentation_comment_token_covers_the_marker() {
    let out = run(Mode::Preprocessed, &sample());
    let docs = find_all(&out, "SingleLineDocumentationCommentTrivia");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["@token"], json!("/// runs it"));
    assert_eq!(docs[0]["@pos"]["start"]["line"], json!(4));
}

#[test]
fn test_annotated_tree_has_roles() {
    let out = run(Mode::Annotated, &sample());
    let using = &out["Usings"][1];
    let roles: Vec<&str> = using["@role"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(roles.contains(&"Import"));
    assert!(roles.contains(&"Statement"));

    let ident = &using["Name"]["Identifier"];
    assert_eq!(ident["@token"], json!("Linq"));
    assert!(ident.get("Value").is_none());
    assert!(out["@role"].as_array().unwrap().contains(&json!("File")));
}

#[test]
fn test_semantic_imports() {
    let out = run(Mode::Semantic, &sample());
    let imports = find_all(&out, "uast:Import");
    assert_eq!(imports.len(), 2);

    let qualified = imports
        .iter()
        .find(|i| i["Path"]["@type"] == json!("uast:QualifiedIdentifier"))
        .unwrap();
    let names: Vec<&Value> = qualified["Path"]["Names"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| &n["Name"])
        .collect();
    assert_eq!(names, vec![&json!("System"), &json!("IO")]);
    assert_eq!(qualified["All"], json!(true));

    let simple = imports
        .iter()
        .find(|i| i["Path"]["@type"] == json!("uast:Identifier"))
        .unwrap();
    assert_eq!(simple["Path"]["Name"], json!("Linq"));
}

#[test]
fn test_using_comment_stays_next_to_import() {
    let out = run(Mode::Semantic, &sample());
    let group = &out["Usings"][0];
    assert_eq!(group["@type"], json!("uast:Group"));
    let nodes = group["Nodes"].as_array().unwrap();
    assert_eq!(nodes[0]["@type"], json!("uast:Comment"));
    assert_eq!(nodes[0]["Text"], json!("hi"));
    assert_eq!(nodes[0]["Prefix"], json!(" "));
    assert_eq!(nodes[1]["@type"], json!("uast:Import"));
}

#[test]
fn test_method_becomes_function_group() {
    let out = run(Mode::Semantic, &sample());
    let members = out["Members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    let group = &members[0];
    assert_eq!(group["@type"], json!("uast:FunctionGroup"));

    let nodes = group["Nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["@type"], json!("uast:Comment"));
    assert_eq!(nodes[0]["Text"], json!("runs it"));

    let alias = &nodes[1];
    assert_eq!(alias["Name"]["Name"], json!("Run"));
    let function = &alias["Node"];
    assert_eq!(function["@type"], json!("uast:Function"));
    assert_eq!(function["Body"]["@type"], json!("uast:Block"));
    assert_eq!(function["Body"]["Statements"], json!([]));
    assert_eq!(
        function["Type"]["Returns"][0]["Type"]["@type"],
        json!("PredefinedType")
    );
}

#[test]
fn test_method_parameters() {
    let out = run(Mode::Semantic, &sample());
    let args = find_all(&out, "uast:Argument");
    let xs = args.iter().find(|a| a["Name"]["Name"] == json!("xs")).unwrap();
    assert_eq!(xs["Variadic"], json!(true));
    assert_eq!(xs["Receiver"], json!(false));
    assert_eq!(xs["Type"]["Name"], json!("T"));
    assert_eq!(xs["Init"], Value::Null);

    let y = args.iter().find(|a| a["Name"]["Name"] == json!("y")).unwrap();
    assert_eq!(y["Variadic"], json!(false));
    assert_eq!(y["Receiver"], json!(true));
    assert_eq!(y["Type"]["@type"], json!("RefKeyword"));
    assert_eq!(y["Type"]["Text"], json!("ref"));
    assert_eq!(y["Type"]["Type"]["Name"], json!("U"));
}

#[test]
fn test_source_mismatch_is_an_error() {
    let (_, tree) = sample().build();
    let driver = Driver::default();
    let response = driver.handle(&Request {
        content: Some("void F();".to_string()),
        ast: Node::from(tree),
    });
    assert_eq!(response.status, Status::Error);
    assert!(response.ast.is_none());
    assert_eq!(response.errors.len(), 1);
}

#[test]
fn test_semantic_without_source() {
    let unit = CompilationUnit {
        usings: vec![using(None, &["A", "B", "C"])],
        method: None,
    };
    let (_, tree) = unit.build();
    let out = Driver::default().transform(&Node::from(tree), None).unwrap().to_json();
    let import = &out["Usings"][0];
    assert_eq!(import["@type"], json!("uast:Import"));
    assert_eq!(import["Path"]["Names"].as_array().unwrap().len(), 3);
    assert!(import["@pos"]["start"].get("line").is_none());
}
