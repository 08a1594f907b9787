use reflexion_terms::{tokenize, Document, MergingType, TermPipeline, TokenKind, TokenLanguage};

#[test]
fn python_docstrings_and_names_become_terms() {
    let code = r#"
class ConnectionPool:
    """Keeps database connections alive."""

    def acquire_connection(self, timeout):
        # wait for a free slot
        return self.pool.pop()
"#;

    let terms = TermPipeline::new()
        .terms(code, TokenLanguage::Python)
        .expect("python source should tokenize");

    assert!(terms.contains(&"databas".to_string()) || terms.contains(&"database".to_string()));
    assert!(terms.contains(&"pool".to_string()));
    assert!(terms.contains(&"timeout".to_string()));
    assert!(
        !terms.iter().any(|t| t == "self" || t == "return" || t == "class"),
        "keywords leaked into terms: {terms:?}"
    );
}

#[test]
fn typescript_tokens_keep_strings_whole() {
    let code = "const greeting: string = `hello ${name}`;\n";
    let tokens = tokenize(code, TokenLanguage::TypeScript).expect("typescript should tokenize");

    let strings: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::StringLiteral)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(strings, vec!["`hello ${name}`"]);
}

#[test]
fn node_documents_share_vocabulary() {
    let pipeline = TermPipeline::new();
    let reader = pipeline
        .document("fn read_config(path: &Path) -> Config", TokenLanguage::Rust)
        .unwrap();
    let writer = pipeline
        .document("fn write_config(config: &Config)", TokenLanguage::Rust)
        .unwrap();

    let shared = Document::merge(&reader, &writer, MergingType::Intersection);
    assert!(shared.contains("config"));
    assert!(Document::overlap_coefficient(&reader, &writer) > 0.0);
}
