use std::fs;

use figment::Jail;
use tempfile::TempDir;

use ragchat_core::config::{AppConfig, EmbeddingProvider, HistoryPolicy};
use ragchat_core::corpus::{read_corpus, split_corpus};
use ragchat_core::types::{HistoryEntry, QueryRequest, Role};
use ragchat_core::Error;

#[test]
fn split_on_blank_runs_trims_and_numbers_from_zero() {
    let chunks = split_corpus("A\n\nB\n\n\nC");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(texts, ["A", "B", "C"]);
    assert_eq!(ids, ["0", "1", "2"]);
}

#[test]
fn split_drops_whitespace_only_paragraphs() {
    let chunks = split_corpus("\n\n   \n\nfirst line\nsecond line\n\n\t\n\n  last  \n");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "first line\nsecond line");
    assert_eq!(chunks[1].text, "last");
    assert_eq!(chunks[1].id, "1", "ids stay dense after dropping empties");
}

#[test]
fn split_empty_corpus_yields_nothing() {
    assert!(split_corpus("").is_empty());
}

#[test]
fn split_handles_crlf_paragraphs() {
    let chunks = split_corpus("Paris is in France.\r\n\r\nBerlin is in Germany.\r\n");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].text, "Berlin is in Germany.");
}

#[test]
fn read_corpus_missing_file_is_corpus_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nope.txt");
    match read_corpus(&path) {
        Err(Error::Corpus { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected corpus error, got {other:?}"),
    }
}

#[test]
fn read_corpus_returns_file_text() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("source.txt");
    fs::write(&path, "alpha\n\nbravo").unwrap();
    let text = read_corpus(&path).expect("read");
    assert_eq!(split_corpus(&text).len(), 2);
}

#[test]
fn request_without_history_defaults_to_empty() {
    let body = r#"{"query": "What is the capital of France?"}"#;
    let req: QueryRequest = serde_json::from_str(body).unwrap();
    assert_eq!(req.question, "What is the capital of France?");
    assert!(req.history.is_empty());
}

#[test]
fn request_accepts_strings_and_role_objects_in_history() {
    let req: QueryRequest = serde_json::from_str(
        r#"{"query": "q", "history": ["hi", {"role": "assistant", "content": "hello"}]}"#,
    )
    .unwrap();
    assert_eq!(req.history[0], HistoryEntry::Text("hi".to_string()));
    let expected = HistoryEntry::Turn {
        role: Role::Assistant,
        content: "hello".to_string(),
    };
    assert_eq!(req.history[1], expected);
}

#[test]
fn request_missing_query_is_rejected() {
    let res: Result<QueryRequest, _> = serde_json::from_str(r#"{"history": []}"#);
    assert!(res.is_err());
}

fn load(env: &str) -> figment::Result<AppConfig> {
    AppConfig::load_for_env(Some(env)).map_err(|e| figment::Error::from(e.to_string()))
}

#[test]
fn config_defaults_without_files() {
    Jail::expect_with(|_jail| {
        let cfg = load("dev")?;
        assert_eq!(cfg.retrieval.k, 3);
        assert_eq!(cfg.index.table, "docs");
        assert_eq!(cfg.generation.model, "gpt-4o");
        assert_eq!(cfg.generation.history, HistoryPolicy::Ignore);
        assert_eq!(cfg.embedding.provider, EmbeddingProvider::OpenAi);
        Ok(())
    });
}

#[test]
fn config_layers_env_file_then_env_vars() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [retrieval]
            k = 4

            [embedding]
            provider = "fake"
            dimension = 64
            "#,
        )?;
        jail.create_file(
            "config.test.toml",
            "[generation]\nmodel = \"gpt-4o-mini\"\nhistory = \"fold\"\n",
        )?;
        jail.set_env("APP_RETRIEVAL__K", "7");
        let cfg = load("test")?;
        assert_eq!(cfg.retrieval.k, 7, "env overrides files");
        assert_eq!(cfg.embedding.dimension, 64);
        assert_eq!(cfg.embedding.provider, EmbeddingProvider::Fake);
        assert_eq!(cfg.generation.model, "gpt-4o-mini");
        assert_eq!(cfg.generation.history, HistoryPolicy::Fold);
        Ok(())
    });
}

#[test]
fn config_rejects_zero_k() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_RETRIEVAL__K", "0");
        assert!(load("dev").is_err());
        Ok(())
    });
}

#[test]
fn config_rejects_fake_embedder_in_prod() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[embedding]\nprovider = \"fake\"\n")?;
        assert!(load("dev").is_ok());
        assert!(load("prod").is_err());
        Ok(())
    });
}

#[test]
fn api_key_falls_back_to_openai_env() {
    Jail::expect_with(|jail| {
        jail.set_env("OPENAI_API_KEY", "sk-env");
        jail.create_file("config.toml", "[generation]\napi_key = \"sk-gen\"\n")?;
        let cfg = load("dev")?;
        let generation_key = cfg.generation.resolved_api_key();
        let embedding_key = cfg.embedding.resolved_api_key();
        assert_eq!(generation_key.as_deref(), Some("sk-gen"));
        assert_eq!(embedding_key.as_deref(), Some("sk-env"));
        Ok(())
    });
}
