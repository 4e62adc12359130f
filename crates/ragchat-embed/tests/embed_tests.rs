use ragchat_core::config::EmbeddingConfig;
use ragchat_core::traits::Embedder;
use ragchat_embed::{FakeEmbedder, OpenAiEmbedder};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn fake_embeddings_are_deterministic_and_normalized() {
    let e = FakeEmbedder::new(64);
    let texts = vec!["Paris is the capital of France.".to_string()];
    let a = e.embed_batch(&texts).await.unwrap();
    let b = e.embed_batch(&texts).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a[0].len(), 64);
    let norm: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn fake_embeddings_favor_shared_words() {
    let e = FakeEmbedder::new(256);
    let q = e.embed_text("What is the capital of France?");
    let paris = e.embed_text("Paris is the capital of France.");
    let banana = e.embed_text("Bananas grow in tropical climates.");
    assert!(cosine(&q, &paris) > cosine(&q, &banana));
}

fn config_for(server: &MockServer, dim: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        base_url: server.uri(),
        dimension: dim,
        ..EmbeddingConfig::default()
    }
}

async fn serve_embeddings(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn inputs(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("text {i}")).collect()
}

#[tokio::test]
async fn openai_embeddings_are_reordered_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ],
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let e = OpenAiEmbedder::new(&config_for(&server, 2), "sk-test".to_string()).unwrap();
    let out = e.embed_batch(&inputs(2)).await.unwrap();
    assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    assert_eq!(e.embedder_id(), "openai:text-embedding-3-small:d2");
}

#[tokio::test]
async fn openai_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let e = OpenAiEmbedder::new(&config_for(&server, 2), "sk-wrong".to_string()).unwrap();
    let err = e.embed_batch(&inputs(1)).await.unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn openai_dimension_mismatch_is_an_error() {
    let server = MockServer::start().await;
    serve_embeddings(
        &server,
        json!({"data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]}),
    )
    .await;

    let e = OpenAiEmbedder::new(&config_for(&server, 2), "sk".to_string()).unwrap();
    assert!(e.embed_batch(&inputs(1)).await.is_err());
}

#[tokio::test]
async fn openai_duplicate_index_is_an_error() {
    let server = MockServer::start().await;
    serve_embeddings(
        &server,
        json!({"data": [
            {"index": 0, "embedding": [1.0, 0.0]},
            {"index": 0, "embedding": [0.0, 1.0]}
        ]}),
    )
    .await;

    let e = OpenAiEmbedder::new(&config_for(&server, 2), "sk".to_string()).unwrap();
    let err = e.embed_batch(&inputs(2)).await.unwrap_err();
    assert!(err.to_string().contains("returned twice"), "{err}");
}
