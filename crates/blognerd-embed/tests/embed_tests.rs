use blognerd_core::config::AppConfig;
use blognerd_core::types::EmbedPurpose;
use blognerd_embed::get_default_embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Hash embedder avoids loading the model
    let mut cfg = AppConfig::default().embedding;
    cfg.use_fake = true;

    let embedder = get_default_embedder(&cfg, 1024).expect("embedder");
    assert_eq!(embedder.dim(), 1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts, EmbedPurpose::Document).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }

    let q = embedder.embed_batch(&["hello world".to_string()], EmbedPurpose::Query).expect("query");
    assert_eq!(&q[0], v1, "query and document vectors agree for the hash embedder");
}
