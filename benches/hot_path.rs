use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use raycast_relay::config::{BackendConfig, DefaultsConfig};
use raycast_relay::protocol::backend::encoder::{build_backend_request, encode_backend_request};
use raycast_relay::protocol::openai_chat::ChatCompletionRequest;
use raycast_relay::routing::ProviderEntry;
use raycast_relay::stream::{aggregate_body, extract_event, DataLineParser, StreamReemitter};

const PLACEHOLDER: &str = "extraction failed";

fn sse_body(events: usize) -> Vec<u8> {
    let mut body = Vec::with_capacity(events * 32);
    for index in 0..events {
        body.extend_from_slice(format!("data: {{\"text\":\"token-{index} \"}}\n\n").as_bytes());
    }
    body.extend_from_slice(b"data: {\"text\":\"\",\"finish_reason\":\"stop\"}\n\ndata: [DONE]\n\n");
    body
}

fn backend_config() -> BackendConfig {
    BackendConfig {
        chat_url: "http://127.0.0.1:19001/api/v1/ai/chat_completions".to_string(),
        models_url: None,
        api_token: "bench-token".to_string(),
        headers: BTreeMap::new(),
        locale: "en-US".to_string(),
        source: "ai_chat".to_string(),
        default_provider: "openai".to_string(),
    }
}

fn bench_extract_event(c: &mut Criterion) {
    let strict = r#"{"text":"Hello there","finish_reason":null}"#;
    let fallback = r#"{"id":"evt_1","message":{"content":"Hello there"}}"#;
    let malformed = "not json at all";

    c.bench_function("extract_event_strict", |b| {
        b.iter(|| black_box(extract_event(black_box(strict))));
    });
    c.bench_function("extract_event_pointer_fallback", |b| {
        b.iter(|| black_box(extract_event(black_box(fallback))));
    });
    c.bench_function("extract_event_malformed", |b| {
        b.iter(|| black_box(extract_event(black_box(malformed))));
    });
}

fn bench_data_line_parser(c: &mut Criterion) {
    let body = sse_body(256);
    c.bench_function("data_line_parser_256_events_4k_reads", |b| {
        b.iter(|| {
            let mut parser = DataLineParser::new();
            let mut payloads = Vec::with_capacity(260);
            for chunk in body.chunks(4096) {
                parser.feed_into(black_box(chunk), &mut payloads);
            }
            parser.finish_into(&mut payloads);
            black_box(payloads.len())
        });
    });
}

fn bench_aggregate_body(c: &mut Criterion) {
    let small = sse_body(16);
    let large = sse_body(1024);
    c.bench_function("aggregate_body_16_events", |b| {
        b.iter(|| black_box(aggregate_body(black_box(&small), PLACEHOLDER)));
    });
    c.bench_function("aggregate_body_1024_events", |b| {
        b.iter(|| black_box(aggregate_body(black_box(&large), PLACEHOLDER)));
    });
}

fn bench_reemit(c: &mut Criterion) {
    let body = sse_body(256);
    c.bench_function("reemit_256_events_512b_reads", |b| {
        b.iter(|| {
            let mut reemitter =
                StreamReemitter::new("chatcmpl-bench".to_string(), "gpt-4o-mini".to_string());
            let mut frames = Vec::with_capacity(260);
            for chunk in body.chunks(512) {
                reemitter.feed_into(black_box(chunk), &mut frames);
            }
            reemitter.finish_into(&mut frames);
            black_box(frames.len())
        });
    });
}

fn bench_backend_request_encode(c: &mut Criterion) {
    let request: ChatCompletionRequest = serde_json::from_str(
        r#"{
            "model": "gpt-4o-mini",
            "max_tokens": 256,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant"},
                {"role": "user", "content": [{"type": "text", "text": "What is the weather in SF?"}]},
                {"role": "assistant", "content": "Sunny."},
                {"role": "user", "content": "And tomorrow?"}
            ]
        }"#,
    )
    .expect("bench request");
    let resolved = ProviderEntry::new("gpt-4o-mini", "gpt-4o-mini", "openai");
    let backend = backend_config();
    let defaults = DefaultsConfig::default();

    c.bench_function("backend_request_build_and_encode", |b| {
        b.iter(|| {
            let built = build_backend_request(
                black_box(&request),
                &resolved,
                "thread-bench".to_string(),
                &backend,
                &defaults,
            );
            black_box(encode_backend_request(&built, request.max_tokens).expect("encode"))
        });
    });
}

criterion_group!(
    benches,
    bench_extract_event,
    bench_data_line_parser,
    bench_aggregate_body,
    bench_reemit,
    bench_backend_request_encode
);
criterion_main!(benches);
