//! Matcher throughput over a synthetic rule base.

use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};

use colloquy::config::config::MatchingConfig;
use colloquy::models::category::{Category, MergePolicy};
use colloquy::models::template::{Element, TemplateNode};
use colloquy::services::graph::Graphmaster;

fn template(text: &str) -> Element {
    let mut t = Element::new("template");
    t.children.push(TemplateNode::Text(text.to_string()));
    t
}

fn build_graph(categories: usize) -> Graphmaster {
    let config = MatchingConfig {
        merge_policy: MergePolicy::Skip,
        merge_append_separator: " ".into(),
        note_each_merge: false,
        response_timeout_ms: 1000,
    };
    let mut graph = Graphmaster::new(&config);
    for i in 0..categories {
        let pattern = format!("TOPIC {} QUESTION NUMBER {}", i % 64, i);
        let mut category = Category::new(&pattern, "*", "*", template("reply"));
        category.source = "bench".into();
        graph.add_category("bench-bot", &category);
    }
    let mut wildcard = Category::new("WHAT IS *", "*", "*", template("wildcard reply"));
    wildcard.source = "bench".into();
    graph.add_category("bench-bot", &wildcard);
    graph
}

fn bench_match(c: &mut Criterion) {
    let graph = build_graph(10_000);
    let deadline = || Instant::now() + Duration::from_secs(10);

    c.bench_function("match_literal_10k", |b| {
        b.iter(|| {
            graph
                .match_path("TOPIC 7 QUESTION NUMBER 4039", "*", "*", "bench-bot", deadline())
                .unwrap()
        })
    });

    c.bench_function("match_wildcard_10k", |b| {
        b.iter(|| {
            graph
                .match_path("WHAT IS the meaning of life", "*", "*", "bench-bot", deadline())
                .unwrap()
        })
    });

    c.bench_function("match_miss_10k", |b| {
        b.iter(|| graph.match_path("COMPLETELY UNKNOWN INPUT HERE", "*", "*", "bench-bot", deadline()))
    });
}

criterion_group!(benches, bench_match);
criterion_main!(benches);
