//! Benchmark: scan and render a generated proto3 source with many messages,
//! services and alias chains (no filesystem writes).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proto2ros::{render_str, EmitTarget, Options};

/// `n` services, each with its own request/response pair, plus `n` standalone
/// messages referencing a three-hop alias chain.
fn generate_source(n: usize) -> String {
    let mut src = String::from("syntax = \"proto3\";\n\n");
    src.push_str("message repeated Row {\n  float32 val = 1;\n}\n");
    src.push_str("message repeated Plane {\n  repeated Row val = 1;\n}\n");
    src.push_str("message repeated Volume {\n  repeated Plane val = 1;\n}\n\n");
    for i in 0..n {
        src.push_str(&format!("service Service{i} {{\n"));
        src.push_str(&format!("  rpc Call{i}(Request{i}) returns (Response{i}); // call {i}\n"));
        src.push_str("}\n");
        src.push_str(&format!(
            "message Request{i} {{\n  string name = 1;\n  repeated int32 ids = 2;\n  optional repeated Row samples = 3;\n}}\n"
        ));
        src.push_str(&format!(
            "message Response{i} {{\n  bool ok = 1; // status\n  pkg.Status detail = 2;\n}}\n"
        ));
        src.push_str(&format!(
            "message Grid{i} {{\n  optional repeated Volume cells = 1;\n  oneof kind {{\n    string label = 2;\n    uint32 code = 3;\n  }}\n}}\n"
        ));
    }
    src
}

fn bench_scan(c: &mut Criterion) {
    let options = Options::default();
    let target = EmitTarget::new(&options, "msg", "srv");
    let source = generate_source(500);

    c.bench_function("scan_render_500_services", |b| {
        b.iter(|| {
            let artifacts = render_str(&options, black_box(&source), &target).expect("render");
            black_box(artifacts.len())
        })
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
