//! Benchmarks for the attribute store: cold open+read+close vs warm reads.

use criterion::{criterion_group, criterion_main, Criterion};
use h5attr::{AttributeStore, StoreConfig};
use h5attr_format::file_writer::{AttrValue, FileWriter, GroupLayout};

fn setup(layout: GroupLayout) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut w = FileWriter::with_layout(layout);
    w.root()
        .set_attr("IonMode", AttrValue::String("positive".into()))
        .set_attr("NbrSamples", AttrValue::I32(4096));
    for i in 0..50 {
        w.root().create_group(&format!("group_{i:02}"));
    }
    w.root()
        .create_group("FullSpectra")
        .set_attr("SampleInterval", AttrValue::F64(2.5e-10));
    std::fs::write(dir.path().join("bench.h5"), w.finish()).unwrap();
    dir
}

fn bench_cold(c: &mut Criterion) {
    for (label, layout) in [
        ("compact", GroupLayout::Compact),
        ("symbol_table", GroupLayout::SymbolTable),
    ] {
        let dir = setup(layout);
        let store = AttributeStore::initialize(&StoreConfig::with_data_dir(dir.path())).unwrap();
        c.bench_function(&format!("cold_float_read_{label}"), |b| {
            b.iter(|| {
                let r = store.get_float_attribute("bench.h5", "/FullSpectra", "SampleInterval");
                store.close("bench.h5");
                r
            })
        });
    }
}

fn bench_warm(c: &mut Criterion) {
    let dir = setup(GroupLayout::Compact);
    let store = AttributeStore::initialize(&StoreConfig::with_data_dir(dir.path())).unwrap();
    c.bench_function("warm_string_read", |b| {
        b.iter(|| store.get_str_attribute("bench.h5", "/", "IonMode"))
    });
}

criterion_group!(benches, bench_cold, bench_warm);
criterion_main!(benches);
