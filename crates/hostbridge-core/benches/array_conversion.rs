use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hostbridge_core::sdk::{HostValue, ManagedArray, ManagedValue, TypeDescriptor};
use hostbridge_core::{managed_from_typed_array, typed_array_from_managed, Marshaller};

fn bench_flat_arrays(c: &mut Criterion) {
    let marshaller = Marshaller::default();
    let descriptor: TypeDescriptor = "f64[]".parse().unwrap();
    let mut group = c.benchmark_group("flat");

    for len in [64usize, 1024, 16384] {
        let value = ManagedValue::Array(ManagedArray::Float64((0..len).map(|i| i as f64).collect()));
        let host = marshaller.to_host(&descriptor, &value).unwrap();
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("to_host", len), &value, |b, value| {
            b.iter(|| marshaller.to_host(&descriptor, black_box(value)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("to_managed", len), &host, |b, host| {
            b.iter(|| marshaller.to_managed(&descriptor, black_box(host)).unwrap());
        });
    }

    group.finish();
}

fn bench_nested_arrays(c: &mut Criterion) {
    let marshaller = Marshaller::default();
    let descriptor: TypeDescriptor = "i32[][][]".parse().unwrap();
    let plane = |z: i32| {
        ManagedArray::Nested(
            (0..16)
                .map(|y| ManagedArray::Int32((0..16).map(|x| x + y * 16 + z * 256).collect()))
                .collect(),
        )
    };
    let value = ManagedValue::Array(ManagedArray::Nested((0..16).map(plane).collect()));
    let host: HostValue<'_> = marshaller.to_host(&descriptor, &value).unwrap();

    c.bench_function("nested_to_host_16x16x16", |b| {
        b.iter(|| marshaller.to_host(&descriptor, black_box(&value)).unwrap());
    });
    c.bench_function("nested_to_managed_16x16x16", |b| {
        b.iter(|| marshaller.to_managed(&descriptor, black_box(&host)).unwrap());
    });
}

fn bench_typed_copies(c: &mut Criterion) {
    let managed = ManagedArray::Int32((0..16384).collect());
    let view = typed_array_from_managed(&managed).unwrap();

    c.bench_function("typed_array_from_managed_16384", |b| {
        b.iter(|| typed_array_from_managed(black_box(&managed)).unwrap());
    });
    c.bench_function("managed_from_typed_array_16384", |b| {
        b.iter(|| managed_from_typed_array(black_box(&view)));
    });
}

criterion_group!(benches, bench_flat_arrays, bench_nested_arrays, bench_typed_copies);
criterion_main!(benches);
