use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dxcontainer::container;
use dxcontainer::fourcc::PART_PROGRAM;
use dxcontainer::{ContainerBuilder, Part, DIGEST_LEN, PART_DEBUG_NAME, PART_PRIVATE_DATA, PART_STATISTICS};

fn sample_container() -> Vec<u8> {
    let parts = vec![
        Part::new(PART_PROGRAM, vec![0x5Au8; 256 * 1024]),
        Part::new(PART_STATISTICS, vec![1u8; 4096]),
        Part::new(PART_PRIVATE_DATA, vec![2u8; 1024]),
    ];
    let layout = container::layout(&parts);
    container::write_to_vec(&parts, &layout, &[0; DIGEST_LEN]).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let bytes = sample_container();
    c.bench_function("parse_256k", |b| b.iter(|| container::parse(black_box(&bytes)).unwrap()));
}

fn bench_edit_and_serialize(c: &mut Criterion) {
    let bytes = sample_container();
    c.bench_function("load_add_serialize_256k", |b| {
        b.iter(|| {
            let mut builder = ContainerBuilder::from_bytes(black_box(&bytes)).unwrap();
            builder.add(PART_DEBUG_NAME, b"shader.pdb".to_vec()).unwrap();
            builder.serialize().unwrap()
        })
    });
}

criterion_group!(benches, bench_parse, bench_edit_and_serialize);
criterion_main!(benches);
