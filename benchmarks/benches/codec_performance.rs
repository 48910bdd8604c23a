use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use pubkv_core::{
    BincodeCodec, DictCodec, DictValue, ImageCodec, ImageEncoding, JsonCodec, ValueCodec,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    sequence: u64,
    values: Vec<f64>,
}

fn create_reading() -> Reading {
    Reading {
        sensor: "sensor-1".to_string(),
        sequence: 42,
        values: (0..64).map(|i| i as f64 * 0.5).collect(),
    }
}

fn create_dict() -> DictValue {
    let mut dict = DictValue::new();
    for i in 0..32 {
        dict.insert(format!("key{}", i), json!({"value": i, "enabled": i % 2 == 0}));
    }
    dict
}

fn create_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

fn benchmark_structured_codecs(c: &mut Criterion) {
    let dict_codec = DictCodec::new();
    let json_codec = JsonCodec::<Reading>::new();
    let bincode_codec = BincodeCodec::<Reading>::new();
    let dict = create_dict();
    let reading = create_reading();

    c.bench_function("dict_encode", |b| b.iter(|| dict_codec.encode(black_box(&dict))));

    let encoded_dict = dict_codec.encode(&dict).unwrap();
    c.bench_function("dict_decode", |b| {
        b.iter(|| dict_codec.decode(black_box(&encoded_dict)).unwrap())
    });

    c.bench_function("json_encode_reading", |b| {
        b.iter(|| json_codec.encode(black_box(&reading)))
    });

    c.bench_function("bincode_encode_reading", |b| {
        b.iter(|| bincode_codec.encode(black_box(&reading)))
    });

    let json_payload = json_codec.encode(&reading).unwrap();
    let bincode_payload = bincode_codec.encode(&reading).unwrap();

    c.bench_function("json_decode_reading", |b| {
        b.iter(|| json_codec.decode(black_box(&json_payload)).unwrap())
    });

    c.bench_function("bincode_decode_reading", |b| {
        b.iter(|| bincode_codec.decode(black_box(&bincode_payload)).unwrap())
    });

    println!("\nPayload sizes:");
    println!("  dict (32 keys): {} bytes", encoded_dict.len());
    println!("  reading json:    {} bytes", json_payload.len());
    println!("  reading bincode: {} bytes", bincode_payload.len());
}

fn benchmark_image_codecs(c: &mut Criterion) {
    let png = ImageCodec::new(ImageEncoding::Png);
    let jpeg = ImageCodec::new(ImageEncoding::Jpeg { quality: 80 });
    let image = create_image(320, 240);

    c.bench_function("png_encode_320x240", |b| b.iter(|| png.encode(black_box(&image))));
    c.bench_function("jpeg_encode_320x240", |b| b.iter(|| jpeg.encode(black_box(&image))));

    let png_payload = png.encode(&image).unwrap();
    let jpeg_payload = jpeg.encode(&image).unwrap();

    c.bench_function("png_decode_320x240", |b| {
        b.iter(|| png.decode(black_box(&png_payload)).unwrap())
    });
    c.bench_function("jpeg_decode_320x240", |b| {
        b.iter(|| jpeg.decode(black_box(&jpeg_payload)).unwrap())
    });

    c.bench_function("decode_absent_garbage", |b| {
        let garbage = vec![0u8; 1024];
        b.iter(|| png.decode_absent(black_box(Some(&garbage[..]))))
    });
}

criterion_group!(benches, benchmark_structured_codecs, benchmark_image_codecs);
criterion_main!(benches);
