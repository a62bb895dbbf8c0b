use std::time::Duration;

use divan::Bencher;
use pcmdeck::decoder::{decode, encode_pcm16le};
use pcmdeck::{ContextBuilder, SampleRate, Source, TransportController};

fn main() {
    divan::main();
}

fn speech(secs: usize) -> Vec<i16> {
    (0..secs * 24_000)
        .map(|i| ((i as f32 * 0.05).sin() * 8_000.0) as i16)
        .collect()
}

#[divan::bench(args = [1, 10, 60])]
fn decode_block(bencher: Bencher, secs: usize) {
    let block = encode_pcm16le(&speech(secs));
    bencher.bench(|| decode(divan::black_box(&block)))
}

#[divan::bench(args = [24_000, 44_100, 48_000])]
fn render_second(bencher: Bencher, rate: u32) {
    let block = encode_pcm16le(&speech(1));
    let buffer = decode(&block).unwrap();
    bencher
        .with_inputs(|| {
            ContextBuilder::offline()
                .prefer_sample_rates([SampleRate::new(rate).unwrap()])
                .build()
                .unwrap()
        })
        .bench_local_values(|mut context| {
            let _unit = context
                .create_unit(&buffer)
                .unwrap()
                .start(Duration::ZERO)
                .unwrap();
            context.render(buffer.total_duration().unwrap()).unwrap()
        })
}

#[divan::bench]
fn poll_a_second(bencher: Bencher) {
    let block = encode_pcm16le(&speech(1));
    bencher
        .with_inputs(|| {
            let mut transport = TransportController::new(ContextBuilder::offline());
            transport.load(&block).unwrap();
            transport.play().unwrap();
            transport
        })
        .bench_local_values(|mut transport| {
            while transport.is_playing() {
                if let Some(context) = transport.context_mut() {
                    context.render_frames(400).unwrap();
                }
                transport.poll();
            }
            transport
        })
}
