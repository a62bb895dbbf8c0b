#![allow(dead_code)]
/// in separate folder so its not ran as integration test
use pcmdeck::decoder::encode_pcm16le;
use pcmdeck::{ContextBuilder, EncodedAudioBlock, TransportController};

/// Frames rendered per polling frame, a 60th of a second at 24 kHz.
pub const FRAME_LEN: usize = 400;

/// `secs` seconds of silence as the service would send them.
pub fn silent_block(secs: f64) -> EncodedAudioBlock {
    let samples = (secs * 24_000.0).round() as usize;
    encode_pcm16le(&vec![0; samples])
}

/// A ramp, so positions in the output can be told apart.
pub fn ramp_block(samples: usize) -> EncodedAudioBlock {
    let ramp: Vec<i16> = (0..samples).map(|i| (i % 32_768) as i16).collect();
    encode_pcm16le(&ramp)
}

/// A controller on an offline context, loaded with `block`.
pub fn ready(block: &EncodedAudioBlock) -> TransportController {
    let mut transport = TransportController::new(ContextBuilder::offline());
    transport.load(block).unwrap();
    transport
}

/// Renders one polling frame of output and delivers the frame.
pub fn step(transport: &mut TransportController) -> Option<f64> {
    transport
        .context_mut()
        .expect("a block is loaded")
        .render_frames(FRAME_LEN)
        .unwrap();
    transport.poll()
}

/// Steps until playback stops. Returns the progress after every frame.
pub fn run_to_end(transport: &mut TransportController) -> Vec<f64> {
    let mut progress = Vec::new();
    while transport.is_playing() {
        if let Some(p) = step(transport) {
            progress.push(p);
        }
        assert!(progress.len() < 100_000, "playback never ended");
    }
    progress
}
