//! Plays a file of base64 PCM, as returned by a speech synthesis service,
//! through the default output device.
//!
//! `cargo run --example play_base64 -- speech.b64`
//!
//! Without an argument a short generated tone is played. Press enter to
//! pause or resume, playback ends on its own.

use std::error::Error;
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use pcmdeck::decoder::encode_pcm16le;
use pcmdeck::{ContextBuilder, EncodedAudioBlock, FrameTimer, PlayerBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let block = match std::env::args().nth(1) {
        Some(path) => EncodedAudioBlock::from(std::fs::read_to_string(path)?.trim()),
        None => tone(),
    };

    println!("Output devices:");
    for name in pcmdeck::context::available_outputs()? {
        println!("  {name}");
    }

    let mut player = PlayerBuilder::new(ContextBuilder::device())
        .auto_play(true)
        .build(block);
    if let Some(err) = player.take_error() {
        return Err(err.into());
    }

    let (enter_tx, enter_rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in std::io::stdin().lock().lines() {
            if enter_tx.send(()).is_err() {
                break;
            }
        }
    });

    let mut timer = FrameTimer::default();
    let mut shown = -1;
    loop {
        if enter_rx.try_recv().is_ok() {
            player.toggle()?;
            println!("{}", if player.is_playing() { "playing" } else { "paused" });
        }
        if !player.is_playing() && player.progress() >= 100.0 {
            break;
        }

        timer.wait();
        if let Some(progress) = player.on_frame() {
            let tenth = (progress / 10.0) as i32;
            if tenth != shown {
                shown = tenth;
                println!("{progress:5.1}%");
            }
        }
    }

    println!("done");
    Ok(())
}

/// Two seconds of a falling tone.
fn tone() -> EncodedAudioBlock {
    let samples: Vec<i16> = (0..48_000)
        .map(|i| {
            let t = i as f32 / 24_000.0;
            let freq = 660.0 - 220.0 * t;
            ((t * freq * std::f32::consts::TAU).sin() * 6_000.0) as i16
        })
        .collect();
    encode_pcm16le(&samples)
}
