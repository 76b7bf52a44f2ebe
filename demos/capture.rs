//! Replay a raw capture file through the detector.
//!
//! Usage: `cargo run --example capture -- <capture.bin> [config.json]`

use std::env;

use tokio::fs::File;
use uart_sniffer::reader::FrameReader;
use uart_sniffer::{Detector, DetectorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: capture <capture.bin> [config.json]")?;

    let config = match args.next() {
        Some(config_path) => DetectorConfig::from_json(&tokio::fs::read_to_string(config_path).await?)?,
        None => DetectorConfig::default(),
    };

    let file = File::open(&path).await?;
    let mut reader = FrameReader::new(file, Detector::with_config(config)?);

    while let Some(frames) = reader.next_frames().await? {
        for frame in frames {
            println!("{}", frame);
        }
    }

    println!("{}", reader.detector().stats().to_json());
    Ok(())
}
