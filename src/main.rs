use capsule::capture::{FileReader, PacketStream, StreamError};
use capsule::config::{AppConfig, OutputFormat};
use capsule::error::InitProcessError;
use capsule::packet::{Packet, SequenceCounter};
use capsule::setup_logger::setup_logger;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

fn main() -> Result<(), InitProcessError> {
    let config = AppConfig::from_env()?;

    setup_logger(config.log_level()?, config.logging.file.as_deref())
        .map_err(|e| InitProcessError::LoggerError(e.to_string()))?;

    // 引数があればそちらのファイルを読む
    let path = config.capture_file(std::env::args().nth(1).map(PathBuf::from))?;
    let reader = FileReader::open(&path)?;

    let counter = SequenceCounter::new();
    let mut stream = PacketStream::new(reader, &counter);

    let mut decoded = 0u64;
    let mut skipped = 0u64;
    let mut flows = HashSet::new();

    for result in &mut stream {
        match result {
            Ok(packet) => {
                decoded += 1;
                flows.insert(packet.flow_id().to_string());
                print_packet(&packet, config.output.format);
            }
            Err(StreamError::Decode { id, source }) if config.capture.skip_invalid => {
                skipped += 1;
                warn!("パケット#{} をスキップしました: {}", id, source);
            }
            Err(e) => {
                error!("処理を中断しました: {}", e);
                break;
            }
        }
    }

    stream.into_source().close();

    info!(
        "{} フレーム読み込み / {} パケットをデコード / {} フレームをスキップ / {} フロー",
        counter.peek(),
        decoded,
        skipped,
        flows.len()
    );

    Ok(())
}

fn print_packet(packet: &Packet, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(packet) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("パケット#{} のJSON変換に失敗しました: {}", packet.id(), e),
        },
        OutputFormat::Text => println!(
            "#{} {} {}:{} -> {}:{} proto={} fin={} flow={}",
            packet.id(),
            packet.timestamp(),
            packet.src_address(),
            packet.src_port(),
            packet.dst_address(),
            packet.dst_port(),
            packet.protocol(),
            packet.flag_fin(),
            packet.flow_id()
        ),
    }
}
