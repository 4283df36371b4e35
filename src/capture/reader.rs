use crate::capture::ethernet::{EthernetFrame, LinkType, LINKTYPE_ETHERNET};
use crate::capture::frame::FrameSource;
use crate::error::{CaptureError, CaptureResult};
use log::{debug, info, warn};
use pcap_parser::pcapng::Block;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const BUFFER_SIZE: usize = 65536;
// 1レコードがこれを超える場合は壊れたファイルとみなす
const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

const MAGIC_LEGACY_MICRO: u32 = 0xa1b2_c3d4;
const MAGIC_LEGACY_MICRO_SWAPPED: u32 = 0xd4c3_b2a1;
const MAGIC_LEGACY_NANO: u32 = 0xa1b2_3c4d;
const MAGIC_LEGACY_NANO_SWAPPED: u32 = 0x4d3c_b2a1;
const MAGIC_PCAPNG: u32 = 0x0a0d_0d0a;

const MICROS_PER_SECOND: u64 = 1_000_000;

enum ReaderInner {
    Legacy(LegacyPcapReader<BufReader<File>>),
    Ng(PcapNGReader<BufReader<File>>),
}

// PCAPNGのインターフェース (IDB) ごとの情報
#[derive(Debug, Clone, Copy)]
struct Interface {
    link_type: i32,
    snaplen: u32,
    units_per_second: u64,
    offset_seconds: i64,
}

struct RawFrame {
    data: Vec<u8>,
    // マイクロ秒
    timestamp: u64,
    link_type: i32,
}

// PCAP/PCAPNGファイルからフレームを順番に読み出す
// 複数のスレッドから同時に読み出すことはできない (&mut self)
pub struct FileReader {
    inner: ReaderInner,
    buffer_size: usize,
    link_type: i32,
    nanosecond: bool,
    interfaces: Vec<Interface>,
    frame_count: u64,
    // 終端または読み込みエラーの後は何も返さない
    finished: bool,
}

impl FileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        let magic = u32::from_le_bytes(magic);
        let buf_reader = BufReader::new(file);

        let inner = match magic {
            MAGIC_LEGACY_MICRO | MAGIC_LEGACY_MICRO_SWAPPED | MAGIC_LEGACY_NANO | MAGIC_LEGACY_NANO_SWAPPED => {
                let reader = LegacyPcapReader::new(BUFFER_SIZE, buf_reader)
                    .map_err(|e| CaptureError::Parse(format!("PCAPヘッダーの読み込みに失敗しました: {:?}", e)))?;
                ReaderInner::Legacy(reader)
            }
            MAGIC_PCAPNG => {
                let reader = PcapNGReader::new(BUFFER_SIZE, buf_reader)
                    .map_err(|e| CaptureError::Parse(format!("PCAPNGヘッダーの読み込みに失敗しました: {:?}", e)))?;
                ReaderInner::Ng(reader)
            }
            other => return Err(CaptureError::UnknownFormat(other)),
        };

        info!("キャプチャファイルを開きました: {}", path.display());

        Ok(Self {
            inner,
            buffer_size: BUFFER_SIZE,
            link_type: LINKTYPE_ETHERNET,
            nanosecond: matches!(magic, MAGIC_LEGACY_NANO | MAGIC_LEGACY_NANO_SWAPPED),
            interfaces: Vec::new(),
            frame_count: 0,
            finished: false,
        })
    }

    // 最後に読み込んだフレームのリンクタイプ
    pub fn link_type(&self) -> i32 {
        self.link_type
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // 次のフレームを取得する
    // ファイルの終端に達した場合は Ok(None)
    // 読み込みエラーは一度だけ返し、以降は Ok(None)
    pub fn next_frame(&mut self) -> CaptureResult<Option<EthernetFrame>> {
        if self.finished {
            return Ok(None);
        }

        let raw = match &mut self.inner {
            ReaderInner::Legacy(reader) => read_legacy(reader, &mut self.buffer_size, &mut self.link_type, self.nanosecond),
            ReaderInner::Ng(reader) => read_pcapng(reader, &mut self.buffer_size, &mut self.interfaces),
        };

        let raw = match raw {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.finished = true;
                debug!("キャプチャファイルの終端に達しました ({} フレーム)", self.frame_count);
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                warn!("キャプチャファイルの読み込みを中断しました ({} フレーム目以降): {}", self.frame_count + 1, e);
                return Err(e);
            }
        };

        self.link_type = raw.link_type;
        self.frame_count += 1;

        let link_type = LinkType::from_linktype(raw.link_type).ok_or(CaptureError::UnsupportedLinkType(raw.link_type))?;

        Ok(Some(EthernetFrame::with_link_type(raw.data, link_type, raw.timestamp)))
    }

    pub fn close(self) {
        debug!("キャプチャファイルを閉じます ({} フレーム読み込み済み)", self.frame_count);
    }
}

impl FrameSource for FileReader {
    type Frame = EthernetFrame;

    fn next_frame(&mut self) -> CaptureResult<Option<EthernetFrame>> {
        FileReader::next_frame(self)
    }
}

impl Iterator for FileReader {
    type Item = CaptureResult<EthernetFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

// レコードがバッファに収まらない場合は上限まで倍々に広げる
fn grow_buffer<R: PcapReaderIterator>(reader: &mut R, buffer_size: &mut usize) -> CaptureResult<()> {
    let new_size = *buffer_size * 2;
    if new_size > MAX_BUFFER_SIZE || !reader.grow(new_size) {
        return Err(CaptureError::Parse(format!(
            "レコードがバッファの上限 ({} bytes) を超えています",
            MAX_BUFFER_SIZE
        )));
    }

    debug!("読み込みバッファを拡張しました: {} -> {} bytes", buffer_size, new_size);
    *buffer_size = new_size;

    Ok(())
}

fn read_legacy(
    reader: &mut LegacyPcapReader<BufReader<File>>,
    buffer_size: &mut usize,
    link_type: &mut i32,
    nanosecond: bool,
) -> CaptureResult<Option<RawFrame>> {
    loop {
        match reader.next() {
            Ok((offset, block)) => match block {
                PcapBlockOwned::Legacy(packet) => {
                    let fraction = if nanosecond {
                        packet.ts_usec as u64 / 1_000
                    } else {
                        packet.ts_usec as u64
                    };
                    let raw = RawFrame {
                        data: packet.data.to_vec(),
                        timestamp: packet.ts_sec as u64 * MICROS_PER_SECOND + fraction,
                        link_type: *link_type,
                    };

                    reader.consume(offset);
                    return Ok(Some(raw));
                }
                PcapBlockOwned::LegacyHeader(header) => {
                    *link_type = header.network.0;
                    reader.consume(offset);
                }
                _ => reader.consume(offset),
            },
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| CaptureError::Parse(format!("PCAPの読み込みに失敗しました: {:?}", e)))?;
            }
            Err(PcapError::BufferTooSmall) => grow_buffer(reader, buffer_size)?,
            Err(e) => return Err(CaptureError::Parse(format!("PCAPの解析に失敗しました: {:?}", e))),
        }
    }
}

fn read_pcapng(
    reader: &mut PcapNGReader<BufReader<File>>,
    buffer_size: &mut usize,
    interfaces: &mut Vec<Interface>,
) -> CaptureResult<Option<RawFrame>> {
    loop {
        match reader.next() {
            Ok((offset, block)) => match block {
                // セクションが変わるとインターフェースIDも振り直される
                PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                    interfaces.clear();
                    reader.consume(offset);
                }
                PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                    interfaces.push(Interface {
                        link_type: idb.linktype.0,
                        snaplen: idb.snaplen,
                        units_per_second: units_per_second(idb.if_tsresol),
                        offset_seconds: idb.if_tsoffset,
                    });
                    reader.consume(offset);
                }
                PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                    let interface = match interfaces.get(epb.if_id as usize) {
                        Some(interface) => *interface,
                        None => {
                            return Err(CaptureError::Parse(format!(
                                "未定義のインターフェースIDです: {}",
                                epb.if_id
                            )))
                        }
                    };
                    let caplen = (epb.caplen as usize).min(epb.data.len());
                    let raw = RawFrame {
                        data: epb.data[..caplen].to_vec(),
                        timestamp: pcapng_timestamp(epb.ts_high, epb.ts_low, &interface),
                        link_type: interface.link_type,
                    };

                    reader.consume(offset);
                    return Ok(Some(raw));
                }
                // SPBはインターフェース0のみ、タイムスタンプなし
                PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                    let interface = match interfaces.first() {
                        Some(interface) => *interface,
                        None => return Err(CaptureError::Parse("IDBより前にSPBがあります".to_string())),
                    };
                    let mut len = (spb.origlen as usize).min(spb.data.len());
                    if interface.snaplen > 0 {
                        len = len.min(interface.snaplen as usize);
                    }
                    let raw = RawFrame {
                        data: spb.data[..len].to_vec(),
                        timestamp: 0,
                        link_type: interface.link_type,
                    };

                    reader.consume(offset);
                    return Ok(Some(raw));
                }
                _ => reader.consume(offset),
            },
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| CaptureError::Parse(format!("PCAPNGの読み込みに失敗しました: {:?}", e)))?;
            }
            Err(PcapError::BufferTooSmall) => grow_buffer(reader, buffer_size)?,
            Err(e) => return Err(CaptureError::Parse(format!("PCAPNGの解析に失敗しました: {:?}", e))),
        }
    }
}

// if_tsresol: 最上位ビットが立っていれば2のべき乗、そうでなければ10のべき乗
fn units_per_second(tsresol: u8) -> u64 {
    let exponent = (tsresol & 0x7f) as u32;
    let units = if tsresol & 0x80 != 0 {
        2u64.checked_pow(exponent)
    } else {
        10u64.checked_pow(exponent)
    };

    units.filter(|units| *units > 0).unwrap_or(MICROS_PER_SECOND)
}

fn pcapng_timestamp(ts_high: u32, ts_low: u32, interface: &Interface) -> u64 {
    let ticks = ((ts_high as u64) << 32) | ts_low as u64;
    let micros = ticks as u128 * MICROS_PER_SECOND as u128 / interface.units_per_second as u128;
    let micros = micros as i128 + interface.offset_seconds as i128 * MICROS_PER_SECOND as i128;

    micros.clamp(0, u64::MAX as i128) as u64
}
