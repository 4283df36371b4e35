use crate::error::CaptureResult;
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use std::net::IpAddr;

// ネットワーク層 (IP) の送信元/宛先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkLayer {
    pub source: IpAddr,
    pub destination: IpAddr,
}

impl NetworkLayer {
    pub fn new(source: IpAddr, destination: IpAddr) -> Self {
        Self { source, destination }
    }
}

// トランスポート層のエンドポイントは文字列で保持する
// (TCP/UDPならポート番号、ICMPなら "type/code")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportLayer {
    pub protocol: IpNextHeaderProtocol,
    pub source: String,
    pub destination: String,
    pub fin: bool,
}

impl TransportLayer {
    pub fn new(protocol: IpNextHeaderProtocol, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            protocol,
            source: source.into(),
            destination: destination.into(),
            fin: false,
        }
    }

    pub fn with_fin(mut self, fin: bool) -> Self {
        self.fin = fin;
        self
    }

    pub fn is_tcp(&self) -> bool {
        self.protocol == IpNextHeaderProtocols::Tcp
    }
}

// キャプチャされたフレームの各層へのアクセス
// デコーダーはこのトレイト経由でのみフレームを参照する
pub trait Frame {
    fn network_layer(&self) -> Option<&NetworkLayer>;

    fn transport_layer(&self) -> Option<&TransportLayer>;

    // フレームソースが報告するキャプチャ時刻 (マイクロ秒)
    fn timestamp(&self) -> u64;

    fn has_network_layer(&self) -> bool {
        self.network_layer().is_some()
    }

    fn has_transport_layer(&self) -> bool {
        self.transport_layer().is_some()
    }

    fn is_tcp(&self) -> bool {
        self.transport_layer().map_or(false, TransportLayer::is_tcp)
    }
}

// フレームを順番に返すソース
// Ok(None) でストリームの終端を表す
pub trait FrameSource {
    type Frame: Frame;

    fn next_frame(&mut self) -> CaptureResult<Option<Self::Frame>>;
}
