use crate::capture::frame::FrameSource;
use crate::error::{CaptureError, PacketError};
use crate::packet::{Packet, SequenceCounter};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("フレームの読み込みに失敗しました: {0}")]
    Capture(#[from] CaptureError),

    // デコードに失敗したフレームのIDを保持する
    #[error("パケット#{id} のデコードに失敗しました: {source}")]
    Decode {
        id: u64,
        #[source]
        source: PacketError,
    },
}

// フレームソースから読み出したフレームに順番にIDを振ってデコードする
// デコードに失敗したフレームもIDを1つ消費する
pub struct PacketStream<'a, S: FrameSource> {
    source: S,
    counter: &'a SequenceCounter,
}

impl<'a, S: FrameSource> PacketStream<'a, S> {
    pub fn new(source: S, counter: &'a SequenceCounter) -> Self {
        Self { source, counter }
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'a, S: FrameSource> Iterator for PacketStream<'a, S> {
    type Item = Result<Packet, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => return Some(Err(StreamError::Capture(e))),
        };

        let id = self.counter.next();
        let result = Packet::from_frame(&frame, id).map_err(|source| {
            debug!("パケット#{} をスキップ対象としました: {}", id, source);
            StreamError::Decode { id, source }
        });

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::tests::SyntheticFrame;
    use crate::capture::{NetworkLayer, TransportLayer};
    use crate::error::CaptureResult;
    use crate::packet::ProtocolNumber;
    use pnet::packet::ip::IpNextHeaderProtocols;
    use std::collections::VecDeque;

    struct VecSource {
        frames: VecDeque<CaptureResult<SyntheticFrame>>,
    }

    impl FrameSource for VecSource {
        type Frame = SyntheticFrame;

        fn next_frame(&mut self) -> CaptureResult<Option<SyntheticFrame>> {
            self.frames.pop_front().transpose()
        }
    }

    fn tcp_frame(src_port: &str) -> SyntheticFrame {
        SyntheticFrame {
            network: Some(NetworkLayer::new("10.1.1.2".parse().unwrap(), "10.1.1.1".parse().unwrap())),
            transport: Some(TransportLayer::new(IpNextHeaderProtocols::Tcp, src_port, "80")),
            timestamp: 0,
        }
    }

    #[test]
    fn test_assigns_sequential_ids() {
        let source = VecSource {
            frames: vec![Ok(tcp_frame("44644")), Ok(tcp_frame("44645"))].into(),
        };
        let counter = SequenceCounter::new();

        let packets: Vec<Packet> = PacketStream::new(source, &counter).collect::<Result<_, _>>().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].id(), 0);
        assert_eq!(packets[1].id(), 1);
        assert_eq!(packets[1].protocol(), ProtocolNumber::TCP);
        assert_eq!(counter.peek(), 2);
    }

    #[test]
    fn test_decode_errors_consume_an_id() {
        let source = VecSource {
            frames: vec![Ok(SyntheticFrame::default()), Ok(tcp_frame("44644"))].into(),
        };
        let counter = SequenceCounter::new();
        let mut stream = PacketStream::new(source, &counter);

        match stream.next() {
            Some(Err(StreamError::Decode { id, source: PacketError::InvalidPacket })) => assert_eq!(id, 0),
            other => panic!("unexpected item: {:?}", other),
        }
        assert_eq!(stream.next().unwrap().unwrap().id(), 1);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_capture_error_is_reported() {
        let source = VecSource {
            frames: vec![Err(CaptureError::Parse("broken".to_string()))].into(),
        };
        let counter = SequenceCounter::new();
        let mut stream = PacketStream::new(source, &counter);

        assert!(matches!(stream.next(), Some(Err(StreamError::Capture(_)))));
        assert_eq!(counter.peek(), 0);
    }
}
