// キャプチャしたフレームを方向付きフローIDを持つPacketにデコードする

pub mod capture;
pub mod config;
pub mod error;
pub mod packet;
pub mod setup_logger;

pub use capture::{EthernetFrame, FileReader, Frame, FrameSource, PacketStream};
pub use error::{CaptureError, PacketError};
pub use packet::{flow_id, Packet, ProtocolNumber, SequenceCounter};
