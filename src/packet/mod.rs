pub mod decode;
pub mod flow;
pub mod packet;
pub mod protocol_number;
pub mod sequence;

pub use flow::flow_id;
pub use packet::Packet;
pub use protocol_number::ProtocolNumber;
pub use sequence::SequenceCounter;
