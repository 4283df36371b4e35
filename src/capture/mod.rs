pub mod ethernet;
pub mod frame;
pub mod reader;
pub mod stream;

pub use ethernet::{EthernetFrame, LinkType};
pub use frame::{Frame, FrameSource, NetworkLayer, TransportLayer};
pub use reader::FileReader;
pub use stream::{PacketStream, StreamError};
