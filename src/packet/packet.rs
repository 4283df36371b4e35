use crate::packet::flow::flow_id;
use crate::packet::ProtocolNumber;
use serde::Serialize;

// フローを構成するパケットのカプセル化
// 生成後は変更できない (フローIDも生成時に確定する)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    // 1. 識別
    id: u64,
    protocol: ProtocolNumber,

    // 2. 内容
    src_port: u16,
    dst_port: u16,
    src_address: String,
    dst_address: String,
    // TCPの終了要求 (FIN) かどうか
    flag_fin: bool,

    // 3. メタデータ
    timestamp: u64,
    flow_id: String,
}

impl Packet {
    pub fn new(
        id: u64,
        protocol: ProtocolNumber,
        src_port: u16,
        dst_port: u16,
        src_address: impl Into<String>,
        dst_address: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self::build(id, protocol, src_port, dst_port, src_address.into(), dst_address.into(), false, timestamp)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        id: u64,
        protocol: ProtocolNumber,
        src_port: u16,
        dst_port: u16,
        src_address: String,
        dst_address: String,
        flag_fin: bool,
        timestamp: u64,
    ) -> Self {
        let flow_id = flow_id(&src_address, &dst_address, src_port, dst_port, protocol);

        Self {
            id,
            protocol,
            src_port,
            dst_port,
            src_address,
            dst_address,
            flag_fin,
            timestamp,
            flow_id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn protocol(&self) -> ProtocolNumber {
        self.protocol
    }

    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn src_address(&self) -> &str {
        &self.src_address
    }

    pub fn dst_address(&self) -> &str {
        &self.dst_address
    }

    pub fn flag_fin(&self) -> bool {
        self.flag_fin
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_packet_derives_flow_id() {
        let packet = Packet::new(7, ProtocolNumber::TCP, 4444, 80, "192.168.0.20", "192.168.0.21", 1_600_000_000);

        assert_eq!(packet.id(), 7);
        assert_eq!(packet.protocol(), ProtocolNumber::TCP);
        assert_eq!(packet.src_port(), 4444);
        assert_eq!(packet.dst_port(), 80);
        assert_eq!(packet.src_address(), "192.168.0.20");
        assert_eq!(packet.dst_address(), "192.168.0.21");
        assert!(!packet.flag_fin());
        assert_eq!(packet.timestamp(), 1_600_000_000);
        assert_eq!(packet.flow_id(), "192.168.0.20-192.168.0.21-4444-80-6");
    }

    #[test]
    fn test_same_flow_different_ids() {
        let first = Packet::new(1, ProtocolNumber::UDP, 53, 5353, "10.0.0.1", "10.0.0.2", 10);
        let second = Packet::new(2, ProtocolNumber::UDP, 53, 5353, "10.0.0.1", "10.0.0.2", 5);

        assert_ne!(first, second);
        assert_eq!(first.flow_id(), second.flow_id());
    }

    #[test]
    fn test_no_validation_at_construction() {
        let packet = Packet::new(0, ProtocolNumber(132), 0, 0, "not-an-address", "", 0);
        assert_eq!(packet.flow_id(), "not-an-address--0-0-132");
    }

    #[test]
    fn test_serialize() {
        let packet = Packet::new(3, ProtocolNumber::TCP, 44644, 80, "10.1.1.2", "10.1.1.1", 42);
        let value = serde_json::to_value(&packet).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["protocol"], 6);
        assert_eq!(value["src_port"], 44644);
        assert_eq!(value["flow_id"], "10.1.1.2-10.1.1.1-44644-80-6");
    }
}
