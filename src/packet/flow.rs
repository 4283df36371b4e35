use crate::packet::ProtocolNumber;

pub const FLOW_ID_DELIMITER: char = '-';

// フローID "src-dst-srcport-dstport-protocol" を生成する
// 方向を保持するので A->B と B->A は別のIDになる
pub fn flow_id(
    src_address: &str,
    dst_address: &str,
    src_port: u16,
    dst_port: u16,
    protocol: ProtocolNumber,
) -> String {
    format!(
        "{src}{d}{dst}{d}{sport}{d}{dport}{d}{proto}",
        src = src_address,
        dst = dst_address,
        sport = src_port,
        dport = dst_port,
        proto = protocol,
        d = FLOW_ID_DELIMITER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_id_format() {
        let id = flow_id("192.168.0.20", "192.168.0.21", 4444, 80, ProtocolNumber::TCP);
        assert_eq!(id, "192.168.0.20-192.168.0.21-4444-80-6");
    }

    #[test]
    fn test_flow_id_is_deterministic() {
        let a = flow_id("10.1.1.2", "10.1.1.1", 44644, 80, ProtocolNumber::TCP);
        let b = flow_id("10.1.1.2", "10.1.1.1", 44644, 80, ProtocolNumber::TCP);
        assert_eq!(a, b);
    }

    #[test]
    fn test_flow_id_keeps_direction() {
        let forward = flow_id("192.168.0.20", "192.168.0.21", 4444, 80, ProtocolNumber::TCP);
        let reverse = flow_id("192.168.0.21", "192.168.0.20", 80, 4444, ProtocolNumber::TCP);
        assert_eq!(reverse, "192.168.0.21-192.168.0.20-80-4444-6");
        assert_ne!(forward, reverse);
    }

    #[test]
    fn test_flow_id_protocol_only_changes_last_field() {
        let tcp = flow_id("192.168.0.20", "192.168.0.21", 4444, 80, ProtocolNumber::TCP);
        let udp = flow_id("192.168.0.20", "192.168.0.21", 4444, 80, ProtocolNumber::UDP);
        assert_eq!(udp, "192.168.0.20-192.168.0.21-4444-80-17");
        assert_eq!(tcp.rsplit_once('-').unwrap().0, udp.rsplit_once('-').unwrap().0);
    }

    #[test]
    fn test_flow_id_ipv6() {
        let id = flow_id("fe80::1", "fe80::2", 53, 5353, ProtocolNumber::UDP);
        assert_eq!(id, "fe80::1-fe80::2-53-5353-17");
    }
}
