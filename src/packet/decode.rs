use crate::capture::Frame;
use crate::error::{PacketError, PacketResult};
use crate::packet::{Packet, ProtocolNumber};
use log::debug;

impl Packet {
    // 生のフレームからパケットを生成する
    // ネットワーク層とトランスポート層の両方が必要
    pub fn from_frame<F: Frame + ?Sized>(frame: &F, id: u64) -> PacketResult<Packet> {
        let (network, transport) = match (frame.network_layer(), frame.transport_layer()) {
            (Some(network), Some(transport)) => (network, transport),
            _ => return Err(PacketError::InvalidPacket),
        };

        let src_port = parse_port(&transport.source)?;
        let dst_port = parse_port(&transport.destination)?;

        // TCP以外はすべてUDPとして扱う
        let mut protocol = ProtocolNumber::UDP;
        if frame.is_tcp() {
            protocol = ProtocolNumber::TCP;
        }

        let packet = Packet::build(
            id,
            protocol,
            src_port,
            dst_port,
            network.source.to_string(),
            network.destination.to_string(),
            protocol == ProtocolNumber::TCP && transport.fin,
            frame.timestamp(),
        );

        debug!("パケット#{} をデコードしました: {}", packet.id(), packet.flow_id());

        Ok(packet)
    }
}

fn parse_port(endpoint: &str) -> PacketResult<u16> {
    endpoint.parse::<u16>().map_err(|source| PacketError::MalformedEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })
}
