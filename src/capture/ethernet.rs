use crate::capture::frame::{Frame, NetworkLayer, TransportLayer};
use bytes::Bytes;
use log::trace;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::icmpv6::Icmpv6Packet;
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet as _;
use std::net::IpAddr;

// libpcapのリンクタイプ
pub const LINKTYPE_ETHERNET: i32 = 1;
pub const LINKTYPE_RAW_OPENBSD: i32 = 12;
pub const LINKTYPE_RAW: i32 = 101;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Ethernet,
    RawIp,
}

impl LinkType {
    pub fn from_linktype(value: i32) -> Option<Self> {
        match value {
            LINKTYPE_ETHERNET => Some(LinkType::Ethernet),
            LINKTYPE_RAW | LINKTYPE_RAW_OPENBSD => Some(LinkType::RawIp),
            _ => None,
        }
    }
}

// キャプチャされたフレーム
// 生成時に各層を一度だけ解析して保持する
#[derive(Debug, Clone)]
pub struct EthernetFrame {
    data: Bytes,
    timestamp: u64,
    network: Option<NetworkLayer>,
    transport: Option<TransportLayer>,
}

impl EthernetFrame {
    pub fn new(data: impl Into<Bytes>, timestamp: u64) -> Self {
        Self::with_link_type(data, LinkType::Ethernet, timestamp)
    }

    pub fn with_link_type(data: impl Into<Bytes>, link_type: LinkType, timestamp: u64) -> Self {
        let data = data.into();
        let (network, transport) = match link_type {
            LinkType::Ethernet => parse_ethernet(&data),
            LinkType::RawIp => parse_raw_ip(&data),
        };

        Self {
            data,
            timestamp,
            network,
            transport,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Frame for EthernetFrame {
    fn network_layer(&self) -> Option<&NetworkLayer> {
        self.network.as_ref()
    }

    fn transport_layer(&self) -> Option<&TransportLayer> {
        self.transport.as_ref()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

type Layers = (Option<NetworkLayer>, Option<TransportLayer>);

fn parse_ethernet(data: &[u8]) -> Layers {
    let ethernet = match EthernetPacket::new(data) {
        Some(ethernet) => ethernet,
        None => {
            trace!("イーサネットヘッダーのパースに失敗しました ({} bytes)", data.len());
            return (None, None);
        }
    };

    match ethernet.get_ethertype() {
        EtherTypes::Ipv4 => parse_ipv4(ethernet.payload()),
        EtherTypes::Ipv6 => parse_ipv6(ethernet.payload()),
        other => {
            trace!("未対応のイーサタイプです: {:?}", other);
            (None, None)
        }
    }
}

fn parse_raw_ip(data: &[u8]) -> Layers {
    match data.first().map(|b| b >> 4) {
        Some(4) => parse_ipv4(data),
        Some(6) => parse_ipv6(data),
        _ => (None, None),
    }
}

fn parse_ipv4(data: &[u8]) -> Layers {
    let ipv4 = match Ipv4Packet::new(data) {
        Some(ipv4) => ipv4,
        None => return (None, None),
    };

    let network = NetworkLayer::new(IpAddr::V4(ipv4.get_source()), IpAddr::V4(ipv4.get_destination()));
    let transport = parse_transport(ipv4.get_next_level_protocol(), ipv4.payload());

    (Some(network), transport)
}

fn parse_ipv6(data: &[u8]) -> Layers {
    let ipv6 = match Ipv6Packet::new(data) {
        Some(ipv6) => ipv6,
        None => return (None, None),
    };

    // 拡張ヘッダーは追わない
    let network = NetworkLayer::new(IpAddr::V6(ipv6.get_source()), IpAddr::V6(ipv6.get_destination()));
    let transport = parse_transport(ipv6.get_next_header(), ipv6.payload());

    (Some(network), transport)
}

fn parse_transport(protocol: IpNextHeaderProtocol, data: &[u8]) -> Option<TransportLayer> {
    match protocol {
        IpNextHeaderProtocols::Tcp => {
            let tcp = TcpPacket::new(data)?;
            let fin = tcp.get_flags() & TcpFlags::FIN != 0;
            Some(
                TransportLayer::new(protocol, tcp.get_source().to_string(), tcp.get_destination().to_string())
                    .with_fin(fin),
            )
        }
        IpNextHeaderProtocols::Udp => {
            let udp = UdpPacket::new(data)?;
            Some(TransportLayer::new(protocol, udp.get_source().to_string(), udp.get_destination().to_string()))
        }
        // ICMPはポートを持たないので "type/code" をエンドポイントとして公開する
        IpNextHeaderProtocols::Icmp => {
            let icmp = IcmpPacket::new(data)?;
            let endpoint = format!("{}/{}", icmp.get_icmp_type().0, icmp.get_icmp_code().0);
            Some(TransportLayer::new(protocol, endpoint.clone(), endpoint))
        }
        IpNextHeaderProtocols::Icmpv6 => {
            let icmpv6 = Icmpv6Packet::new(data)?;
            let endpoint = format!("{}/{}", icmpv6.get_icmpv6_type().0, icmpv6.get_icmpv6_code().0);
            Some(TransportLayer::new(protocol, endpoint.clone(), endpoint))
        }
        // SCTPとUDP-Liteは先頭4バイトが送信元/宛先ポート
        IpNextHeaderProtocols::Sctp | IpNextHeaderProtocols::UdpLite => {
            if data.len() < 4 {
                return None;
            }
            let source = u16::from_be_bytes([data[0], data[1]]);
            let destination = u16::from_be_bytes([data[2], data[3]]);
            Some(TransportLayer::new(protocol, source.to_string(), destination.to_string()))
        }
        other => {
            trace!("トランスポート層を解析できないプロトコルです: {:?}", other);
            None
        }
    }
}
