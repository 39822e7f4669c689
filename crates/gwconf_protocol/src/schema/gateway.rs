//! Schema of the gateway dataplane configuration.

use gwconf_codec::FieldKind::{Bool, Enum, Message, Uint32, Uint64};
use gwconf_codec::{EnumSchema, FieldKind, FieldSchema, MessageSchema};

const STRING: FieldKind = FieldKind::String;

/// Interface type.
pub static IF_TYPE: EnumSchema = EnumSchema {
    name: "IfType",
    variants: &[
        ("IF_TYPE_ETHERNET", 0),
        ("IF_TYPE_VLAN", 1),
        ("IF_TYPE_LOOPBACK", 2),
        ("IF_TYPE_VTEP", 3),
    ],
};

/// Interface role.
pub static IF_ROLE: EnumSchema = EnumSchema {
    name: "IfRole",
    variants: &[("IF_ROLE_FABRIC", 0), ("IF_ROLE_EXTERNAL", 1)],
};

/// Dataplane log level.
pub static LOG_LEVEL: EnumSchema = EnumSchema {
    name: "LogLevel",
    variants: &[
        ("ERROR", 0),
        ("WARNING", 1),
        ("INFO", 2),
        ("DEBUG", 3),
        ("TRACE", 4),
    ],
};

/// Packet I/O driver.
pub static PACKET_DRIVER: EnumSchema = EnumSchema {
    name: "PacketDriver",
    variants: &[("KERNEL", 0), ("DPDK", 1)],
};

/// BGP address family.
pub static BGP_AF: EnumSchema = EnumSchema {
    name: "BgpAF",
    variants: &[
        ("IPV4_UNICAST", 0),
        ("IPV6_UNICAST", 1),
        ("L2VPN_EVPN", 2),
    ],
};

/// OSPF network type.
pub static OSPF_NETWORK_TYPE: EnumSchema = EnumSchema {
    name: "OspfNetworkType",
    variants: &[
        ("BROADCAST", 0),
        ("NON_BROADCAST", 1),
        ("POINT_TO_POINT", 2),
        ("POINT_TO_MULTIPOINT", 3),
    ],
};

/// Root gateway configuration message.
pub static GATEWAY_CONFIG: MessageSchema = MessageSchema {
    name: "GatewayConfig",
    fields: &[
        FieldSchema::singular("generation", "generation", Uint64),
        FieldSchema::singular("device", "device", Message(&DEVICE)),
        FieldSchema::singular("underlay", "underlay", Message(&UNDERLAY)),
        FieldSchema::singular("overlay", "overlay", Message(&OVERLAY)),
    ],
};

static DEVICE: MessageSchema = MessageSchema {
    name: "Device",
    fields: &[
        FieldSchema::singular("driver", "driver", Enum(&PACKET_DRIVER)),
        FieldSchema::singular("hostname", "hostname", STRING),
        FieldSchema::singular("loglevel", "loglevel", Enum(&LOG_LEVEL)),
    ],
};

static UNDERLAY: MessageSchema = MessageSchema {
    name: "Underlay",
    fields: &[FieldSchema::repeated("vrf", "vrf", Message(&VRF))],
};

static VRF: MessageSchema = MessageSchema {
    name: "VRF",
    fields: &[
        FieldSchema::singular("name", "name", STRING),
        FieldSchema::repeated("interfaces", "interfaces", Message(&INTERFACE)),
        FieldSchema::singular("router", "router", Message(&ROUTER_CONFIG)),
        FieldSchema::singular("ospf", "ospf", Message(&OSPF_CONFIG)),
    ],
};

static INTERFACE: MessageSchema = MessageSchema {
    name: "Interface",
    fields: &[
        FieldSchema::singular("name", "name", STRING),
        FieldSchema::repeated("ipaddrs", "ipaddrs", STRING),
        FieldSchema::singular("type", "type", Enum(&IF_TYPE)),
        FieldSchema::singular("role", "role", Enum(&IF_ROLE)),
        FieldSchema::optional("vlan", "vlan", Uint32),
        FieldSchema::optional("macaddr", "macaddr", STRING),
        FieldSchema::optional("system_name", "systemName", STRING),
        FieldSchema::singular("ospf", "ospf", Message(&OSPF_INTERFACE)),
    ],
};

static OSPF_INTERFACE: MessageSchema = MessageSchema {
    name: "OspfInterface",
    fields: &[
        FieldSchema::singular("passive", "passive", Bool),
        FieldSchema::singular("area", "area", STRING),
        FieldSchema::optional("cost", "cost", Uint32),
        FieldSchema::optional("network_type", "networkType", Enum(&OSPF_NETWORK_TYPE)),
    ],
};

static OSPF_CONFIG: MessageSchema = MessageSchema {
    name: "OspfConfig",
    fields: &[
        FieldSchema::singular("router_id", "routerId", STRING),
        FieldSchema::optional("vrf", "vrf", STRING),
    ],
};

static ROUTER_CONFIG: MessageSchema = MessageSchema {
    name: "RouterConfig",
    fields: &[
        FieldSchema::singular("asn", "asn", STRING),
        FieldSchema::singular("router_id", "routerId", STRING),
        FieldSchema::repeated("neighbors", "neighbors", Message(&BGP_NEIGHBOR)),
        FieldSchema::singular("ipv4_unicast", "ipv4Unicast", Message(&BGP_AF_IPV4)),
        FieldSchema::singular("ipv6_unicast", "ipv6Unicast", Message(&BGP_AF_IPV6)),
        FieldSchema::singular("l2vpn_evpn", "l2vpnEvpn", Message(&BGP_AF_L2VPN_EVPN)),
        FieldSchema::repeated("route_maps", "routeMaps", Message(&ROUTE_MAP)),
    ],
};

static BGP_NEIGHBOR: MessageSchema = MessageSchema {
    name: "BgpNeighbor",
    fields: &[
        FieldSchema::singular("address", "address", STRING),
        FieldSchema::singular("remote_asn", "remoteAsn", STRING),
        FieldSchema::repeated("af_activate", "afActivate", Enum(&BGP_AF)),
        FieldSchema::singular(
            "update_source",
            "updateSource",
            Message(&BGP_NEIGHBOR_UPDATE_SOURCE),
        ),
    ],
};

static BGP_NEIGHBOR_UPDATE_SOURCE: MessageSchema = MessageSchema {
    name: "BgpNeighborUpdateSource",
    fields: &[
        FieldSchema::one_of("source", "address", "address", STRING),
        FieldSchema::one_of("source", "interface", "interface", STRING),
    ],
};

static BGP_AF_IPV4: MessageSchema = MessageSchema {
    name: "BgpAddressFamilyIPv4",
    fields: ADDRESS_FAMILY_FIELDS,
};

static BGP_AF_IPV6: MessageSchema = MessageSchema {
    name: "BgpAddressFamilyIPv6",
    fields: ADDRESS_FAMILY_FIELDS,
};

const ADDRESS_FAMILY_FIELDS: &[FieldSchema] = &[
    FieldSchema::singular("redistribute_connected", "redistributeConnected", Bool),
    FieldSchema::singular("redistribute_static", "redistributeStatic", Bool),
    FieldSchema::repeated("networks", "networks", STRING),
];

static BGP_AF_L2VPN_EVPN: MessageSchema = MessageSchema {
    name: "BgpAddressFamilyL2vpnEvpn",
    fields: &[FieldSchema::singular(
        "advertise_all_vni",
        "advertiseAllVni",
        Bool,
    )],
};

static ROUTE_MAP: MessageSchema = MessageSchema {
    name: "RouteMap",
    fields: &[
        FieldSchema::singular("name", "name", STRING),
        FieldSchema::repeated("match_prefix_lists", "matchPrefixLists", STRING),
        FieldSchema::singular("action", "action", STRING),
        FieldSchema::singular("sequence", "sequence", Uint32),
    ],
};

static OVERLAY: MessageSchema = MessageSchema {
    name: "Overlay",
    fields: &[
        FieldSchema::repeated("vpcs", "vpcs", Message(&VPC)),
        FieldSchema::repeated("peerings", "peerings", Message(&VPC_PEERING)),
    ],
};

static VPC: MessageSchema = MessageSchema {
    name: "VPC",
    fields: &[
        FieldSchema::singular("name", "name", STRING),
        FieldSchema::singular("id", "id", STRING),
        FieldSchema::singular("vni", "vni", Uint32),
        FieldSchema::repeated("interfaces", "interfaces", Message(&INTERFACE)),
    ],
};

static VPC_PEERING: MessageSchema = MessageSchema {
    name: "VpcPeering",
    fields: &[
        FieldSchema::singular("name", "name", STRING),
        FieldSchema::repeated("for", "for", Message(&PEERING_ENTRY_FOR)),
    ],
};

static PEERING_ENTRY_FOR: MessageSchema = MessageSchema {
    name: "PeeringEntryFor",
    fields: &[
        FieldSchema::singular("vpc", "vpc", STRING),
        FieldSchema::repeated("expose", "expose", Message(&EXPOSE)),
    ],
};

static EXPOSE: MessageSchema = MessageSchema {
    name: "Expose",
    fields: &[
        FieldSchema::repeated("ips", "ips", Message(&PEERING_IPS)),
        FieldSchema::repeated("as", "as", Message(&PEERING_AS)),
    ],
};

static PEERING_IPS: MessageSchema = MessageSchema {
    name: "PeeringIPs",
    fields: PEERING_RULE_FIELDS,
};

static PEERING_AS: MessageSchema = MessageSchema {
    name: "PeeringAs",
    fields: PEERING_RULE_FIELDS,
};

const PEERING_RULE_FIELDS: &[FieldSchema] = &[
    FieldSchema::one_of("rule", "cidr", "cidr", STRING),
    FieldSchema::one_of("rule", "not", "not", STRING),
];

#[cfg(test)]
mod tests {
    use super::*;
    use gwconf_codec::Cardinality;

    fn walk(schema: &'static MessageSchema, seen: &mut Vec<&'static str>) {
        if seen.contains(&schema.name) {
            return;
        }
        seen.push(schema.name);
        for (i, field) in schema.fields.iter().enumerate() {
            for other in &schema.fields[i + 1..] {
                assert!(
                    !other.matches(field.name) && !other.matches(field.json_name),
                    "{}.{} collides with {}",
                    schema.name,
                    field.name,
                    other.name
                );
            }
            if field.oneof.is_some() {
                assert_eq!(field.cardinality, Cardinality::Optional);
            }
            if let FieldKind::Message(child) = field.kind {
                walk(child, seen);
            }
        }
    }

    #[test]
    fn field_names_unique_per_message() {
        let mut seen = Vec::new();
        walk(&GATEWAY_CONFIG, &mut seen);
        assert!(seen.contains(&"Interface"));
        assert!(seen.contains(&"PeeringAs"));
    }

    #[test]
    fn enums_start_at_zero() {
        for schema in [
            &IF_TYPE,
            &IF_ROLE,
            &LOG_LEVEL,
            &PACKET_DRIVER,
            &BGP_AF,
            &OSPF_NETWORK_TYPE,
        ] {
            assert_eq!(schema.variants[0].1, 0, "{}", schema.name);
        }
    }
}
