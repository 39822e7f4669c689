//! Property tests for the gateway document codec.

use gwconf_codec::{Cardinality, FieldKind, MessageSchema, Value};
use gwconf_protocol::schema::GATEWAY_CONFIG;
use gwconf_protocol::{ConfigDocument, DocumentCodec};
use proptest::prelude::*;

fn scalar_strategy(kind: FieldKind, depth: u32) -> BoxedStrategy<Value> {
    match kind {
        FieldKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        FieldKind::Int32 => any::<i32>().prop_map(Value::from).boxed(),
        FieldKind::Int64 => any::<i64>().prop_map(Value::from).boxed(),
        FieldKind::Uint32 => any::<u32>().prop_map(Value::from).boxed(),
        FieldKind::Uint64 => any::<u64>().prop_map(Value::from).boxed(),
        FieldKind::String => "[a-z][a-z0-9]{0,8}".prop_map(Value::Text).boxed(),
        FieldKind::Enum(schema) => (0..schema.variants.len())
            .prop_map(move |i| Value::from(schema.variants[i].0))
            .boxed(),
        FieldKind::Message(schema) => message_strategy(schema, depth.saturating_sub(1)),
    }
}

fn field_strategy(kind: FieldKind, cardinality: Cardinality, depth: u32) -> BoxedStrategy<Value> {
    let is_message = matches!(kind, FieldKind::Message(_));
    match cardinality {
        _ if is_message && depth == 0 => Just(Value::Null).boxed(),
        Cardinality::Repeated => {
            let max = if is_message { 2 } else { 4 };
            prop::collection::vec(scalar_strategy(kind, depth), 0..max)
                .prop_map(Value::Array)
                .boxed()
        }
        Cardinality::Optional => prop::option::of(scalar_strategy(kind, depth))
            .prop_map(|v| v.unwrap_or(Value::Null))
            .boxed(),
        Cardinality::Singular if is_message => prop::option::of(scalar_strategy(kind, depth))
            .prop_map(|v| v.unwrap_or(Value::Null))
            .boxed(),
        Cardinality::Singular => scalar_strategy(kind, depth),
    }
}

fn message_strategy(schema: &'static MessageSchema, depth: u32) -> BoxedStrategy<Value> {
    let fields: Vec<_> = schema
        .fields
        .iter()
        .map(|f| field_strategy(f.kind, f.cardinality, depth))
        .collect();

    fields
        .prop_map(move |values| {
            let mut groups_set: Vec<&str> = Vec::new();
            let pairs = schema
                .fields
                .iter()
                .zip(values)
                .map(|(field, mut value)| {
                    if let (Some(group), false) = (field.oneof, value.is_null()) {
                        if groups_set.contains(&group) {
                            value = Value::Null;
                        } else {
                            groups_set.push(group);
                        }
                    }
                    (Value::from(field.name), value)
                })
                .collect();
            Value::map(pairs)
        })
        .boxed()
}

fn document_strategy() -> impl Strategy<Value = ConfigDocument> {
    (any::<u64>(), message_strategy(&GATEWAY_CONFIG, 6)).prop_map(|(generation, payload)| {
        let pairs = payload
            .as_map()
            .unwrap_or_default()
            .iter()
            .filter(|(k, _)| k.as_text() != Some("generation"))
            .cloned()
            .collect();
        ConfigDocument::new(generation, Value::map(pairs))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decoded_documents_survive_reencoding(doc in document_strategy()) {
        let codec = DocumentCodec::gateway();

        let text = codec.encode(&doc).unwrap();
        let first = codec.decode(&text).unwrap();
        prop_assert_eq!(first.generation, doc.generation);

        let again = codec.decode(&codec.encode(&first).unwrap()).unwrap();
        prop_assert_eq!(again, first);
    }

    #[test]
    fn generation_quoted_or_bare(generation in any::<u64>()) {
        let codec = DocumentCodec::gateway();
        let quoted = codec.decode(&format!("generation: \"{generation}\"\n")).unwrap();
        let bare = codec.decode(&format!("generation: {generation}\n")).unwrap();
        prop_assert_eq!(quoted.generation, generation);
        prop_assert_eq!(quoted, bare);
    }
}

#[test]
fn full_gateway_document_roundtrips() {
    let text = r#"
generation: "1001"
device:
  driver: DPDK
  hostname: gw-1
  loglevel: DEBUG
underlay:
  vrf:
  - name: default
    interfaces:
    - name: eth0
      ipaddrs: [10.0.0.1/31]
      type: IF_TYPE_ETHERNET
      macaddr: "02:00:00:00:00:01"
      ospf:
        passive: true
        area: 0.0.0.0
        networkType: POINT_TO_POINT
    - name: vtep
      ipaddrs: [192.168.1.1/32]
      type: IF_TYPE_VTEP
    router:
      asn: "65001"
      routerId: 192.168.1.1
      neighbors:
      - address: 10.0.0.0
        remoteAsn: "65000"
        afActivate: [IPV4_UNICAST, L2VPN_EVPN]
        updateSource:
          interface: eth0
      ipv4Unicast:
        redistributeConnected: true
        networks: [192.168.1.1/32]
      l2vpnEvpn:
        advertiseAllVni: true
overlay:
  vpcs:
  - name: vpc-1
    id: aaaaa
    vni: 1001
  peerings:
  - name: vpc-1--vpc-2
    for:
    - vpc: vpc-1
      expose:
      - ips:
        - cidr: 10.1.0.0/16
        - not: 10.1.1.0/24
        as:
        - cidr: 192.168.0.0/16
"#;
    let codec = DocumentCodec::gateway();
    let doc = codec.decode(text).unwrap();
    assert_eq!(doc.generation, 1001);

    let encoded = codec.encode(&doc).unwrap();
    assert!(encoded.starts_with("generation: '1001'\n"));
    assert!(encoded.contains("afActivate:"));
    assert!(!encoded.contains("af_activate"));
    assert_eq!(codec.decode(&encoded).unwrap(), doc);
}

#[test]
fn update_source_oneof_is_exclusive() {
    let text = "underlay:\n  vrf:\n  - router:\n      neighbors:\n      - updateSource:\n          address: 10.0.0.1\n          interface: eth0\n";
    let err = DocumentCodec::gateway().decode(text).unwrap_err();
    assert!(err.is_document_error());
}
