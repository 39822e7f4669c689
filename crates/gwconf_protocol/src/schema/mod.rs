//! Concrete schema bindings for the text codec.

mod gateway;

pub use gateway::{
    BGP_AF, GATEWAY_CONFIG, IF_ROLE, IF_TYPE, LOG_LEVEL, OSPF_NETWORK_TYPE, PACKET_DRIVER,
};
