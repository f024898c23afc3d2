//! Peer registry entries

use crate::crypto::NodeId;
use serde::{Deserialize, Serialize};

/// A known participant in the network.
///
/// The identifier is assigned by the registry at registration time and is
/// never taken from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub node_id: NodeId,
    #[serde(rename = "ip")]
    pub address: String,
}

impl Peer {
    pub fn new(node_id: NodeId, address: impl Into<String>) -> Self {
        Peer {
            node_id,
            address: address.into(),
        }
    }
}
