use crate::blockchain::Ledger;
use crate::config::Config;
use crate::crypto::NodeId;
use crate::error::ChainError;
use std::sync::Arc;
use tracing::info;

/// A running node: its configuration, its own identity and the ledger it
/// owns for the lifetime of the process.
pub struct Node {
    pub config: Config,
    pub node_id: NodeId,
    pub ledger: Ledger,
}

impl Node {
    /// Install logging, then build the node's state.
    pub fn init(config: Config) -> Result<Self, ChainError> {
        let level = config.logging.max_level()?;
        // A subscriber may already be installed (tests, embedding); keep it.
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();

        Self::build(config)
    }

    /// Generate this node's identity, forge the genesis block and register
    /// the node under its advertised address.
    ///
    /// Failing to draw an identity is fatal for the caller.
    pub fn build(config: Config) -> Result<Self, ChainError> {
        let node_id = NodeId::generate()?;
        info!("[genesis node] ID: {}", node_id);

        let ledger = Ledger::new();
        let me = ledger.register_node(config.network.advertised_address())?;
        info!(
            node_id = %me.node_id,
            address = %me.address,
            "Registered self in peer registry"
        );

        Ok(Self {
            config,
            node_id,
            ledger,
        })
    }

    #[cfg(feature = "api")]
    pub fn api_node(&self) -> crate::api::Node {
        crate::api::Node::new(self.ledger.clone(), self.node_id.clone())
            .with_mining_deadline(self.config.miner.max_duration())
    }

    #[cfg(feature = "api")]
    pub async fn start(self: Arc<Self>) -> Result<(), ChainError> {
        let bind_addr = self.config.network.bind_addr();
        info!("Starting API server on {}", bind_addr);

        let api_node = Arc::new(self.api_node());
        crate::api::run_api_server(api_node, &bind_addr).await
    }

    #[cfg(not(feature = "api"))]
    pub async fn start(self: Arc<Self>) -> Result<(), ChainError> {
        Err(ChainError::Config(
            "API feature not enabled in this build".to_string(),
        ))
    }
}
