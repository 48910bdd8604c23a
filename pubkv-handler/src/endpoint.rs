//! Primary/secondary connection pair shared by every handler of a factory.

use pubkv_core::{PubKvError, Result, StoreClient, StoreTarget};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Write (primary) and read (secondary) connections to one physical store.
///
/// In simple mode both accessors return the same connection. In
/// high-availability mode they are the group's master and a replica.
pub struct StoreEndpoint {
    primary: Arc<dyn StoreClient>,
    secondary: Arc<dyn StoreClient>,
    sentinel_group: Option<String>,
}

impl StoreEndpoint {
    /// Endpoint over a single connection used for reads and writes
    pub fn simple(client: Arc<dyn StoreClient>) -> Self {
        Self {
            secondary: Arc::clone(&client),
            primary: client,
            sentinel_group: None,
        }
    }

    /// Build an endpoint from `target`.
    ///
    /// High-availability targets need `sentinel_name` to pick the group;
    /// without it construction fails with a configuration error. Simple
    /// targets ignore it.
    pub async fn connect(target: StoreTarget, sentinel_name: Option<&str>) -> Result<Self> {
        match target {
            StoreTarget::Simple(client) => {
                if let Some(name) = sentinel_name {
                    debug!("Ignoring sentinel name {} for a simple store target", name);
                }
                info!("Store endpoint created in simple mode");
                Ok(Self::simple(client))
            }
            StoreTarget::HighAvailability(resolver) => {
                let group = sentinel_name.filter(|name| !name.is_empty()).ok_or_else(|| {
                    PubKvError::configuration(
                        "a sentinel group name is required for high-availability targets",
                    )
                })?;

                let primary = resolver.primary_for(group).await?;
                let secondary = resolver.replica_for(group).await?;

                info!("Store endpoint created for sentinel group {}", group);
                Ok(Self {
                    primary,
                    secondary,
                    sentinel_group: Some(group.to_string()),
                })
            }
        }
    }

    /// Connection used for set, publish, delete and flush
    pub fn primary(&self) -> &Arc<dyn StoreClient> {
        &self.primary
    }

    /// Connection used for get and subscriptions
    pub fn secondary(&self) -> &Arc<dyn StoreClient> {
        &self.secondary
    }

    pub fn is_high_availability(&self) -> bool {
        self.sentinel_group.is_some()
    }

    pub fn sentinel_group(&self) -> Option<&str> {
        self.sentinel_group.as_deref()
    }

    /// Every key currently stored, as seen by the primary
    pub async fn list_topics(&self) -> Result<HashSet<String>> {
        let topics: HashSet<String> = self.primary.keys().await?.into_iter().collect();
        debug!("Listed {} topics", topics.len());
        Ok(topics)
    }

    /// Remove every key from the store.
    ///
    /// Not coordinated with concurrent handler operations.
    pub async fn flush_all(&self) -> Result<()> {
        info!("Flushing all keys");
        self.primary.flush_all().await
    }
}

impl std::fmt::Debug for StoreEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEndpoint")
            .field("sentinel_group", &self.sentinel_group)
            .finish()
    }
}
