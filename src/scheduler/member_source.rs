use std::error::Error;

/// Supplies the current cluster address list. Polled once per tick; the registry adds what's new
/// and drops what's gone (never the local node).
#[async_trait::async_trait]
pub trait MemberSource: Send + Sync + 'static {
    async fn members(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;
}

/// A fixed member list.
#[derive(Clone, Debug)]
pub struct StaticMembers {
    addresses: Vec<String>,
}

impl StaticMembers {
    pub fn new(addresses: Vec<String>) -> Self {
        StaticMembers { addresses }
    }
}

#[async_trait::async_trait]
impl MemberSource for StaticMembers {
    async fn members(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        Ok(self.addresses.clone())
    }
}
