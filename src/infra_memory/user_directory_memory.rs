use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

pub struct MemoryUserDirectory {
    profiles: DashMap<UserId, UserProfile>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }

    pub fn register(&self, profile: UserProfile) {
        self.profiles.insert(profile.user_id, profile);
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn lookup(&self, user_id: UserId) -> anyhow::Result<Option<UserProfile>> {
        Ok(self.profiles.get(&user_id).map(|p| p.clone()))
    }
}
