use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::{self, Settings};
use nanoid::nanoid;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Repositories of one store backend.
struct Stores {
    friendship_repo: Arc<dyn FriendshipRepo>,
    membership_repo: Arc<dyn MembershipRepo>,
    conversation_repo: Arc<dyn ConversationRepo>,
    notification_repo: Arc<dyn NotificationRepo>,
    user_directory: Arc<dyn UserDirectory>,
    pool: Option<Pool<MySql>>,
}

impl Stores {
    fn memory() -> Self {
        Self {
            friendship_repo: Arc::new(MemoryFriendshipRepo::new()),
            membership_repo: Arc::new(MemoryMembershipRepo::new()),
            conversation_repo: Arc::new(MemoryConversationRepo::new()),
            notification_repo: Arc::new(MemoryNotificationRepo::new()),
            user_directory: Arc::new(MemoryUserDirectory::new()),
            pool: None,
        }
    }

    async fn open(store: &settings::Store) -> anyhow::Result<Self> {
        match store.backend.as_str() {
            "mysql" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(store.max_connections)
                    .acquire_timeout(Duration::from_millis(store.deadline_ms))
                    .connect(&store.mysql_dsn)
                    .await?;
                Ok(Self {
                    friendship_repo: Arc::new(MySqlFriendshipRepo::new(pool.clone())),
                    membership_repo: Arc::new(MySqlMembershipRepo::new(pool.clone())),
                    conversation_repo: Arc::new(MySqlConversationRepo::new(pool.clone())),
                    notification_repo: Arc::new(MySqlNotificationRepo::new(pool.clone())),
                    user_directory: Arc::new(MySqlUserDirectory::new(pool.clone())),
                    pool: Some(pool),
                })
            }
            "memory" => Ok(Self::memory()),
            other => Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }
    }
}

async fn open_publisher(
    event: &settings::Event,
    run_id: &str,
) -> anyhow::Result<Arc<dyn EventPublisher>> {
    let publisher: Arc<dyn EventPublisher> = match event.backend.as_str() {
        "kafka" => Arc::new(KafkaPublisher::new(
            &event.kafka_bootstrap,
            &format!("rapport-pub-{}", run_id),
            Duration::from_millis(event.publish_timeout_ms)
                .min(DetachedEventGateway::MAX_PUBLISH_TIMEOUT),
        )?),
        "redis" => Arc::new(RedisPublisher::connect(&event.redis_dsn).await?),
        "log" => Arc::new(LogPublisher),
        other => return Err(anyhow::anyhow!("Unknown event backend: {}", other)),
    };
    Ok(publisher)
}

pub struct Server {
    pub friendship_service: Arc<dyn FriendshipService>,
    pub membership_service: Arc<dyn MembershipService>,
    pub notification_service: Arc<dyn NotificationService>,
    event_gateway: Arc<DetachedEventGateway>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let stores = Stores::open(&settings.store).await?;
        let publisher = open_publisher(&settings.event, &run_id).await?;

        Ok(Self::assemble(stores, publisher, settings, &run_id))
    }

    /// Wires services over the in-memory stores and the given transport.
    pub fn in_memory(publisher: Arc<dyn EventPublisher>, settings: &Settings) -> Self {
        Self::assemble(Stores::memory(), publisher, settings, "memory")
    }

    fn assemble(
        stores: Stores,
        publisher: Arc<dyn EventPublisher>,
        settings: &Settings,
        run_id: &str,
    ) -> Self {
        let event_gateway = Arc::new(DetachedEventGateway::new(
            publisher,
            &settings.event.topic,
            Duration::from_millis(settings.event.publish_timeout_ms),
        ));
        let gateway: Arc<dyn EventGateway> = event_gateway.clone();
        let deadline = StoreDeadline::from_millis(settings.store.deadline_ms);

        let friendship_service: Arc<dyn FriendshipService> = Arc::new(RealFriendshipService::new(
            stores.friendship_repo,
            gateway.clone(),
            deadline,
        ));
        let membership_service: Arc<dyn MembershipService> = Arc::new(RealMembershipService::new(
            stores.membership_repo,
            stores.conversation_repo,
            gateway.clone(),
            deadline,
        ));
        let notification_service: Arc<dyn NotificationService> =
            Arc::new(RealNotificationService::new(
                stores.notification_repo,
                friendship_service.clone(),
                membership_service.clone(),
                stores.user_directory,
                gateway,
                deadline,
            ));

        info!(
            "server [{}] started: store={}, event={}",
            run_id, settings.store.backend, settings.event.backend
        );

        Self {
            friendship_service,
            membership_service,
            notification_service,
            event_gateway,
            pool: stores.pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.event_gateway.shutdown().await;
        if let Some(pool) = &self.pool {
            pool.close().await;
        }

        info!("server shut down");
    }
}
