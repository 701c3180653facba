use crate::application_impl::StoreDeadline;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{ConversationRepo, MembershipClaim, MembershipRepo, PrivateConversationClaim};
use std::collections::HashSet;
use std::sync::Arc;

pub struct RealMembershipService {
    membership_repo: Arc<dyn MembershipRepo>,
    conversation_repo: Arc<dyn ConversationRepo>,
    event_gateway: Arc<dyn EventGateway>,
    deadline: StoreDeadline,
}

impl RealMembershipService {
    pub fn new(
        membership_repo: Arc<dyn MembershipRepo>,
        conversation_repo: Arc<dyn ConversationRepo>,
        event_gateway: Arc<dyn EventGateway>,
        deadline: StoreDeadline,
    ) -> Self {
        Self {
            membership_repo,
            conversation_repo,
            event_gateway,
            deadline,
        }
    }

    /// Current member ids, used as event receivers. Falls back to `extra`
    /// alone when the listing fails, since the state change already happened.
    async fn audience(&self, conversation_id: ConversationId, extra: &[UserId]) -> Vec<UserId> {
        let mut receivers = match self
            .deadline
            .run(self.membership_repo.list_by_conversation(conversation_id))
            .await
        {
            Ok(members) => members.into_iter().map(|m| m.user_id).collect(),
            Err(e) => {
                tracing::warn!(%conversation_id, error = %e, "list event receivers");
                Vec::new()
            }
        };
        for user_id in extra {
            if !receivers.contains(user_id) {
                receivers.push(*user_id);
            }
        }
        receivers
    }

    async fn seat(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<ConversationMember, RelationError> {
        Ok(self.seat_claim(conversation_id, user_id, role).await?.into_member())
    }

    async fn seat_claim(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<MembershipClaim, RelationError> {
        let member = ConversationMember::new(conversation_id, user_id, role);
        self.deadline
            .run(self.membership_repo.insert_if_absent(&member))
            .await
    }

    /// The conversation must exist and `acting_user` must be one of its members.
    async fn participant_view(
        &self,
        conversation_id: ConversationId,
        acting_user: UserId,
    ) -> Result<Conversation, RelationError> {
        let conversation = self
            .deadline
            .run(self.conversation_repo.get(conversation_id))
            .await?
            .ok_or_else(|| {
                RelationError::NotFound(format!("conversation {conversation_id}"))
            })?;

        let member = self
            .deadline
            .run(self.membership_repo.get(conversation_id, acting_user))
            .await?;
        if member.is_none() {
            return Err(RelationError::Forbidden(format!(
                "user {acting_user} is not a member of conversation {conversation_id}"
            )));
        }
        Ok(conversation)
    }

    async fn find_private(&self, a: UserId, b: UserId) -> Result<Option<Conversation>, RelationError> {
        let (of_a, of_b) = tokio::try_join!(
            self.deadline.run(self.membership_repo.list_conversation_ids(a)),
            self.deadline.run(self.membership_repo.list_conversation_ids(b)),
        )?;

        let of_b: HashSet<ConversationId> = of_b.into_iter().collect();
        let shared: Vec<ConversationId> = of_a.into_iter().filter(|c| of_b.contains(c)).collect();
        if shared.is_empty() {
            return Ok(None);
        }

        let candidates = self
            .deadline
            .run(self.conversation_repo.get_many(&shared))
            .await?;
        Ok(candidates
            .into_iter()
            .find(|c| c.kind == ConversationKind::Private))
    }
}

#[async_trait::async_trait]
impl MembershipService for RealMembershipService {
    async fn add_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<ConversationMember, RelationError> {
        let proposed = ConversationMember::new(conversation_id, user_id, role);
        let claim = self
            .deadline
            .run(self.membership_repo.insert_if_absent(&proposed))
            .await?;

        if !claim.is_inserted() {
            return Ok(claim.into_member());
        }

        let member = claim.into_member();
        tracing::info!("member {} joined conversation {}", user_id, conversation_id);
        let receivers = self.audience(conversation_id, &[user_id]).await;
        self.event_gateway.emit(
            Channel::ConversationMemberAdded,
            receivers,
            &MemberChanged {
                member: member.clone(),
            },
        );
        Ok(member)
    }

    async fn add_members(
        &self,
        conversation_id: ConversationId,
        user_ids: &[UserId],
        role: MemberRole,
    ) -> Result<Vec<ConversationMember>, RelationError> {
        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(user_ids.len());
        let mut inserted = Vec::new();

        for user_id in user_ids.iter().filter(|id| seen.insert(**id)) {
            let proposed = ConversationMember::new(conversation_id, *user_id, role);
            let claim = self
                .deadline
                .run(self.membership_repo.insert_if_absent(&proposed))
                .await?;
            if claim.is_inserted() {
                inserted.push(claim.into_member());
            } else {
                members.push(claim.into_member());
            }
        }

        if !inserted.is_empty() {
            tracing::info!(
                "{} members joined conversation {}",
                inserted.len(),
                conversation_id
            );
            let receivers = self.audience(conversation_id, &[]).await;
            let events = inserted
                .iter()
                .filter_map(|member| {
                    DomainEvent::new(
                        Channel::ConversationMemberAdded,
                        receivers.clone(),
                        &MemberChanged {
                            member: member.clone(),
                        },
                    )
                    .inspect_err(|e| tracing::warn!(error = %e, "compose event"))
                    .ok()
                })
                .collect();
            self.event_gateway.publish_batch(events);
        }

        members.extend(inserted);
        Ok(members)
    }

    async fn remove_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        let removed = self
            .deadline
            .run(self.membership_repo.delete(conversation_id, user_id))
            .await?;

        if removed {
            tracing::info!("member {} left conversation {}", user_id, conversation_id);
            let receivers = self.audience(conversation_id, &[user_id]).await;
            self.event_gateway.emit(
                Channel::ConversationMemberRemoved,
                receivers,
                &MemberRemoved {
                    conversation_id,
                    user_id,
                },
            );
        }
        Ok(removed)
    }

    async fn set_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<ConversationMember, RelationError> {
        let update = self
            .deadline
            .run(self.membership_repo.update_role(conversation_id, user_id, role))
            .await?
            .ok_or_else(|| {
                RelationError::NotFound(format!(
                    "user {user_id} is not a member of conversation {conversation_id}"
                ))
            })?;

        if update.changed {
            let receivers = self.audience(conversation_id, &[]).await;
            self.event_gateway.emit(
                Channel::ConversationMemberRoleChanged,
                receivers,
                &MemberChanged {
                    member: update.member.clone(),
                },
            );
        }
        Ok(update.member)
    }

    async fn is_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        let member = self
            .deadline
            .run(self.membership_repo.get(conversation_id, user_id))
            .await?;
        Ok(member.is_some())
    }

    async fn list_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError> {
        self.deadline
            .run(self.membership_repo.list_by_conversation(conversation_id))
            .await
    }

    async fn list_conversations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError> {
        self.deadline
            .run(self.membership_repo.list_conversation_ids(user_id))
            .await
    }

    async fn find_or_create_private_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<(Conversation, bool), RelationError> {
        if a == b {
            return Err(RelationError::InvalidArgument(format!(
                "user {a} cannot open a private conversation with self"
            )));
        }

        if let Some(found) = self.find_private(a, b).await? {
            return Ok((found, false));
        }

        let proposed = Conversation::new(ConversationKind::Private);
        let claim = self
            .deadline
            .run(
                self.conversation_repo
                    .insert_private(&proposed, UserPair::new(a, b)),
            )
            .await?;

        let (conversation, created) = match claim {
            PrivateConversationClaim::Won(conversation) => (conversation, true),
            PrivateConversationClaim::Existing(conversation) => (conversation, false),
        };
        let conversation_id = conversation.conversation_id;

        // Seats go in canonical pair order, so exactly one call inserts the
        // second seat. That call announces the conversation, including when it
        // completes the seating of a creator that failed halfway.
        let pair = UserPair::new(a, b);
        let role_of = |user_id: UserId| {
            if user_id == a {
                MemberRole::Admin
            } else {
                MemberRole::Member
            }
        };
        let first = self
            .seat_claim(conversation_id, pair.low(), role_of(pair.low()))
            .await?;
        let second = self
            .seat_claim(conversation_id, pair.high(), role_of(pair.high()))
            .await?;

        if second.is_inserted() {
            let mut members = vec![first.into_member(), second.into_member()];
            members.sort_by_key(|m| m.role != MemberRole::Admin);
            tracing::info!("private conversation {} created for {} and {}", conversation_id, a, b);
            self.event_gateway.emit(
                Channel::ConversationCreated,
                vec![a, b],
                &ConversationCreated {
                    conversation: conversation.clone(),
                    members,
                },
            );
        } else if !created {
            tracing::debug!(%conversation_id, "private conversation already seated, reusing it");
        }
        Ok((conversation, created))
    }

    async fn create_group_conversation(
        &self,
        creator: UserId,
        members: &[UserId],
    ) -> Result<Conversation, RelationError> {
        let conversation = Conversation::new(ConversationKind::Group);
        let conversation_id = conversation.conversation_id;
        self.deadline
            .run(self.conversation_repo.insert_group(&conversation))
            .await?;

        let mut seated = vec![self.seat(conversation_id, creator, MemberRole::Admin).await?];
        let mut seen = HashSet::from([creator]);
        for user_id in members.iter().filter(|id| seen.insert(**id)) {
            seated.push(self.seat(conversation_id, *user_id, MemberRole::Member).await?);
        }

        tracing::info!(
            "group conversation {} created by {} with {} members",
            conversation_id,
            creator,
            seated.len()
        );
        let receivers = seated.iter().map(|m| m.user_id).collect();
        self.event_gateway.emit(
            Channel::ConversationCreated,
            receivers,
            &ConversationCreated {
                conversation: conversation.clone(),
                members: seated,
            },
        );
        Ok(conversation)
    }

    async fn pin_message(
        &self,
        conversation_id: ConversationId,
        acting_user: UserId,
        message_id: MessageId,
    ) -> Result<Conversation, RelationError> {
        let mut conversation = self.participant_view(conversation_id, acting_user).await?;
        let changed = self
            .deadline
            .run(self.conversation_repo.add_pinned(conversation_id, message_id))
            .await?
            .ok_or_else(|| RelationError::NotFound(format!("conversation {conversation_id}")))?;

        conversation.pinned_messages.insert(message_id);
        if changed {
            let receivers = self.audience(conversation_id, &[]).await;
            self.event_gateway.emit(
                Channel::MessagePinned,
                receivers,
                &MessagePinChanged {
                    conversation_id,
                    message_id,
                    by: acting_user,
                },
            );
        }
        Ok(conversation)
    }

    async fn unpin_message(
        &self,
        conversation_id: ConversationId,
        acting_user: UserId,
        message_id: MessageId,
    ) -> Result<Conversation, RelationError> {
        let mut conversation = self.participant_view(conversation_id, acting_user).await?;
        let changed = self
            .deadline
            .run(self.conversation_repo.remove_pinned(conversation_id, message_id))
            .await?
            .ok_or_else(|| RelationError::NotFound(format!("conversation {conversation_id}")))?;

        conversation.pinned_messages.remove(&message_id);
        if changed {
            let receivers = self.audience(conversation_id, &[]).await;
            self.event_gateway.emit(
                Channel::MessageUnpinned,
                receivers,
                &MessagePinChanged {
                    conversation_id,
                    message_id,
                    by: acting_user,
                },
            );
        }
        Ok(conversation)
    }

    async fn record_message_created(
        &self,
        conversation_id: ConversationId,
        sender: UserId,
        message_id: MessageId,
    ) -> Result<(), RelationError> {
        self.participant_view(conversation_id, sender).await?;
        let updated = self
            .deadline
            .run(self.conversation_repo.set_last_message(conversation_id, message_id))
            .await?;
        if !updated {
            return Err(RelationError::NotFound(format!(
                "conversation {conversation_id}"
            )));
        }

        let receivers = self.audience(conversation_id, &[]).await;
        self.event_gateway.emit(
            Channel::MessageCreated,
            receivers,
            &MessageCreated {
                conversation_id,
                message_id,
                sender,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RecordingEventGateway;
    use crate::infra_memory::{MemoryConversationRepo, MemoryMembershipRepo};

    fn user() -> UserId {
        UserId(uuid::Uuid::new_v4())
    }

    fn service() -> (Arc<RealMembershipService>, Arc<RecordingEventGateway>) {
        let events = Arc::new(RecordingEventGateway::new());
        let svc = RealMembershipService::new(
            Arc::new(MemoryMembershipRepo::new()),
            Arc::new(MemoryConversationRepo::new()),
            events.clone(),
            StoreDeadline::default(),
        );
        (Arc::new(svc), events)
    }

    #[tokio::test]
    async fn add_member_twice_keeps_one_row_and_first_role() {
        let (svc, events) = service();
        let owner = user();
        let conversation = svc.create_group_conversation(owner, &[]).await.unwrap();
        let c = conversation.conversation_id;
        let u = user();

        let first = svc.add_member(c, u, MemberRole::Member).await.unwrap();
        let second = svc.add_member(c, u, MemberRole::Admin).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.role, MemberRole::Member);
        assert_eq!(svc.list_members(c).await.unwrap().len(), 2);
        assert_eq!(events.on(Channel::ConversationMemberAdded).len(), 1);
    }

    #[tokio::test]
    async fn add_members_publishes_one_event_per_new_row() {
        let (svc, events) = service();
        let owner = user();
        let (x, y) = (user(), user());
        let c = svc
            .create_group_conversation(owner, &[x])
            .await
            .unwrap()
            .conversation_id;

        let members = svc
            .add_members(c, &[x, y, y, owner], MemberRole::Member)
            .await
            .unwrap();

        assert_eq!(members.len(), 3);
        let added = events.on(Channel::ConversationMemberAdded);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].payload["member"]["user_id"], serde_json::json!(y));
    }

    #[tokio::test]
    async fn remove_and_set_role_publish_only_on_change() {
        let (svc, events) = service();
        let (owner, u) = (user(), user());
        let c = svc
            .create_group_conversation(owner, &[u])
            .await
            .unwrap()
            .conversation_id;

        svc.set_role(c, u, MemberRole::Member).await.unwrap();
        assert!(events.on(Channel::ConversationMemberRoleChanged).is_empty());
        let promoted = svc.set_role(c, u, MemberRole::Admin).await.unwrap();
        assert_eq!(promoted.role, MemberRole::Admin);
        assert_eq!(events.on(Channel::ConversationMemberRoleChanged).len(), 1);

        assert!(svc.remove_member(c, u).await.unwrap());
        assert!(!svc.remove_member(c, u).await.unwrap());
        assert!(!svc.is_member(c, u).await.unwrap());
        assert_eq!(events.on(Channel::ConversationMemberRemoved).len(), 1);

        let err = svc.set_role(c, u, MemberRole::Admin).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
    }

    #[tokio::test]
    async fn private_conversation_is_unique_in_either_order() {
        let (svc, events) = service();
        let (a, b) = (user(), user());

        let (first, created) = svc.find_or_create_private_conversation(a, b).await.unwrap();
        assert!(created);
        let (again, created_again) = svc.find_or_create_private_conversation(b, a).await.unwrap();
        assert!(!created_again);
        assert_eq!(first.conversation_id, again.conversation_id);

        let members = svc.list_members(first.conversation_id).await.unwrap();
        let admin = members.iter().find(|m| m.user_id == a).unwrap();
        let member = members.iter().find(|m| m.user_id == b).unwrap();
        assert_eq!(admin.role, MemberRole::Admin);
        assert_eq!(member.role, MemberRole::Member);
        assert_eq!(events.on(Channel::ConversationCreated).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_private_creation_converges_on_one_conversation() {
        let (svc, events) = service();
        let (a, b) = (user(), user());

        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = svc.clone();
            let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
            handles.push(tokio::spawn(async move {
                svc.find_or_create_private_conversation(x, y).await
            }));
        }

        let mut ids = HashSet::new();
        let mut created = 0;
        for handle in handles {
            let (conversation, was_created) = handle.await.unwrap().unwrap();
            ids.insert(conversation.conversation_id);
            if was_created {
                created += 1;
            }
        }

        assert_eq!(ids.len(), 1);
        assert_eq!(created, 1);
        assert_eq!(events.on(Channel::ConversationCreated).len(), 1);
    }

    #[tokio::test]
    async fn private_conversation_with_self_is_invalid() {
        let (svc, _) = service();
        let a = user();
        let err = svc.find_or_create_private_conversation(a, a).await.unwrap_err();
        assert!(matches!(err, RelationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn group_conversation_does_not_satisfy_private_lookup() {
        let (svc, _) = service();
        let (a, b) = (user(), user());
        let group = svc.create_group_conversation(a, &[b]).await.unwrap();

        let (private, created) = svc.find_or_create_private_conversation(a, b).await.unwrap();

        assert!(created);
        assert_ne!(private.conversation_id, group.conversation_id);
        assert_eq!(private.kind, ConversationKind::Private);
    }

    #[tokio::test]
    async fn pinning_requires_membership_and_is_idempotent() {
        let (svc, events) = service();
        let (a, b, outsider) = (user(), user(), user());
        let (conversation, _) = svc.find_or_create_private_conversation(a, b).await.unwrap();
        let c = conversation.conversation_id;
        let m = MessageId(uuid::Uuid::new_v4());

        let err = svc.pin_message(c, outsider, m).await.unwrap_err();
        assert!(matches!(err, RelationError::Forbidden(_)));

        let pinned = svc.pin_message(c, b, m).await.unwrap();
        assert!(pinned.pinned_messages.contains(&m));
        svc.pin_message(c, a, m).await.unwrap();
        assert_eq!(events.on(Channel::MessagePinned).len(), 1);

        let unpinned = svc.unpin_message(c, a, m).await.unwrap();
        assert!(unpinned.pinned_messages.is_empty());
        svc.unpin_message(c, a, m).await.unwrap();
        assert_eq!(events.on(Channel::MessageUnpinned).len(), 1);

        let missing = ConversationId(uuid::Uuid::new_v4());
        let err = svc.pin_message(missing, a, m).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
    }

    #[tokio::test]
    async fn recorded_message_reaches_every_member() {
        let (svc, events) = service();
        let (a, b) = (user(), user());
        let (conversation, _) = svc.find_or_create_private_conversation(a, b).await.unwrap();
        let m = MessageId(uuid::Uuid::new_v4());

        svc.record_message_created(conversation.conversation_id, a, m)
            .await
            .unwrap();

        let created = events.on(Channel::MessageCreated);
        assert_eq!(created.len(), 1);
        assert!(created[0].receivers.contains(&a));
        assert!(created[0].receivers.contains(&b));

        let err = svc
            .record_message_created(conversation.conversation_id, user(), m)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::Forbidden(_)));
    }
}
