//! 权限判定。全部是只读谓词，调用方每次都传入最新读出的用户记录。
//!
//! 查不到用户记录时一律视为无权限，而不是错误，游客就是这种情况。

use crate::message::Message;
use crate::role::Role;
use crate::user::User;
use crate::value_objects::{Login, Timestamp};

/// 是否为消息作者。
pub fn is_owner(message: &Message, actor: &Login) -> bool {
    message.author == *actor
}

/// 是否拥有管理权限（Admin 或 Creator）。
pub fn is_moderator(actor: Option<&User>) -> bool {
    actor.map(|user| user.role.has_moderator_access()).unwrap_or(false)
}

/// 作者本人或管理角色可以处置消息。
pub fn can_manage(message: &Message, actor: Option<&User>) -> bool {
    match actor {
        Some(user) => is_owner(message, &user.login) || is_moderator(actor),
        None => false,
    }
}

/// 禁言是否生效。
pub fn is_muted(actor: Option<&User>, now: Timestamp) -> bool {
    actor.map(|user| user.is_muted(now)).unwrap_or(false)
}

/// 发言是否被禁言拦截。Creator 不受禁言约束。
pub fn posting_blocked_by_mute(actor: &User, now: Timestamp) -> bool {
    actor.is_muted(now) && actor.role != Role::Creator
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::value_objects::{MessageBody, MessageId, PasswordHash, RoomId};

    fn user(login: &str, role: Role) -> User {
        let mut user = User::register(
            Login::parse(login).unwrap(),
            PasswordHash::new("hash").unwrap(),
            "",
            Utc::now(),
        );
        user.change_role(role);
        user
    }

    fn message_by(login: &str) -> Message {
        Message {
            id: MessageId::new(1),
            room_id: RoomId::PUBLIC,
            author: Login::parse(login).unwrap(),
            author_role: Role::User,
            body: MessageBody::parse("hi").unwrap(),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn owner_and_moderators_can_manage() {
        let message = message_by("alice");
        let alice = user("alice", Role::User);
        let admin = user("mod", Role::Admin);
        let creator = user("boss", Role::Creator);
        let bystander = user("bob", Role::User);

        assert!(can_manage(&message, Some(&alice)));
        assert!(can_manage(&message, Some(&admin)));
        assert!(can_manage(&message, Some(&creator)));
        assert!(!can_manage(&message, Some(&bystander)));
    }

    #[test]
    fn missing_record_means_no_authority() {
        let message = message_by("alice");
        assert!(!is_moderator(None));
        assert!(!can_manage(&message, None));
        assert!(!is_muted(None, Utc::now()));
    }

    #[test]
    fn creator_posts_through_mute() {
        let now = Utc::now();
        let mut muted_user = user("bob", Role::User);
        muted_user.set_mute(Some(now + Duration::minutes(5)));
        assert!(posting_blocked_by_mute(&muted_user, now));

        let mut muted_creator = user("boss", Role::Creator);
        muted_creator.set_mute(Some(now + Duration::minutes(5)));
        assert!(!posting_blocked_by_mute(&muted_creator, now));
    }
}
