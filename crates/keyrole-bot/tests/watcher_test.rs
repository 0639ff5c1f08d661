//! Message watcher behaviour against an in-memory store and a recording
//! gateway.

use keyrole_bot::{IdleReason, InboundMessage, MessageWatcher, WatchOutcome};
use keyrole_commands::test_utils::FakeGateway;
use keyrole_commands::{NotifyOutcome, Severity};
use keyrole_common::test_utils::{discord_fixtures::*, init_test_logging};
use keyrole_common::{ChannelId, ErrorKind, MatchPolicy, UserId};
use keyrole_config::{BackendKind, WatcherSettings};
use keyrole_store::{ConfigPatch, ConfigStore, DisabledStore, MemoryStore, ServerConfig};
use std::time::Duration;

fn configured_store() -> MemoryStore {
    MemoryStore::with_records([(
        test_guild_id(),
        ServerConfig {
            channel_id: Some(test_channel_id()),
            keyword: Some("open".to_string()),
            role_id: Some(test_role_id()),
            log_channel_id: None,
        },
    )])
}

fn server() -> FakeGateway {
    FakeGateway::new()
        .with_role(test_role_id(), "Member", 2)
        .with_channel(test_channel_id(), "welcome")
        .with_channel(test_log_channel_id(), "logs")
        .with_bot_position(5)
}

fn message(content: &str) -> InboundMessage {
    InboundMessage {
        guild: Some(test_guild_id()),
        channel: test_channel_id(),
        author: test_user_id(),
        author_is_bot: false,
        author_roles: Some(Vec::new()),
        content: content.to_string(),
    }
}

fn settings() -> WatcherSettings {
    WatcherSettings::default()
}

#[tokio::test]
async fn test_keyword_in_watched_channel_grants_once() {
    init_test_logging();
    let store = configured_store();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let outcome = watcher.handle(&message("please open the door")).await;

    assert_eq!(
        outcome,
        WatchOutcome::Granted {
            user: test_user_id(),
            role: test_role_id(),
            notify: NotifyOutcome::NotConfigured,
        }
    );
    assert_eq!(gateway.grants(), vec![(test_user_id(), test_role_id())]);

    let notices = gateway.transients();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, test_channel_id());
    assert!(notices[0].1.contains("Member"));
    assert_eq!(notices[0].2, Duration::from_secs(10));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_author_already_holding_role_is_left_alone() {
    let store = configured_store();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let mut msg = message("open");
    msg.author_roles = Some(vec![test_role_id()]);

    assert_eq!(
        watcher.handle(&msg).await,
        WatchOutcome::Idle(IdleReason::AlreadyHasRole)
    );
    assert!(gateway.side_effects().is_empty());
}

#[tokio::test]
async fn test_member_roles_fetched_when_not_in_message() {
    let store = configured_store();
    let gateway = server().with_member(test_user_id(), vec![test_role_id()]);
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let mut msg = message("open");
    msg.author_roles = None;

    assert_eq!(
        watcher.handle(&msg).await,
        WatchOutcome::Idle(IdleReason::AlreadyHasRole)
    );
}

#[tokio::test]
async fn test_unconfigured_server_does_nothing() {
    let store = MemoryStore::new();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    assert_eq!(
        watcher.handle(&message("open")).await,
        WatchOutcome::Idle(IdleReason::NotConfigured)
    );
    assert!(gateway.calls().is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_partial_config_does_nothing() {
    let store = MemoryStore::new();
    store
        .set(
            test_guild_id(),
            &ConfigPatch::new().channel(test_channel_id()).keyword("open"),
        )
        .await
        .unwrap();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    assert_eq!(
        watcher.handle(&message("open")).await,
        WatchOutcome::Idle(IdleReason::NotConfigured)
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_guards_short_circuit_in_order() {
    let store = configured_store();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let mut dm = message("open");
    dm.guild = None;
    assert_eq!(watcher.handle(&dm).await, WatchOutcome::Idle(IdleReason::NotInGuild));

    let mut from_bot = message("open");
    from_bot.author_is_bot = true;
    assert_eq!(
        watcher.handle(&from_bot).await,
        WatchOutcome::Idle(IdleReason::AutomatedAuthor)
    );

    let mut elsewhere = message("open");
    elsewhere.channel = ChannelId(1);
    assert_eq!(
        watcher.handle(&elsewhere).await,
        WatchOutcome::Idle(IdleReason::OtherChannel)
    );

    assert_eq!(
        watcher.handle(&message("closed")).await,
        WatchOutcome::Idle(IdleReason::NoMatch)
    );

    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_exact_policy_requires_whole_message() {
    let store = configured_store();
    let gateway = server();
    let exact = WatcherSettings {
        match_policy: MatchPolicy::Exact,
        ..WatcherSettings::default()
    };
    let watcher = MessageWatcher::new(&store, &gateway, &exact);

    assert_eq!(
        watcher.handle(&message("please open")).await,
        WatchOutcome::Idle(IdleReason::NoMatch)
    );
    assert!(matches!(
        watcher.handle(&message("open")).await,
        WatchOutcome::Granted { .. }
    ));
}

#[tokio::test]
async fn test_deleted_role_is_skipped() {
    let store = configured_store();
    let gateway = FakeGateway::new().with_channel(test_channel_id(), "welcome");
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    assert_eq!(
        watcher.handle(&message("open")).await,
        WatchOutcome::Idle(IdleReason::RoleMissing)
    );
    assert!(gateway.side_effects().is_empty());
}

#[tokio::test]
async fn test_successful_grant_is_audited() {
    let store = configured_store();
    store
        .set(test_guild_id(), &ConfigPatch::new().log_channel(test_log_channel_id()))
        .await
        .unwrap();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let outcome = watcher.handle(&message("open")).await;
    assert!(matches!(
        outcome,
        WatchOutcome::Granted {
            notify: NotifyOutcome::Sent(_),
            ..
        }
    ));

    let embeds = gateway.embeds();
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].0, test_log_channel_id());
    assert_eq!(embeds[0].1.title, "Role granted");
    assert_eq!(embeds[0].1.severity, Severity::Success);
}

#[tokio::test]
async fn test_permission_failure_is_audited_and_swallowed() {
    let store = configured_store();
    store
        .set(test_guild_id(), &ConfigPatch::new().log_channel(test_log_channel_id()))
        .await
        .unwrap();
    let gateway = server().deny_grants();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let outcome = watcher.handle(&message("open")).await;
    assert_eq!(
        outcome,
        WatchOutcome::GrantFailed {
            user: test_user_id(),
            role: test_role_id(),
            kind: ErrorKind::PermissionDenied,
            notify: NotifyOutcome::Sent(test_log_channel_id()),
        }
    );

    let embeds = gateway.embeds();
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].1.title, "Role grant failed");
    assert_eq!(embeds[0].1.severity, Severity::Failure);
    assert!(embeds[0].1.description.contains("missing permissions"));
    assert_eq!(gateway.transients().len(), 1);
}

#[tokio::test]
async fn test_each_message_is_handled_independently() {
    let store = configured_store();
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    let mut other = message("open");
    other.author = UserId(5);
    watcher.handle(&message("open")).await;
    watcher.handle(&other).await;

    assert_eq!(
        gateway.grants(),
        vec![(test_user_id(), test_role_id()), (UserId(5), test_role_id())]
    );
}

#[tokio::test]
async fn test_disabled_store_keeps_watcher_idle() {
    let store = DisabledStore::new(BackendKind::Mongo);
    let gateway = server();
    let watcher = MessageWatcher::new(&store, &gateway, &settings());

    assert_eq!(
        watcher.handle(&message("open")).await,
        WatchOutcome::Idle(IdleReason::NotConfigured)
    );
    assert!(gateway.calls().is_empty());
}
