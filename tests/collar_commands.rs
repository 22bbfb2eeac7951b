use collar::config::{Config, WaypointsConfig};
use collar::display::{BufferDisplay, Line};
use collar::models::group::{GroupType, Invitation};
use collar::models::player::{Player, Profile};
use collar::models::types::{Dimension, GroupId};
use collar::services::{CollarState, Groups, Locations};
use collar::{DispatchResult, Registry, Source};
use std::sync::Arc;

fn registry(prefixed: bool) -> (Registry, Arc<BufferDisplay>) {
    let display = Arc::new(BufferDisplay::new());
    let config = Config {
        prefixed,
        waypoints: WaypointsConfig {
            enabled: true,
            ..WaypointsConfig::default()
        },
        ..Config::default()
    };
    let registry = Registry::new(Arc::new(config), display.clone(), None).unwrap();
    registry
        .world
        .enter(Player::new("Steve"), 10.0, 64.0, -5.0, Dimension::Overworld);
    (registry, display)
}

async fn connected() -> (Registry, Arc<BufferDisplay>) {
    let (registry, display) = registry(false);
    registry.collar().connect_now().await.unwrap();
    display.clear();
    (registry, display)
}

fn run(registry: &Registry, display: &BufferDisplay, line: &str) -> Vec<String> {
    display.clear();
    registry.execute(Source::Client, line);
    display.texts()
}

#[tokio::test]
async fn waypoint_add_stores_and_mirrors_to_chat() {
    let (registry, display) = connected().await;

    let result = registry.execute(Source::Client, "waypoint add Home 1.0 2.0 3.0 OVERWORLD");
    assert!(result.is_success());

    let stored = registry.services.backend.private_waypoints();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Home");
    assert_eq!(stored[0].location.y, 2.0);
    assert_eq!(display.chat(), vec![r#".waypoints add "Home" 1.0 2.0 3.0"#.to_string()]);
}

#[tokio::test]
async fn malformed_coordinate_names_the_argument_and_runs_nothing() {
    let (registry, display) = connected().await;

    match registry.execute(Source::Client, "waypoint add Home abc 2.0 3.0 OVERWORLD") {
        DispatchResult::ParseError { node, .. } => assert_eq!(node, "x"),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(registry.services.backend.private_waypoints().is_empty());
    assert!(display.chat().is_empty());
    assert!(display.texts().iter().any(|t| t.starts_with("Invalid x:")));
}

#[tokio::test]
async fn waypoint_here_uses_the_player_position() {
    let (registry, display) = connected().await;

    assert!(registry.execute(Source::Client, "waypoint add Base").is_success());
    let texts = run(&registry, &display, "waypoint list");
    assert_eq!(texts, vec!["Base 10 64 -5 OVERWORLD".to_string()]);

    registry.world.leave();
    assert!(matches!(
        registry.execute(Source::Client, "waypoint add Elsewhere"),
        DispatchResult::Success(Err(_))
    ));
    assert!(display.texts().contains(&"You are not in a world".to_string()));
}

#[test]
fn commands_report_a_disconnected_collar() {
    let (registry, display) = registry(false);

    let texts = run(&registry, &display, "friend list");
    assert_eq!(texts, vec!["Collar is disconnected".to_string()]);

    let texts = run(&registry, &display, "status");
    assert_eq!(display.lines(), vec![Line::Message("Collar is disconnected".into())]);
    assert_eq!(texts.len(), 1);
}

#[tokio::test]
async fn status_follows_the_connection() {
    let (registry, display) = registry(false);
    assert_eq!(registry.collar().state(), CollarState::Disconnected);

    registry.collar().connect_now().await.unwrap();
    assert!(display.texts().contains(&"Collar connected".to_string()));
    assert!(registry.collar().connected_at().is_some());

    assert_eq!(run(&registry, &display, "status"), vec!["Collar is connected".to_string()]);

    registry.execute(Source::Client, "disconnect");
    assert_eq!(registry.collar().state(), CollarState::Disconnected);
    assert_eq!(run(&registry, &display, "status"), vec!["Collar is disconnected".to_string()]);
}

#[tokio::test]
async fn friends_are_listed_by_status_then_name() {
    let (registry, display) = connected().await;
    registry.world.add_player(Player::new("zed"));
    registry.services.backend.register_profile(Profile::new("amy"));

    assert_eq!(run(&registry, &display, "friend list"), vec!["You don't have any friends".to_string()]);

    registry.execute(Source::Client, "friend add amy");
    registry.execute(Source::Client, "friend add zed");
    assert_eq!(
        run(&registry, &display, "friend list"),
        vec!["zed (online)".to_string(), "amy (offline)".to_string()]
    );

    registry.execute(Source::Client, "friend remove amy");
    assert_eq!(run(&registry, &display, "friend list"), vec!["zed (online)".to_string()]);
}

#[tokio::test]
async fn parties_are_created_listed_and_left() {
    let (registry, display) = connected().await;

    assert_eq!(
        run(&registry, &display, "party list"),
        vec!["You are not a member of any parties".to_string()]
    );

    registry.execute(Source::Client, "party create raiders");
    registry.execute(Source::Client, r#"party create "night shift""#);
    assert_eq!(
        run(&registry, &display, "party list"),
        vec![
            "You belong to the following parties:".to_string(),
            "night shift".to_string(),
            "raiders".to_string(),
        ]
    );
    assert_eq!(
        run(&registry, &display, "group list"),
        vec!["You are not a member of any groups".to_string()]
    );

    assert!(registry.execute(Source::Client, "party leave raiders").is_success());
    assert_eq!(run(&registry, &display, "party list").len(), 2);
}

#[tokio::test]
async fn members_are_invited_and_removed() {
    let (registry, display) = connected().await;
    registry.world.add_player(Player::new("bob"));
    registry.execute(Source::Client, "party create raiders");

    assert_eq!(
        run(&registry, &display, "party raiders add bob"),
        vec!["Invited bob to raiders".to_string()]
    );
    let group = registry
        .services
        .backend
        .all()
        .into_iter()
        .find(|g| g.name == "raiders")
        .unwrap();
    assert_eq!(group.members.len(), 2);

    assert_eq!(
        run(&registry, &display, "party raiders remove bob"),
        vec!["Removed bob from raiders".to_string()]
    );
}

#[tokio::test]
async fn unknown_group_is_a_resolution_error() {
    let (registry, display) = connected().await;

    match registry.execute(Source::Client, "party delete ghosts") {
        DispatchResult::ResolutionError { node, reason, .. } => {
            assert_eq!(node, "name");
            assert_eq!(reason, "No party named ghosts");
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
    assert_eq!(display.lines(), vec![Line::Info("No party named ghosts".into())]);
}

#[tokio::test]
async fn invitations_are_accepted_by_group_name() {
    let (registry, display) = connected().await;
    registry.services.backend.receive_invitation(Invitation {
        group_id: GroupId::new(),
        name: "builders".into(),
        group_type: GroupType::Group,
        sender: Profile::new("alice"),
    });

    // wrong group type: no party invitation by that name
    assert!(matches!(
        registry.execute(Source::Client, "party accept builders"),
        DispatchResult::ResolutionError { .. }
    ));

    assert_eq!(
        run(&registry, &display, "group accept builders"),
        vec!["You joined group builders".to_string()]
    );
    assert_eq!(
        run(&registry, &display, "group list"),
        vec!["You belong to the following groups:".to_string(), "builders".to_string()]
    );
}

#[tokio::test]
async fn location_sharing_is_listed_per_group() {
    let (registry, display) = connected().await;
    registry.execute(Source::Client, "party create raiders");

    assert_eq!(
        run(&registry, &display, "location share list"),
        vec!["You are not sharing your location with any groups".to_string()]
    );
    registry.execute(Source::Client, "location share start raiders");
    assert_eq!(
        run(&registry, &display, "location share list"),
        vec![
            "You are sharing your location with groups:".to_string(),
            "raiders (party)".to_string(),
        ]
    );
    registry.execute(Source::Client, "location share stop raiders");
    assert_eq!(run(&registry, &display, "location share list").len(), 1);
}

#[tokio::test]
async fn group_waypoints_are_added_listed_and_removed() {
    let (registry, display) = connected().await;
    registry.execute(Source::Client, "group create crew");
    registry.execute(Source::Client, "group create other");
    display.clear();

    assert!(
        registry
            .execute(Source::Client, "waypoint add Camp 1 2 3 NETHER to crew")
            .is_success()
    );
    assert_eq!(display.chat(), vec![r#".waypoints add "crew - Camp" 1.0 2.0 3.0"#.to_string()]);

    assert_eq!(
        run(&registry, &display, "waypoint list crew"),
        vec!["Camp 1 2 3 NETHER".to_string()]
    );
    assert_eq!(
        run(&registry, &display, "waypoint list other"),
        vec!["You have no group waypoints".to_string()]
    );

    assert_eq!(
        run(&registry, &display, "waypoint remove Camp from other"),
        vec!["Waypoint Camp does not belong to group other".to_string()]
    );

    run(&registry, &display, "waypoint remove Camp from crew");
    assert_eq!(display.chat(), vec![r#".waypoints remove "crew - Camp""#.to_string()]);
    assert_eq!(
        run(&registry, &display, "waypoint list crew"),
        vec!["You have no group waypoints".to_string()]
    );
}

#[tokio::test]
async fn unknown_command_shows_family_usage() {
    let (registry, display) = connected().await;

    assert!(matches!(
        registry.execute(Source::Client, "friend"),
        DispatchResult::NoMatch
    ));
    let texts = display.texts();
    assert_eq!(texts[0], "Unknown or incomplete command: friend");
    assert!(texts.contains(&"Usage: friend list".to_string()));
    assert!(!texts.iter().any(|t| t.contains("waypoint")));
}

#[test]
fn prefixed_grammar_lists_every_command() {
    let (registry, _) = registry(true);
    let usage = registry.dispatcher.usage();

    assert_eq!(usage.len(), 30);
    assert!(usage.iter().all(|u| u.starts_with("collar ")));
    for expected in [
        "collar status",
        "collar friend add <name>",
        "collar location share start <groupName>",
        "collar waypoint add <name> <x> <y> <z> <dimension> to <group>",
        "collar waypoint remove <name> from <group>",
        "collar party <groupName> remove <playerName>",
        "collar group accept <groupName>",
    ] {
        assert!(usage.iter().any(|u| u == expected), "missing {expected}");
    }
    assert_eq!(
        registry.usage_for("collar location"),
        vec![
            "collar location share start <groupName>".to_string(),
            "collar location share stop <groupName>".to_string(),
            "collar location share list".to_string(),
        ]
    );
}
