//! End-to-end player scenarios against an in-memory page.

use std::cell::RefCell;
use std::rc::Rc;

use strand_backend::{embed, native, plugin, Environment, ScriptState, SharedEnvironment};
use strand_page::{NodeId, Page};
use strand_player::{kinds, PlayerOptions, PlayerRegistry, PlayerState, PlayerTarget};

fn full_env() -> SharedEnvironment {
    Rc::new(RefCell::new(Environment::full()))
}

fn page_with_stage() -> (Page, NodeId) {
    let mut page = Page::new();
    let stage = page.create_element("div");
    page.element_mut(stage).unwrap().set_attr("id", "stage");
    page.append_child(NodeId::ROOT, stage);
    (page, stage)
}

fn recorder() -> (
    Rc<RefCell<Vec<String>>>,
    impl FnMut(&mut strand_player::PlayerEvent) + 'static,
) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let tape = seen.clone();
    (seen, move |e: &mut strand_player::PlayerEvent| {
        tape.borrow_mut().push(e.kind.clone())
    })
}

#[test]
fn test_acquire_same_id_returns_same_instance() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());

    let a = registry.acquire(&mut page, "stage").unwrap();
    let b = registry.acquire(&mut page, "stage").unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);
    assert_eq!(a.borrow().id(), "stage");
}

#[test]
fn test_anonymous_acquires_get_distinct_ids() {
    let mut page = Page::new();
    let mut registry = PlayerRegistry::new(full_env());

    let a = registry.acquire(&mut page, PlayerTarget::None).unwrap();
    let b = registry.acquire(&mut page, PlayerTarget::None).unwrap();
    assert!(!Rc::ptr_eq(&a, &b));
    assert_ne!(a.borrow().id(), b.borrow().id());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_native_bind_fires_changing_then_ready() {
    let (mut page, stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("rendererchanging rendererready norenderer", tape);

    player.load(&mut page, "clip.mp4");
    assert_eq!(*seen.borrow(), vec!["rendererchanging", "rendererready"]);
    assert_eq!(player.state(), PlayerState::Ready);
    assert_eq!(player.current_renderer(), Some(native::ID));
    assert!(native::is_registered("stage"));

    // The placeholder was displaced by the mounted markup
    assert!(!page.is_attached(stage));
    let root = player.current_root().unwrap();
    assert_eq!(page.tag(root), Some("video"));
}

#[test]
fn test_source_fallback_skips_unplayable_manifest() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    // The manifest's extension comes from the last path segment, so no
    // renderer claims it; selection falls through to the second source.
    player.load(&mut page, vec!["video.m4v/manifest.m3u8", "clip.mp4"]);
    assert_eq!(player.current_source(), Some(1));
    assert_eq!(player.current_renderer(), Some(native::ID));
    assert_eq!(
        player.get("src").and_then(|v| v.as_str().map(String::from)),
        Some("clip.mp4".to_string())
    );
}

#[test]
fn test_source_change_keeps_current_renderer() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    player.load(&mut page, "clip.mp4");
    let root = player.current_root().unwrap();

    let (seen, tape) = recorder();
    player.on("rendererchanging", tape);

    player.load(&mut page, "other.webm");
    assert!(seen.borrow().is_empty(), "no switch for a same-renderer source");
    assert_eq!(player.current_renderer(), Some(native::ID));
    assert_eq!(player.current_root(), Some(root), "markup untouched");
    assert_eq!(
        player.get("src").and_then(|v| v.as_str().map(String::from)),
        Some("other.webm".to_string())
    );
}

#[test]
fn test_cross_renderer_switch_reattaches_before_ready() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("play", tape);

    player.load(&mut page, "clip.mp4");
    assert_eq!(player.current_renderer(), Some(native::ID));

    player.load(&mut page, "https://www.youtube.com/watch?v=abc123");
    assert_eq!(player.current_renderer(), Some(embed::ID));
    assert!(!native::is_registered("stage"), "old backend torn down");
    assert!(embed::is_registered("stage"));
    assert_eq!(player.state(), PlayerState::Binding);

    // SDK handshake completes out of band
    assert!(embed::notify_sdk_ready("stage"));
    player.pump();
    assert_eq!(player.state(), PlayerState::Ready);
    let root = player.current_root().unwrap();
    assert_eq!(page.tag(root), Some("iframe"));

    // The handler registered before the switch reached the new backend
    player.play();
    assert_eq!(*seen.borrow(), vec!["play"]);
}

#[test]
fn test_unknown_renderer_name_is_an_error() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let err = player.set_candidates(&["quicktime"]).unwrap_err();
    assert!(matches!(
        err,
        strand_player::PlayerError::UnknownRenderer(name) if name == "quicktime"
    ));
}

#[test]
fn test_unsupported_renderer_reports_instead_of_failing() {
    let env = Rc::new(RefCell::new(Environment::native_only()));
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(env);
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("rendererunsupported norenderer", tape);

    // "embed" is a known name, just not usable in this environment
    player.set_candidates(&["embed"]).unwrap();
    assert_eq!(*seen.borrow(), vec!["rendererunsupported"]);

    player.load(&mut page, "clip.mp4");
    assert_eq!(
        *seen.borrow(),
        vec!["rendererunsupported", "norenderer"]
    );
    assert_eq!(player.state(), PlayerState::NoRenderer);
}

#[test]
fn test_unrecognized_property_stays_private() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    assert_eq!(
        player.set(&mut page, "analytics_tag", "abc".into()).unwrap(),
        None
    );
    player.load(&mut page, "clip.mp4");
    assert_eq!(
        player.get("analytics_tag"),
        Some("abc".into()),
        "private state survives binding"
    );
    // And it never reached the backend-bound configuration
    assert_eq!(
        player.get("volume"),
        Some(1.0.into()),
        "real config untouched"
    );
}

#[test]
fn test_toggle_paused_drives_playback() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();
    player.load(&mut page, "clip.mp4");

    assert_eq!(player.get("paused"), Some(true.into()));
    assert!(!player.toggle(&mut page, "paused").unwrap());
    assert_eq!(player.get("paused"), Some(false.into()));
    assert!(player.toggle(&mut page, "paused").unwrap());
    assert_eq!(player.get("paused"), Some(true.into()));

    assert!(player.toggle(&mut page, "src").is_err());
}

#[test]
fn test_script_wait_retries_until_loaded() {
    let env = Rc::new(RefCell::new(Environment {
        native_media: false,
        plugin_version: Some(10),
        plugin_script: ScriptState::Loading,
        embed_api: false,
        embed_script: ScriptState::Missing,
    }));
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(env.clone());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    player.load(&mut page, "movie.flv");
    assert_eq!(player.state(), PlayerState::Binding);
    assert!(player.current_root().is_none());

    player.tick(&mut page, 200);
    player.tick(&mut page, 200);
    assert_eq!(player.state(), PlayerState::Binding, "still waiting");

    env.borrow_mut().plugin_script = ScriptState::Loaded;
    player.tick(&mut page, 200);

    assert!(plugin::notify_handshake_complete("stage"));
    player.pump();
    assert_eq!(player.state(), PlayerState::Ready);
    let root = player.current_root().unwrap();
    assert_eq!(page.tag(root), Some("object"));
}

#[test]
fn test_script_wait_gives_up_after_retry_limit() {
    let env = Rc::new(RefCell::new(Environment {
        native_media: false,
        plugin_version: Some(10),
        plugin_script: ScriptState::Loading,
        embed_api: false,
        embed_script: ScriptState::Missing,
    }));
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(env);
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("scripttimeout", tape);

    player.load(&mut page, "movie.flv");
    for _ in 0..strand_player::SCRIPT_RETRY_LIMIT {
        player.tick(&mut page, strand_player::SCRIPT_RETRY_MS);
    }
    assert_eq!(*seen.borrow(), vec!["scripttimeout"]);
    assert_eq!(player.state(), PlayerState::NoRenderer);
    assert!(!plugin::is_registered("stage"));

    // Further ticks are inert
    player.tick(&mut page, strand_player::SCRIPT_RETRY_MS);
    assert_eq!(*seen.borrow(), vec!["scripttimeout"]);
}

#[test]
fn test_release_destroys_and_restores_placeholder() {
    let (mut page, stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();

    player.borrow_mut().load(&mut page, "clip.mp4");
    assert!(!page.is_attached(stage));

    assert!(registry.release(&mut page, "stage"));
    assert!(page.is_attached(stage), "displaced markup restored");
    assert!(registry.is_empty());
    assert!(!native::is_registered("stage"));
    assert!(player.borrow().is_destroyed());
    assert!(player
        .borrow_mut()
        .set(&mut page, "volume", 0.5.into())
        .is_err());

    // The id is free again
    let fresh = registry.acquire(&mut page, "stage").unwrap();
    assert!(!fresh.borrow().is_destroyed());
    assert!(registry.release(&mut page, "stage"));
    assert!(!registry.release(&mut page, "stage"));
}

#[test]
fn test_options_construction() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let options = PlayerOptions {
        element: Some("stage".into()),
        src: Some("clip.mp4".into()),
        volume: Some(0.5),
        muted: Some(true),
        width: Some(640),
        ..Default::default()
    };
    let player = registry.acquire(&mut page, options).unwrap();
    let player = player.borrow();

    assert_eq!(player.id(), "stage");
    assert_eq!(player.state(), PlayerState::Ready);
    assert_eq!(player.get("volume"), Some(0.5.into()));
    assert_eq!(player.get("muted"), Some(true.into()));
    assert_eq!(player.get("width"), Some(640u32.into()));
}

#[test]
fn test_authored_media_element_is_absorbed() {
    let mut page = Page::new();
    let video = page.create_element("video");
    {
        let elem = page.element_mut(video).unwrap();
        elem.set_attr("id", "feature");
        elem.set_attr("width", "640");
        elem.set_attr("loop", "");
    }
    let fallback = page.create_element("source");
    page.element_mut(fallback).unwrap().set_attr("src", "clip.webm");
    page.append_child(video, fallback);
    page.append_child(NodeId::ROOT, video);

    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, video).unwrap();
    let mut player = player.borrow_mut();
    assert_eq!(player.id(), "feature");

    player.bind_current(&mut page);
    assert_eq!(player.current_renderer(), Some(native::ID));
    assert_eq!(player.get("width"), Some(640u32.into()));
    assert_eq!(player.get("loop"), Some(true.into()));
    assert_eq!(
        player.get("src").and_then(|v| v.as_str().map(String::from)),
        Some("clip.webm".to_string())
    );
}

#[test]
fn test_seek_before_metadata_reads_back_actual_position() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();
    player.load(&mut page, "clip.mp4");

    let back = player.set(&mut page, "current_time", 42.0.into()).unwrap();
    assert_eq!(back, Some(0.0.into()), "seek before metadata is dropped");

    native::notify_metadata("stage", 60.0);
    let back = player.set(&mut page, "current_time", 42.0.into()).unwrap();
    assert_eq!(back, Some(42.0.into()));
}

#[test]
fn test_stale_readiness_from_replaced_backend_is_discarded() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("rendererready", tape);

    player.load(&mut page, "movie.flv");
    assert_eq!(player.current_renderer(), Some(plugin::ID));
    assert_eq!(player.state(), PlayerState::Binding);

    // Handshake completes, but the host switches sources before it
    // ever pumps the queued readiness
    assert!(plugin::notify_handshake_complete("stage"));
    player.load(&mut page, "https://www.youtube.com/watch?v=abc123");
    assert_eq!(player.current_renderer(), Some(embed::ID));

    // The dead plugin's readiness must not mark the embed ready
    player.pump();
    assert!(seen.borrow().is_empty());
    assert_eq!(player.state(), PlayerState::Binding);
    assert!(player.current_root().is_none());

    assert!(embed::notify_sdk_ready("stage"));
    player.pump();
    assert_eq!(*seen.borrow(), vec!["rendererready"]);
    let root = player.current_root().unwrap();
    assert_eq!(page.tag(root), Some("iframe"));
}

#[test]
fn test_mount_failure_abandons_the_switch() {
    let (mut page, stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("rendererchanging norenderer", tape);

    // The placeholder falls out of the tree before the bind
    page.detach(stage);
    player.load(&mut page, "clip.mp4");

    assert_eq!(*seen.borrow(), vec!["rendererchanging", "norenderer"]);
    assert_eq!(player.state(), PlayerState::NoRenderer);
    assert_eq!(player.current_renderer(), None);
    assert!(!native::is_registered("stage"));
    assert_eq!(player.current_source(), None);
}

#[test]
fn test_seek_before_bind_is_buffered_until_ready() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let back = player.set(&mut page, "current_time", 12.0.into()).unwrap();
    assert_eq!(back, Some(12.0.into()), "buffered, not discarded");

    player.load(&mut page, "movie.flv");
    assert!(plugin::notify_handshake_complete("stage"));
    player.pump();
    assert_eq!(player.state(), PlayerState::Ready);
    assert_eq!(player.get("current_time"), Some(12.0.into()));
}

#[test]
fn test_options_parse_from_json() {
    let (mut page, _stage) = page_with_stage();
    let options: PlayerOptions = serde_json::from_str(
        r#"{"element":"stage","src":"clip.mp4","muted":true,"renderers":["native"]}"#,
    )
    .unwrap();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, options).unwrap();
    let player = player.borrow();

    assert_eq!(player.id(), "stage");
    assert_eq!(player.current_renderer(), Some(native::ID));
    assert_eq!(player.get("muted"), Some(true.into()));
}

#[test]
fn test_forwarded_media_events_reach_handlers() {
    let (mut page, _stage) = page_with_stage();
    let mut registry = PlayerRegistry::new(full_env());
    let player = registry.acquire(&mut page, "stage").unwrap();
    let mut player = player.borrow_mut();

    let (seen, tape) = recorder();
    player.on("ended durationchange", tape);
    player.load(&mut page, "clip.mp4");

    native::notify_metadata("stage", 60.0);
    native::notify_media_event("stage", "ended");
    player.pump();
    assert_eq!(*seen.borrow(), vec![kinds::DURATIONCHANGE, kinds::ENDED]);
}
