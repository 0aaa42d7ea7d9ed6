use tubebox_core::playback::ADVANCE_THRESHOLD_SECS;
use tubebox_core::{
    Fade, Playlist, PlaylistItem, PlaylistSet, PlaybackState, Screen, Settings, SourceType,
};

fn item(source_type: SourceType) -> PlaylistItem {
    PlaylistItem {
        title: "Item".to_string(),
        artist: String::new(),
        source_type,
        path: Some(std::path::PathBuf::from("a")),
        url: Some("http://example.com".to_string()),
        start: None,
        end: None,
        tags: None,
        emulator_core: Some("core".to_string()),
        emulator_system: Some("sys".to_string()),
    }
}

fn playlist(items: Vec<PlaylistItem>) -> Playlist {
    Playlist {
        title: "P".to_string(),
        curator: "C".to_string(),
        description: None,
        loop_playback: false,
        items,
    }
}

#[test]
fn categorization_follows_every_item() {
    let games = playlist(vec![
        item(SourceType::EmulatedGame),
        item(SourceType::EmulatedGame),
    ]);
    assert!(games.is_game_playlist());

    let mixed = playlist(vec![item(SourceType::EmulatedGame), item(SourceType::Local)]);
    assert!(!mixed.is_game_playlist());

    let set = PlaylistSet::new(vec![games, mixed]);
    assert_eq!(set.games().count(), 1);
    assert_eq!(set.media_count(), 1);
}

#[test]
fn advance_latch_survives_position_jitter() {
    let mut state = PlaybackState::default();
    state.begin_item(0, 0);
    state.observe(0.5, 30.0);
    assert!(!state.should_auto_advance());

    // Crossing the threshold arms exactly one advance.
    state.observe(30.0 - ADVANCE_THRESHOLD_SECS, 30.0);
    assert!(state.should_auto_advance());
    state.mark_advanced();

    // Jitter around the end must not re-arm.
    for position in [29.6, 29.8, 29.9, 30.0] {
        state.observe(position, 30.0);
        assert!(!state.should_auto_advance());
    }
}

#[test]
fn fade_ramp_matches_play_screen_toggle_timing() {
    // SELECT in the composed screen drops the UI to 0 over one second.
    let mut fade = Fade::default();
    fade.start(5.0, 1.0, false);
    assert!(fade.alpha(5.0) > 0.99);
    assert!((fade.alpha(5.5) - 0.5).abs() < 0.01);
    assert_eq!(fade.alpha(6.0), 0.0);

    // SELECT again brings it back over one second.
    fade.start(6.2, 1.0, true);
    assert!(fade.alpha(6.2) < 0.01);
    assert!(fade.alpha(7.2) > 0.99);
}

#[test]
fn settings_document_roundtrip_is_semantically_identical() {
    let mut settings = Settings::default();
    settings.effects.scanlines = 0.5; // Medium
    settings.master_volume = 63;

    let json = serde_json::to_string(&settings).unwrap();
    let restored: Settings = serde_json::from_str(&json).unwrap();
    assert_eq!(settings, restored);
}

#[test]
fn screen_enum_has_exactly_one_active_state() {
    // Guards the exhaustive list the renderer matches over.
    let all = [
        Screen::Intro,
        Screen::IntroFadeOut,
        Screen::Menu,
        Screen::Load,
        Screen::PlayUi,
        Screen::PlayClean,
        Screen::Handoff,
        Screen::Recovery,
    ];
    for (i, a) in all.iter().enumerate() {
        for b in all.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}
