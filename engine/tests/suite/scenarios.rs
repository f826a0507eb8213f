//! End-to-end sessions through the player, one per content kind.

use std::time::{Duration, Instant};

use cue_engine::cue_types::{ContentKind, Percent, Rating, StateDimension};
use cue_engine::machine::VideoPhase;
use cue_engine::{
    ActionError, CheckInChoice, EngagementMachine, NavigationRequest, Outcome, PlayerAction,
};

use crate::common::{media, player, scroll, start_video};

#[test]
fn article_that_fits_reveals_without_scrolling() {
    let now = Instant::now();
    let mut p = player();
    p.select("b-breath", now);
    p.dispatch(scroll(0.0, 600.0, 600.0), now).unwrap();

    let session = p.session().unwrap();
    assert_eq!(session.percent_engaged(), Percent::FULL);
    assert!(session.truth_layer_visible());
}

#[test]
fn article_completion_carries_reflection_and_practice() {
    let now = Instant::now();
    let mut p = player();
    p.select("b-breath", now);
    p.dispatch(scroll(1000.0, 1500.0, 500.0), now).unwrap();
    p.dispatch(PlayerAction::EditReflection("Exhale longer".into()), now)
        .unwrap();
    assert!(matches!(
        p.dispatch(PlayerAction::LaunchPractice, now),
        Ok(Outcome::PracticeLaunched(_))
    ));
    p.dispatch(PlayerAction::PracticeResolved { completed: true }, now)
        .unwrap();
    assert_eq!(p.dispatch(PlayerAction::Complete, now), Ok(Outcome::Completed));

    let proofs = p.sink().proofs();
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].kind(), ContentKind::Block);
    assert_eq!(proofs[0].reflection_text(), Some("Exhale longer"));
    assert!(proofs[0].practice_completed());
    assert_eq!(proofs[0].helped(), None);
    assert!(matches!(
        p.navigator().requests(),
        [NavigationRequest::Practice(_), NavigationRequest::Close]
    ));
}

#[test]
fn article_without_resolution_does_not_count_practice() {
    let now = Instant::now();
    let mut p = player();
    p.select("b-breath", now);
    p.dispatch(scroll(1000.0, 1500.0, 500.0), now).unwrap();
    p.dispatch(PlayerAction::LaunchPractice, now).unwrap();
    p.dispatch(PlayerAction::Complete, now).unwrap();
    assert!(!p.sink().proofs()[0].practice_completed());
}

#[test]
fn video_scrub_then_rewind_keeps_maximum() {
    let now = Instant::now();
    let mut p = player();
    start_video(&mut p, now);
    p.dispatch(media(150.0, 300.0), now).unwrap();
    p.dispatch(media(30.0, 300.0), now).unwrap();
    assert_eq!(p.session().unwrap().percent_engaged().value(), 50);

    p.dispatch(PlayerAction::MediaEnded, now).unwrap();
    p.dispatch(PlayerAction::SetHelped(true), now).unwrap();
    p.dispatch(PlayerAction::Complete, now).unwrap();
    assert_eq!(p.sink().proofs()[0].percent_engaged(), Percent::FULL);
}

#[test]
fn video_full_proof_has_both_snapshots() {
    let now = Instant::now();
    let mut p = player();
    p.select("v-downshift", now);
    let low = Rating::new(2).unwrap();
    let high = Rating::new(7).unwrap();
    p.dispatch(
        PlayerAction::AdjustState {
            dimension: StateDimension::Energy,
            rating: low,
        },
        now,
    )
    .unwrap();
    p.dispatch(PlayerAction::DismissPreCheck, now).unwrap();
    p.dispatch(PlayerAction::StartPlayback, now).unwrap();
    p.dispatch(PlayerAction::MediaEnded, now).unwrap();
    p.dispatch(
        PlayerAction::AdjustState {
            dimension: StateDimension::Energy,
            rating: high,
        },
        now,
    )
    .unwrap();
    p.dispatch(PlayerAction::SetHelped(false), now).unwrap();
    p.dispatch(PlayerAction::Complete, now).unwrap();

    let proof = &p.sink().proofs()[0];
    assert_eq!(proof.kind(), ContentKind::WellbeingVideo);
    assert_eq!(proof.state_before().map(|s| s.energy), Some(low));
    assert_eq!(proof.state_after().map(|s| s.energy), Some(high));
    assert_eq!(proof.helped(), Some(false));
    assert!(!proof.practice_completed());
}

#[test]
fn video_gate_blocks_playback_until_dismissed() {
    let now = Instant::now();
    let mut p = player();
    p.select("v-downshift", now);
    assert_eq!(
        p.dispatch(PlayerAction::StartPlayback, now),
        Err(ActionError::PreCheckPending)
    );
    let session = p.session().unwrap();
    assert!(matches!(
        session.machine(),
        EngagementMachine::Video(v) if v.phase() == VideoPhase::PreCheck { dismissed: false }
    ));
    assert_eq!(
        session.notice().map(|n| n.message().to_string()).as_deref(),
        Some("check in before starting")
    );
}

#[test]
fn closing_video_mid_playback_emits_nothing() {
    let now = Instant::now();
    let mut p = player();
    start_video(&mut p, now);
    p.dispatch(media(120.0, 300.0), now).unwrap();
    assert_eq!(p.session().unwrap().percent_engaged().value(), 40);

    assert!(p.close());
    assert!(p.sink().proofs().is_empty());
    assert_eq!(p.navigator().close_count(), 1);
    assert_eq!(p.events().live_count(), 0);
}

#[test]
fn practice_advanced_through_is_complete() {
    let now = Instant::now();
    let mut p = player();
    p.select("p-box", now);
    for _ in 0..3 {
        assert_eq!(p.dispatch(PlayerAction::Advance, now), Ok(Outcome::Applied));
    }
    assert!(p.session().unwrap().truth_layer_visible());
    assert_eq!(p.dispatch(PlayerAction::Advance, now), Ok(Outcome::Completed));

    let proof = &p.sink().proofs()[0];
    assert_eq!(proof.kind(), ContentKind::Practice);
    assert_eq!(proof.percent_engaged(), Percent::FULL);
    assert!(proof.practice_completed());
}

#[test]
fn strict_practice_follows_the_clock() {
    let t0 = Instant::now();
    let mut p = crate::common::player_with(cue_engine::EngagementSettings {
        allow_early_step_advance: false,
        ..Default::default()
    });
    p.select("p-box", t0);
    assert!(matches!(
        p.dispatch(PlayerAction::Advance, t0 + Duration::from_secs(1)),
        Err(ActionError::StepNotElapsed { step: 0, .. })
    ));
    p.tick(t0 + Duration::from_secs(4));
    assert_eq!(
        p.dispatch(PlayerAction::Advance, t0 + Duration::from_secs(4)),
        Ok(Outcome::Applied)
    );
}

#[test]
fn lesson_back_and_forth_emits_one_proof() {
    let now = Instant::now();
    let mut p = player();
    p.select("l-window", now);

    // Scene 3, back to scene 1, forward to scene 3 again.
    p.dispatch(PlayerAction::Advance, now).unwrap();
    p.dispatch(PlayerAction::Advance, now).unwrap();
    p.dispatch(PlayerAction::EditReflection("I rush".into()), now)
        .unwrap();
    p.dispatch(PlayerAction::Back, now).unwrap();
    p.dispatch(PlayerAction::Back, now).unwrap();
    p.dispatch(PlayerAction::Advance, now).unwrap();
    p.dispatch(PlayerAction::Advance, now).unwrap();

    // On to scene 7, answering the state check on scene 6.
    for _ in 0..3 {
        p.dispatch(PlayerAction::Advance, now).unwrap();
    }
    assert_eq!(
        p.dispatch(PlayerAction::Advance, now),
        Err(ActionError::CheckInRequired)
    );
    p.dispatch(PlayerAction::CheckIn(CheckInChoice::Steady), now)
        .unwrap();
    p.dispatch(PlayerAction::Advance, now).unwrap();
    assert!(p.session().unwrap().truth_layer_visible());

    assert_eq!(p.dispatch(PlayerAction::Advance, now), Ok(Outcome::Completed));
    assert_eq!(
        p.dispatch(PlayerAction::Advance, now),
        Err(ActionError::NothingPlaying)
    );

    let proofs = p.sink().proofs();
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].kind(), ContentKind::MicroLesson);
    assert_eq!(proofs[0].reflection_text(), Some("I rush"));
}

#[test]
fn unavailable_content_only_closes() {
    let now = Instant::now();
    let mut p = player();
    p.open_json("{\"id\": \"\", \"kind\": \"block\"}", now);
    assert_eq!(p.screen().name(), "unavailable");
    assert!(p.close());
    assert!(p.sink().proofs().is_empty());
}
