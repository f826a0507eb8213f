//! Cross-cutting guarantees that hold for every content kind.

use std::time::{Duration, Instant};

use cue_engine::cue_types::ui::TruthSection;
use cue_engine::cue_types::{ContentKind, Percent};
use cue_engine::machine::BlockPhase;
use cue_engine::{ContentFilter, EngagementMachine, EventTopic, PlayerAction, Selection};

use crate::common::{media, player, scroll, start_video};

#[test]
fn engagement_never_decreases() {
    let t0 = Instant::now();
    let mut p = player();
    p.select("b-breath", t0);
    let samples = [300.0, 120.0, 800.0, 10.0, 640.0, 0.0];
    let mut last = Percent::ZERO;
    for (i, top) in samples.into_iter().enumerate() {
        let now = t0 + Duration::from_millis(20 * i as u64);
        p.dispatch(scroll(top, 1100.0, 100.0), now).unwrap();
        let current = p.session().unwrap().percent_engaged();
        assert!(current >= last, "{current} dropped below {last}");
        last = current;
    }
    assert_eq!(last.value(), 80);
}

#[test]
fn second_completion_is_refused() {
    let now = Instant::now();
    let mut p = player();
    p.select("b-breath", now);
    p.dispatch(scroll(0.0, 100.0, 100.0), now).unwrap();
    p.dispatch(PlayerAction::Complete, now).unwrap();
    assert!(p.dispatch(PlayerAction::Complete, now).is_err());
    assert!(!p.close());
    assert_eq!(p.sink().proofs().len(), 1);
    assert_eq!(p.navigator().close_count(), 1);
}

#[test]
fn reveal_latch_holds_when_progress_drops() {
    let t0 = Instant::now();
    let mut p = player();
    p.select("b-breath", t0);
    p.dispatch(scroll(1000.0, 1100.0, 100.0), t0).unwrap();
    p.dispatch(scroll(0.0, 1100.0, 100.0), t0 + Duration::from_millis(40))
        .unwrap();
    let session = p.session().unwrap();
    assert!(session.truth_layer_visible());
    assert!(matches!(
        session.machine(),
        EngagementMachine::Block(block) if matches!(block.phase(), BlockPhase::Revealed { .. })
    ));
}

#[test]
fn trailing_scroll_sample_lands_on_tick() {
    let t0 = Instant::now();
    let mut p = player();
    p.select("b-breath", t0);
    p.dispatch(scroll(100.0, 1100.0, 100.0), t0).unwrap();
    p.dispatch(scroll(960.0, 1100.0, 100.0), t0 + Duration::from_millis(5))
        .unwrap();
    assert!(!p.session().unwrap().truth_layer_visible());
    assert!(p.tick(t0 + Duration::from_millis(16)));
    assert!(p.session().unwrap().truth_layer_visible());
}

#[test]
fn switching_kinds_resets_engagement() {
    let now = Instant::now();
    let mut p = player();
    start_video(&mut p, now);
    p.dispatch(media(200.0, 300.0), now).unwrap();
    p.dispatch(PlayerAction::MediaEnded, now).unwrap();
    p.dispatch(PlayerAction::ToggleSection(TruthSection::Lineage), now)
        .unwrap();

    assert!(matches!(
        p.select("b-breath", now),
        Selection::Changed { previous: Some(_) }
    ));
    let session = p.session().unwrap();
    assert_eq!(session.kind(), ContentKind::Block);
    assert_eq!(session.machine().phase_name(), "reading");
    assert_eq!(session.percent_engaged(), Percent::ZERO);
    assert_eq!(session.disclosure().expanded(), None);

    p.dispatch(scroll(0.0, 100.0, 100.0), now).unwrap();
    p.dispatch(PlayerAction::Complete, now).unwrap();
    let proof = &p.sink().proofs()[0];
    assert_eq!(proof.kind(), ContentKind::Block);
    assert_eq!(proof.state_before(), None);
    assert_eq!(proof.state_after(), None);
}

#[test]
fn no_listener_outlives_its_session() {
    let now = Instant::now();
    let mut p = player();

    p.select("v-downshift", now);
    assert!(p.events().is_subscribed(EventTopic::MediaTime));
    assert_eq!(p.events().live_count(), 2);

    p.select("b-breath", now);
    assert!(!p.events().is_subscribed(EventTopic::MediaTime));
    assert_eq!(p.events().live_count(), 1);

    p.fail("boom");
    assert_eq!(p.events().live_count(), 0);
    assert!(p.retry(now));
    assert_eq!(p.events().live_count(), 1);

    p.close();
    assert_eq!(p.events().live_count(), 0);
}

#[test]
fn teardown_cancels_pending_timers() {
    let t0 = Instant::now();
    let mut p = player();
    p.select("p-box", t0);
    assert_eq!(p.session().unwrap().pending_tasks(), 1);
    p.select("l-window", t0);
    assert_eq!(p.session().unwrap().pending_tasks(), 0);
    assert!(!p.tick(t0 + Duration::from_secs(60)));
}

#[test]
fn unknown_selection_keeps_current_session() {
    let now = Instant::now();
    let mut p = player();
    p.select("p-box", now);
    let id = p.session().unwrap().id();
    assert_eq!(p.select("does-not-exist", now), Selection::NotFound);
    assert_eq!(p.session().unwrap().id(), id);
    assert_eq!(p.select("p-box", now), Selection::Unchanged);
    assert_eq!(p.session().unwrap().id(), id);
}

#[test]
fn filter_is_conjunctive_over_fixture() {
    let p = player();
    let filter = ContentFilter::new()
        .with_pillar("regulation")
        .with_query("breath");
    let ids: Vec<_> = p
        .catalog()
        .filter(&filter)
        .into_iter()
        .map(|item| item.id().to_string())
        .collect();
    assert_eq!(ids, ["b-breath", "p-box"]);
}
