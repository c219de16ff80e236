//! End-to-end tests driving the worker through `CombatHandle`.

mod common;

use combat_core::{CombatantId, Controller};
use runtime::{
    AdvanceReport, CombatRuntime, Event, ExecutionMode, PhaseStep, RuntimeConfig, RuntimeError,
    Topic, TurnEvent,
};

use common::{begin, duel, frigate};

#[tokio::test]
async fn ai_duel_completes_whole_turns_in_initiative_order() {
    let runtime = CombatRuntime::start(RuntimeConfig::default(), duel());
    let handle = runtime.handle();

    let first = handle.advance().await.unwrap();
    let AdvanceReport::TurnCompleted(report) = first else {
        panic!("expected a completed turn, got {first:?}");
    };
    assert_eq!(report.actor, CombatantId(1));
    assert_eq!(report.round, 1);
    assert!(!report.plan.actions.is_empty() || !report.plan.reasoning.is_empty());

    let second = handle.advance().await.unwrap();
    let AdvanceReport::TurnCompleted(report) = second else {
        panic!("expected a completed turn, got {second:?}");
    };
    assert_eq!(report.actor, CombatantId(2));

    drop(handle);
    let machine = runtime.shutdown().await.unwrap();
    assert!(machine.log().total() > 0);
}

#[tokio::test]
async fn phase_stepped_mode_reports_each_record() {
    let config = RuntimeConfig::default().with_mode(ExecutionMode::PhaseStepped);
    let runtime = CombatRuntime::start(config, duel());
    let handle = runtime.handle();

    let first = handle.advance().await.unwrap();
    match first {
        AdvanceReport::PhaseExecuted { actor, step, .. } => {
            assert_eq!(actor, CombatantId(1));
            assert_eq!(step, PhaseStep::Movement);
        }
        other => panic!("expected a phase report, got {other:?}"),
    }

    let mut phases = 1;
    loop {
        match handle.advance().await.unwrap() {
            AdvanceReport::PhaseExecuted { actor, .. } => {
                assert_eq!(actor, CombatantId(1));
                phases += 1;
            }
            AdvanceReport::TurnCompleted(report) => {
                assert_eq!(report.actor, CombatantId(1));
                break;
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert!(phases < 10, "turn never completed");
    }
    assert!(phases >= 2);
}

#[tokio::test]
async fn player_turn_waits_for_a_submitted_plan() {
    let roster = vec![
        frigate(1, "Navy", Controller::Player, &[]),
        frigate(2, "Pirates", Controller::Ai, &[]),
    ];
    let runtime = CombatRuntime::start(RuntimeConfig::default(), begin(roster));
    let handle = runtime.handle();

    let report = handle.advance().await.unwrap();
    let AdvanceReport::AwaitingPlayerPlan { actor, suggestion } = report else {
        panic!("expected a player prompt, got {report:?}");
    };
    assert_eq!(actor, CombatantId(1));
    assert_eq!(suggestion.actor, CombatantId(1));

    // Asking again re-issues the prompt instead of running the AI.
    let again = handle.advance().await.unwrap();
    assert!(matches!(again, AdvanceReport::AwaitingPlayerPlan { .. }));

    let mut wrong = (*suggestion).clone();
    wrong.actor = CombatantId(2);
    let err = handle.submit_player_plan(wrong).await.unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidPlanActor { .. }));

    let done = handle.submit_player_plan(*suggestion).await.unwrap();
    let AdvanceReport::TurnCompleted(report) = done else {
        panic!("expected a completed turn, got {done:?}");
    };
    assert_eq!(report.actor, CombatantId(1));
}

#[tokio::test]
async fn attack_on_player_pauses_until_the_reaction_is_answered() {
    let roster = vec![
        frigate(1, "Navy", Controller::Ai, &[18, 18, 18, 18]),
        frigate(2, "Pirates", Controller::Player, &[]),
    ];
    let runtime = CombatRuntime::start(RuntimeConfig::default(), begin(roster));
    let handle = runtime.handle();

    let err = handle.submit_reaction(CombatantId(2), None).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotAwaitingReaction { .. }));

    let mut paused = false;
    let mut report = handle.advance().await.unwrap();
    for _ in 0..40 {
        report = match report {
            AdvanceReport::AwaitingReaction { reactors, trigger } => {
                assert_eq!(reactors, vec![CombatantId(2)]);
                assert_eq!(trigger.target, Some(CombatantId(2)));
                paused = true;

                let wrong = handle.submit_reaction(CombatantId(1), None).await.unwrap_err();
                assert!(matches!(wrong, RuntimeError::NotAwaitingReaction { .. }));
                handle.submit_reaction(CombatantId(2), None).await.unwrap();

                let resumed = handle.advance().await.unwrap();
                assert!(!matches!(resumed, AdvanceReport::AwaitingReaction { .. }));
                break;
            }
            AdvanceReport::AwaitingPlayerPlan { suggestion, .. } => {
                handle.submit_player_plan(*suggestion).await.unwrap()
            }
            AdvanceReport::CombatOver(_) => break,
            _ => handle.advance().await.unwrap(),
        };
    }
    assert!(paused, "no attack reached the player ship");
}

#[tokio::test]
async fn turn_and_log_events_reach_subscribers() {
    let runtime = CombatRuntime::start(RuntimeConfig::default(), duel());
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);
    let mut logs = handle.subscribe(Topic::Log);

    handle.advance().await.unwrap();

    let mut started = None;
    let mut completed = false;
    while let Ok(event) = turns.try_recv() {
        match event {
            Event::Turn(TurnEvent::Started { actor, round, .. }) => started = Some((actor, round)),
            Event::Turn(TurnEvent::Completed(report)) => {
                completed = true;
                assert_eq!(report.actor, CombatantId(1));
            }
            _ => {}
        }
    }
    assert_eq!(started, Some((CombatantId(1), 1)));
    assert!(completed);

    let mut entries = 0;
    while let Ok(event) = logs.try_recv() {
        assert!(matches!(event, Event::Log(_)));
        entries += 1;
    }
    assert!(entries > 0);
}

#[tokio::test]
async fn queries_expose_view_snapshot_and_suggestions() {
    let runtime = CombatRuntime::start(RuntimeConfig::default(), duel());
    let handle = runtime.handle();

    let view = handle.query_view().await.unwrap();
    assert_eq!(view.round, 1);
    assert_eq!(view.current, Some(CombatantId(1)));
    assert_eq!(view.combatants.len(), 2);
    assert!(view.outcome.is_none());

    let actions = handle.available_actions(CombatantId(1)).await.unwrap();
    assert!(!actions.is_empty());

    let suggestion = handle.suggest_plan(CombatantId(2)).await.unwrap();
    assert_eq!(suggestion.actor, CombatantId(2));

    let snapshot = handle.export_snapshot().await.unwrap();
    assert_eq!(snapshot.round, view.round);
    assert_eq!(snapshot.combatants.len(), 2);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("Pirates-2"));
}

#[tokio::test]
async fn run_stops_at_the_turn_limit() {
    let runtime = CombatRuntime::start(RuntimeConfig::default(), duel());
    let outcome = runtime.run(4).await.unwrap();

    let view = runtime.handle().query_view().await.unwrap();
    match outcome {
        Some(outcome) => assert_eq!(view.outcome, Some(outcome)),
        None => assert!(view.round >= 2),
    }
    runtime.shutdown().await.unwrap();
}
