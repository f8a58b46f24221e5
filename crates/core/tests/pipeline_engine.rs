//! Integration tests for PipelineEngine.
//!
//! These tests verify that the engine:
//! - Rejects missing inputs before touching the run
//! - Resets, cascades and stops at the first failure
//! - Keeps the run busy for the whole of a cascade
//! - Accepts edits while a call is in flight without changing that call

mod common;

use common::*;
use gp_core::client::{MockStageClient, StageClient, StageRequest};
use gp_core::{InputError, PipelineError};
use gp_protocol::run_models::RunState;
use gp_protocol::stage_models::{StageKind, StageOutput};
use std::sync::Arc;

#[tokio::test]
async fn test_run_stage_rejects_missing_upstream() {
    let client = MockStageClient::success();
    let (engine, mut rx) = engine_with(Arc::new(client.clone()));
    let store = store_for("情感分析");

    for stage in [
        StageKind::InitialPrompt,
        StageKind::OptimizationAdvice,
        StageKind::FinalPrompt,
    ] {
        let before = store.snapshot();
        let err = engine.run_stage(&store, stage).await.unwrap_err();

        assert!(
            matches!(err, PipelineError::Input(InputError::MissingUpstream { .. })),
            "stage {stage} should need its upstream, got {err:?}"
        );
        assert!(!err.is_recorded());
        assert_eq!(store.snapshot(), before, "input errors must not change the run");
    }

    assert_eq!(client.request_count(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_run_stage_one_rejects_blank_description() {
    let client = MockStageClient::success();
    let (engine, _rx) = engine_with(Arc::new(client.clone()));
    let store = store_for("   ");

    let err = engine.run_stage(&store, StageKind::ThinkingPoints).await.unwrap_err();

    assert!(matches!(err, PipelineError::Input(InputError::EmptyDescription)));
    assert_eq!(client.request_count(), 0);
    assert!(store.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_successful_stage_is_completed_and_filled() {
    let (engine, _rx) = engine_with(Arc::new(MockStageClient::success()));
    let store = store_for(SENTIMENT_TASK);

    for stage in StageKind::ALL {
        engine.run_stage(&store, stage).await.unwrap();

        let run = store.snapshot();
        assert!(run.is_completed(stage));
        assert!(!run.output(stage).is_blank());
        assert_eq!(run.active, Some(stage));
        assert_eq!(run.state, RunState::Idle);
    }
}

#[tokio::test]
async fn test_run_all_resets_before_stage_one() {
    let client = MockStageClient::failing_at(StageKind::ThinkingPoints);
    let (engine, mut rx) = engine_with(Arc::new(client));
    let store = gp_core::RunStore::new(run_completed_through(SENTIMENT_TASK, StageKind::FinalPrompt));

    let err = engine.run_all(&store).await.unwrap_err();
    assert!(err.is_recorded());

    let run = store.snapshot();
    assert!(run.completed.is_empty());
    for stage in StageKind::ALL {
        assert_eq!(run.output(stage), &stage.empty_output());
    }
    assert!(run.last_error.is_some());

    let events = drain(&mut rx);
    assert_starts_with_reset(&events);
    assert_eq!(failed_stages(&events), vec![StageKind::ThinkingPoints]);
}

#[tokio::test]
async fn test_run_from_two_failing_at_three_keeps_earlier_stages() {
    let client = MockStageClient::failing_at(StageKind::OptimizationAdvice);
    let (engine, mut rx) = engine_with(Arc::new(client.clone()));
    let store = gp_core::RunStore::new(run_completed_through(SENTIMENT_TASK, StageKind::ThinkingPoints));
    let stage_one = store.snapshot().output(StageKind::ThinkingPoints).clone();

    let err = engine.run_from(&store, StageKind::InitialPrompt).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Remote {
            stage: Some(StageKind::OptimizationAdvice),
            ..
        }
    ));

    let run = store.snapshot();
    assert_eq!(run.output(StageKind::ThinkingPoints), &stage_one);
    assert!(run.is_completed(StageKind::ThinkingPoints));
    assert!(run.is_completed(StageKind::InitialPrompt));
    assert!(!run.output(StageKind::InitialPrompt).is_blank());

    assert!(!run.is_completed(StageKind::OptimizationAdvice));
    assert!(!run.is_completed(StageKind::FinalPrompt));
    assert_eq!(run.output(StageKind::OptimizationAdvice), &StageOutput::List(vec![]));
    assert_eq!(run.output(StageKind::FinalPrompt), &StageOutput::Text(String::new()));

    let last_error = run.last_error.unwrap();
    assert!(last_error.contains("mock failure at stage 3"), "{last_error}");
    assert_eq!(run.state, RunState::Idle);

    // Stage 4 was never attempted.
    assert_eq!(client.request_count(), 2);

    let events = drain(&mut rx);
    assert_eq!(completed_stages(&events), vec![StageKind::InitialPrompt]);
    assert!(!has_run_completed(&events));
}

#[tokio::test]
async fn test_editing_upstream_keeps_downstream_completed() {
    let (engine, _rx) = engine_with(Arc::new(MockStageClient::success()));
    let store = store_for(SENTIMENT_TASK);
    engine.run_all(&store).await.unwrap();

    store
        .edit_stage_output(StageKind::InitialPrompt, StageOutput::Text("hand-written".into()))
        .unwrap();

    let run = store.snapshot();
    assert!(run.is_completed(StageKind::FinalPrompt));
    assert_eq!(run.completed.len(), 4);
    assert_eq!(run.output(StageKind::InitialPrompt), &StageOutput::Text("hand-written".into()));
}

#[tokio::test]
async fn test_blank_result_is_recorded_as_failure() {
    let client = MockStageClient::success().with_output(StageKind::InitialPrompt, StageOutput::Text("  ".into()));
    let (engine, _rx) = engine_with(Arc::new(client));
    let store = store_for(SENTIMENT_TASK);

    let err = engine.run_from(&store, StageKind::ThinkingPoints).await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyOutput(StageKind::InitialPrompt)));
    let run = store.snapshot();
    assert!(run.is_completed(StageKind::ThinkingPoints));
    assert!(!run.is_completed(StageKind::InitialPrompt));
    assert!(run.last_error.is_some());
}

#[tokio::test]
async fn test_second_call_while_busy_is_rejected() {
    let gated = GatedClient::new(MockStageClient::success());
    let (engine, _rx) = engine_with(Arc::new(gated.clone()));
    let engine = Arc::new(engine);
    let store = store_for(SENTIMENT_TASK);

    let handle = {
        let engine = engine.clone();
        let store = store.clone();
        tokio::spawn(async move { engine.run_stage(&store, StageKind::ThinkingPoints).await })
    };
    gated.wait_entered().await;

    assert_eq!(store.state(), RunState::Running(StageKind::ThinkingPoints));
    let err = engine.run_all(&store).await.unwrap_err();
    assert!(matches!(err, PipelineError::Busy(RunState::Running(StageKind::ThinkingPoints))));
    assert!(!err.is_recorded());

    let err = engine.generate_streaming(&store).await.unwrap_err();
    assert!(matches!(err, PipelineError::Busy(_)));

    gated.release(1);
    handle.await.unwrap().unwrap();

    let run = store.snapshot();
    assert_eq!(run.state, RunState::Idle);
    assert!(run.last_error.is_none());
    assert_eq!(gated.inner().request_count(), 1);
}

#[tokio::test]
async fn test_edit_during_flight_does_not_change_request() {
    let gated = GatedClient::new(MockStageClient::success());
    let (engine, _rx) = engine_with(Arc::new(gated.clone()));
    let engine = Arc::new(engine);
    let store = gp_core::RunStore::new(run_completed_through(SENTIMENT_TASK, StageKind::ThinkingPoints));
    let original_points = store
        .snapshot()
        .output(StageKind::ThinkingPoints)
        .as_list()
        .unwrap()
        .to_vec();

    let handle = {
        let engine = engine.clone();
        let store = store.clone();
        tokio::spawn(async move { engine.run_stage(&store, StageKind::InitialPrompt).await })
    };
    gated.wait_entered().await;

    store
        .edit_stage_output(StageKind::ThinkingPoints, StageOutput::List(vec!["edited".into()]))
        .unwrap();

    gated.release(1);
    handle.await.unwrap().unwrap();

    let requests = gated.inner().requests();
    match &requests[0] {
        StageRequest::SystemPrompt(request) => assert_eq!(request.thinking_points, original_points),
        other => panic!("Expected a system prompt request, got {other:?}"),
    }

    let run = store.snapshot();
    assert_eq!(run.output(StageKind::ThinkingPoints), &StageOutput::List(vec!["edited".into()]));
    assert!(run.is_completed(StageKind::InitialPrompt));
}

#[tokio::test]
async fn test_cascade_stays_busy_between_stages() {
    let gated = GatedClient::new(MockStageClient::success());
    let client: Arc<dyn StageClient> = Arc::new(gated.clone());
    let (engine, _rx) = engine_with(client);
    let engine = Arc::new(engine);
    let store = store_for(SENTIMENT_TASK);

    let handle = {
        let engine = engine.clone();
        let store = store.clone();
        tokio::spawn(async move { engine.run_all(&store).await })
    };

    for stage in StageKind::ALL {
        gated.wait_entered().await;
        assert_eq!(store.state(), RunState::Running(stage));
        gated.release(1);
    }

    let run = handle.await.unwrap().unwrap();
    assert!(run.is_finished());
    assert_eq!(store.state(), RunState::Idle);
}

#[tokio::test]
async fn test_runs_are_independent() {
    let gated = GatedClient::new(MockStageClient::success());
    let (engine, _rx) = engine_with(Arc::new(gated.clone()));
    let engine = Arc::new(engine);
    let first = store_for("first");
    let second = store_for("second");

    let handle = {
        let engine = engine.clone();
        let first = first.clone();
        tokio::spawn(async move { engine.run_stage(&first, StageKind::ThinkingPoints).await })
    };
    gated.wait_entered().await;

    // The first run being busy does not block the second.
    gated.release(2);
    engine.run_stage(&second, StageKind::ThinkingPoints).await.unwrap();
    handle.await.unwrap().unwrap();

    assert!(first.snapshot().is_completed(StageKind::ThinkingPoints));
    assert!(second.snapshot().is_completed(StageKind::ThinkingPoints));
}
