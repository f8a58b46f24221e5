use gp_protocol::*;
use serde_json::json;

#[test]
fn test_stage_kind_ids_and_order() {
    let ids: Vec<u8> = StageKind::ALL.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    for stage in StageKind::ALL {
        assert_eq!(StageKind::from_id(stage.id()), Some(stage));
    }
    assert_eq!(StageKind::from_id(0), None);
    assert_eq!(StageKind::from_id(5), None);

    assert_eq!(StageKind::ThinkingPoints.next(), Some(StageKind::InitialPrompt));
    assert_eq!(StageKind::FinalPrompt.next(), None);
    assert_eq!(StageKind::ThinkingPoints.previous(), None);
    assert_eq!(StageKind::FinalPrompt.previous(), Some(StageKind::OptimizationAdvice));
    assert!(StageKind::ThinkingPoints < StageKind::FinalPrompt);
}

#[test]
fn test_stage_kind_serialization() {
    let json = serde_json::to_value(StageKind::OptimizationAdvice).expect("Failed to serialize StageKind");
    assert_eq!(json, "OPTIMIZATION_ADVICE");

    let deserialized: StageKind = serde_json::from_value(json).expect("Failed to deserialize StageKind");
    assert_eq!(deserialized, StageKind::OptimizationAdvice);
}

#[test]
fn test_stage_shapes() {
    assert!(StageKind::ThinkingPoints.is_list());
    assert!(!StageKind::InitialPrompt.is_list());
    assert!(StageKind::OptimizationAdvice.is_list());
    assert!(!StageKind::FinalPrompt.is_list());

    assert!(StageOutput::List(vec![]).fits(StageKind::ThinkingPoints));
    assert!(!StageOutput::Text(String::new()).fits(StageKind::ThinkingPoints));
    assert!(StageOutput::Text(String::new()).fits(StageKind::FinalPrompt));
}

#[test]
fn test_stage_output_blankness() {
    assert!(StageOutput::List(vec![]).is_blank());
    assert!(StageOutput::List(vec!["  ".to_string(), String::new()]).is_blank());
    assert!(!StageOutput::List(vec![" ".to_string(), "Identify sentiment".to_string()]).is_blank());
    assert!(StageOutput::Text(" \n\t".to_string()).is_blank());
    assert!(!StageOutput::Text("You are...".to_string()).is_blank());
}

#[test]
fn test_stage_output_tagged_serialization() {
    let output = StageOutput::List(vec!["a".to_string(), "b".to_string()]);
    let json = serde_json::to_value(&output).expect("Failed to serialize StageOutput");
    assert_eq!(json, json!({ "kind": "list", "value": ["a", "b"] }));

    let text: StageOutput =
        serde_json::from_value(json!({ "kind": "text", "value": "hello" })).expect("Failed to deserialize StageOutput");
    assert_eq!(text.as_text(), Some("hello"));
    assert_eq!(text.as_list(), None);
}

#[test]
fn test_language_and_prompt_type_parsing() {
    assert_eq!(Language::default(), Language::Zh);
    assert_eq!("EN".parse::<Language>(), Ok(Language::En));
    assert!("fr".parse::<Language>().is_err());
    assert_eq!(serde_json::to_value(Language::En).expect("serialize"), "en");

    assert_eq!(PromptType::default(), PromptType::System);
    assert_eq!("user".parse::<PromptType>(), Ok(PromptType::User));
    assert!("assistant".parse::<PromptType>().is_err());
}

#[test]
fn test_thinking_points_request_is_camel_case() {
    let request = ThinkingPointsRequest {
        description: "sentiment analysis assistant".to_string(),
        language: Language::Zh,
        model: None,
        variables: vec![],
    };
    let json = serde_json::to_value(&request).expect("Failed to serialize request");
    assert_eq!(
        json,
        json!({ "description": "sentiment analysis assistant", "language": "zh", "variables": [] })
    );
}

#[test]
fn test_apply_optimization_request_field_names() {
    let request = ApplyOptimizationRequest {
        original_prompt: "You are...".to_string(),
        advice: vec!["Add output format".to_string()],
        prompt_type: PromptType::System,
        language: Language::En,
        model: Some("gpt-4o".to_string()),
        variables: vec!["input".to_string()],
    };
    let json = serde_json::to_value(&request).expect("Failed to serialize request");
    assert_eq!(json["originalPrompt"], "You are...");
    assert_eq!(json["promptType"], "system");
    assert_eq!(json["model"], "gpt-4o");
    assert_eq!(json["advice"][0], "Add output format");
}

#[test]
fn test_api_response_envelope() {
    let ok: ApiResponse<Vec<String>> =
        serde_json::from_str(r#"{"code":200,"message":"ok","data":["a","b"]}"#).expect("Failed to parse envelope");
    assert!(ok.is_success());
    assert_eq!(ok.data.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));

    let err: ApiResponse<String> =
        serde_json::from_str(r#"{"code":500,"message":"model overloaded"}"#).expect("Failed to parse envelope");
    assert!(!err.is_success());
    assert_eq!(err.data, None);
    assert_eq!(err.error_message(), "model overloaded");

    let bare: ApiResponse<String> = serde_json::from_str(r#"{"code":502,"data":null}"#).expect("Failed to parse");
    assert_eq!(bare.error_message(), "service returned code 502");
}

#[test]
fn test_stream_frame_partial_payload() {
    let frame: StreamFrame = serde_json::from_str(r#"{"code":200,"data":{"keyIntent":"classify sentiment"}}"#)
        .expect("Failed to parse frame");
    let data = frame.data.expect("frame has data");
    assert_eq!(data.key_intent.as_deref(), Some("classify sentiment"));
    assert_eq!(data.initial_prompt, None);
    assert!(!data.is_blank());
    assert!(GeneratedPrompt::default().is_blank());
}

#[test]
fn test_run_state_serialization() {
    let json = serde_json::to_value(RunState::Running(StageKind::InitialPrompt)).expect("serialize");
    assert_eq!(json, json!({ "state": "RUNNING", "stage": "INITIAL_PROMPT" }));

    let idle: RunState = serde_json::from_value(json!({ "state": "IDLE" })).expect("deserialize");
    assert!(idle.is_idle());
    assert_eq!(RunState::Running(StageKind::FinalPrompt).running_stage(), Some(StageKind::FinalPrompt));
    assert_eq!(RunState::Streaming.running_stage(), None);
}

#[test]
fn test_pipeline_run_serialization() {
    let run = PipelineRun {
        id: uuid::Uuid::new_v4(),
        description: "情感分析助手".to_string(),
        language: Language::Zh,
        prompt_type: PromptType::System,
        model: None,
        variables: vec![],
        stages: StageKind::ALL.map(StageSlot::empty),
        completed: [StageKind::ThinkingPoints].into_iter().collect(),
        active: Some(StageKind::ThinkingPoints),
        state: RunState::Idle,
        last_error: None,
        started_at: chrono::Utc::now(),
    };

    let json = serde_json::to_string(&run).expect("Failed to serialize PipelineRun");
    let deserialized: PipelineRun = serde_json::from_str(&json).expect("Failed to deserialize PipelineRun");

    assert_eq!(deserialized, run);
    assert!(deserialized.is_completed(StageKind::ThinkingPoints));
    assert!(!deserialized.is_finished());
    assert!(!deserialized.is_busy());
    assert_eq!(deserialized.output(StageKind::InitialPrompt), &StageOutput::Text(String::new()));
}

#[test]
fn test_global_config_defaults() {
    let config: GlobalConfig = serde_json::from_str("{}").expect("Failed to deserialize GlobalConfig");
    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.endpoint.base_url, "http://localhost:8080");
    assert_eq!(config.endpoint.timeout_secs, 120);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(config.logging.color);

    let partial: GlobalConfig = serde_json::from_value(json!({ "defaults": { "language": "en" } }))
        .expect("Failed to deserialize partial GlobalConfig");
    assert_eq!(partial.defaults.language, Language::En);
    assert_eq!(partial.defaults.prompt_type, PromptType::System);
}

#[test]
fn test_op_enum_serialization() {
    let op = Op::RunFrom {
        stage: StageKind::OptimizationAdvice,
    };
    let json = serde_json::to_value(&op).expect("Failed to serialize Op");
    assert_eq!(json["type"], "runFrom");
    assert_eq!(json["payload"]["stage"], "OPTIMIZATION_ADVICE");

    let deserialized: Op = serde_json::from_value(json).expect("Failed to deserialize Op");
    assert_eq!(deserialized, op);

    let json = serde_json::to_value(Op::RunAll).expect("Failed to serialize Op::RunAll");
    assert_eq!(json["type"], "runAll");
}

#[test]
fn test_event_enum_serialization() {
    let run_id = uuid::Uuid::new_v4();

    let event = Event::StageCompleted {
        run_id,
        stage: StageKind::InitialPrompt,
        output: StageOutput::Text("You are...".to_string()),
    };
    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "stageCompleted");
    assert_eq!(json["payload"]["run_id"], run_id.to_string());
    assert_eq!(json["payload"]["output"]["kind"], "text");

    let progress = Event::AutomationProgress {
        run_id,
        stage: StageKind::OptimizationAdvice,
        total: 4,
    };
    let json = serde_json::to_value(&progress).expect("Failed to serialize Event");
    assert_eq!(json["type"], "automationProgress");
    assert_eq!(json["payload"]["total"], 4);
}

#[test]
fn test_prompt_record_field_names() {
    let record = PromptRecord {
        title: "提示词_情感分析助手...".to_string(),
        description: "情感分析助手".to_string(),
        requirement_report: "情感分析助手".to_string(),
        thinking_points: vec!["识别情感".to_string()],
        initial_prompt: "你是...".to_string(),
        advice: vec!["增加输出格式".to_string()],
        final_prompt: "你是一个...".to_string(),
        language: Language::Zh,
        format: "markdown".to_string(),
        tags: vec![],
    };
    let json = serde_json::to_value(&record).expect("Failed to serialize PromptRecord");
    assert_eq!(json["requirement_report"], "情感分析助手");
    assert_eq!(json["final_prompt"], "你是一个...");
    assert_eq!(json["format"], "markdown");
}
