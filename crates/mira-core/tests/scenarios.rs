use std::sync::Arc;

use mira_core::memory::{CreateMemoryOptions, SearchOptions};
use mira_core::working::buffer::OVERFLOW_TAG;
use mira_core::{ManualClock, MemoryType, MessageRole, Mira, MiraConfig};
use tempfile::{TempDir, tempdir};

const START_MS: i64 = 1_700_000_000_000;

fn create_engine() -> (Mira, Arc<ManualClock>, TempDir) {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let clock = Arc::new(ManualClock::new(START_MS));
    let mira = Mira::open(
        temp_dir.path().join("mira.db"),
        MiraConfig::default(),
        clock.clone(),
    )
    .expect("failed to open engine");
    (mira, clock, temp_dir)
}

fn episodic(importance: f64) -> CreateMemoryOptions {
    CreateMemoryOptions::new(MemoryType::Episodic, importance)
}

#[test]
fn importance_ranks_but_does_not_change_decay() {
    let (mira, clock, _temp_dir) = create_engine();

    mira.remember("u1", "walked along the river", episodic(0.5))
        .expect("remember failed");
    let important = mira
        .remember("u1", "got the job offer", episodic(0.9))
        .expect("remember failed");
    mira.remember("u1", "had pasta for lunch", episodic(0.5))
        .expect("remember failed");

    clock.advance_days(14.0);

    let strongest = mira
        .store()
        .get_strongest_memories("u1", 10)
        .expect("strongest failed");
    assert_eq!(strongest.len(), 3);
    assert_eq!(strongest[0].id, important.id);
    for memory in &strongest {
        assert!((memory.strength - 0.25).abs() < 1e-9);
    }
}

#[test]
fn episodic_memory_is_gone_after_forget_horizon() {
    let (mira, clock, _temp_dir) = create_engine();
    let memory = mira
        .remember("u1", "parked on level 3", episodic(0.9))
        .expect("remember failed");

    clock.advance_days(23.0);
    assert!(
        mira.store()
            .get_memory(&memory.id, false)
            .expect("get failed")
            .is_some()
    );
    assert_eq!(mira.recall("u1", "parked", 10).expect("recall failed").len(), 1);

    clock.advance_days(0.5);
    assert!(mira.recall("u1", "parked", 10).expect("recall failed").is_empty());
    assert!(
        mira.store()
            .get_memory(&memory.id, false)
            .expect("get failed")
            .is_none()
    );
    assert!(!mira.forget(&memory.id).expect("forget failed"));
}

#[test]
fn decay_cycle_is_idempotent() {
    let (mira, clock, _temp_dir) = create_engine();
    mira.remember("u1", "met Sam at the station", episodic(0.5))
        .expect("remember failed");
    let fact = mira
        .remember(
            "u1",
            "Sam is vegetarian",
            CreateMemoryOptions::new(MemoryType::Semantic, 0.8),
        )
        .expect("remember failed");

    clock.advance_days(30.0);

    let first = mira.store().run_decay_cycle().expect("decay failed");
    assert_eq!(first.pruned, 1);
    let after_first = mira
        .store()
        .get_memory(&fact.id, false)
        .expect("get failed")
        .expect("semantic memory should survive");

    let second = mira.store().run_decay_cycle().expect("decay failed");
    assert_eq!(second.pruned, 0);
    let after_second = mira
        .store()
        .get_memory(&fact.id, false)
        .expect("get failed")
        .expect("semantic memory should survive");

    assert_eq!(after_first.strength, after_second.strength);
    assert!((after_second.strength - 0.5).abs() < 1e-9);
}

#[test]
fn overflowing_segment_promotes_important_turns() {
    let (mira, _clock, _temp_dir) = create_engine();

    for i in 0..60 {
        let importance = if i % 4 == 0 { 0.8 } else { 0.3 };
        mira.working()
            .add_message(
                "u1",
                MessageRole::User,
                &format!("turn {:02}", i),
                importance,
                None,
            )
            .expect("add_message failed");
    }

    let segment = mira
        .working()
        .current_segment("u1")
        .expect("context should exist");
    assert_eq!(segment.messages.len(), 50);
    assert_eq!(segment.messages[0].content, "turn 10");

    let promoted = mira
        .store()
        .search_memories(
            "u1",
            "turn",
            SearchOptions::with_limit(20).tagged(OVERFLOW_TAG),
        )
        .expect("search failed");
    let mut contents: Vec<&str> = promoted.iter().map(|m| m.content.as_str()).collect();
    contents.sort();
    assert_eq!(contents, vec!["turn 00", "turn 04", "turn 08"]);
}

#[test]
fn collapsing_twice_yields_one_summary() {
    let (mira, _clock, _temp_dir) = create_engine();
    mira.process_user_message("u1", "any good coffee nearby?", 0.5)
        .expect("turn failed");

    assert!(
        mira.working()
            .collapse_segment("u1")
            .expect("collapse failed")
            .is_some()
    );
    assert!(
        mira.working()
            .collapse_segment("u1")
            .expect("collapse failed")
            .is_none()
    );
    assert_eq!(
        mira.store()
            .get_memory_stats("u1")
            .expect("stats failed")
            .semantic,
        1
    );
}

#[test]
fn tool_expires_exactly_after_ttl_turns() {
    let (mira, _clock, _temp_dir) = create_engine();

    let turn = mira
        .process_user_message("u1", "what's the weather forecast", 0.5)
        .expect("turn failed");
    assert_eq!(turn.activated_tools, vec!["weather".to_string()]);

    for _ in 0..5 {
        let turn = mira.process_user_message("u1", "ok", 0.5).expect("turn failed");
        assert!(turn.expired_tools.is_empty());
    }

    let turn = mira.process_user_message("u1", "ok", 0.5).expect("turn failed");
    assert_eq!(turn.expired_tools, vec!["weather".to_string()]);

    let active: Vec<String> = mira
        .tools()
        .get_active_tools("u1")
        .expect("active tools failed")
        .into_iter()
        .map(|t| t.definition.name)
        .collect();
    assert_eq!(active, vec!["memory".to_string(), "time".to_string()]);
}

#[test]
fn long_pause_does_not_expire_tools() {
    let (mira, clock, _temp_dir) = create_engine();
    mira.process_user_message("u1", "what's the weather forecast", 0.5)
        .expect("turn failed");
    mira.process_user_message("u1", "thanks", 0.5).expect("turn failed");

    clock.advance_days(0.25);
    let report = mira.events().force_sleep_cycle().expect("sleep failed");
    assert!(report.expired_tools.is_empty());

    let turn = mira.process_user_message("u1", "back again", 0.5).expect("turn failed");
    assert!(turn.expired_tools.is_empty());
    assert!(turn.context.contains("- weather: "));
}

#[test]
fn always_active_tools_survive_everything() {
    let (mira, clock, _temp_dir) = create_engine();
    mira.process_assistant_response("u1", "it is 9am", &["time".to_string()])
        .expect("response failed");

    assert!(!mira.tools().deactivate_tool("u1", "time").expect("deactivate failed"));
    for _ in 0..10 {
        mira.process_user_message("u1", "ok", 0.5).expect("turn failed");
    }
    clock.advance_days(1.0);
    assert!(
        mira.tools()
            .deactivate_expired_tools()
            .expect("sweep failed")
            .is_empty()
    );

    let active = mira.tools().get_active_tools("u1").expect("active tools failed");
    assert!(active.iter().any(|t| t.definition.name == "time" && t.total_uses == 1));
}

#[test]
fn tools_used_together_are_suggested() {
    let (mira, _clock, _temp_dir) = create_engine();
    mira.process_user_message("u1", "find a route to the shop, and check the weather", 0.5)
        .expect("turn failed");
    mira.process_assistant_response(
        "u1",
        "Take the 12 bus, it will rain later",
        &["maps".to_string(), "weather".to_string()],
    )
    .expect("response failed");

    assert_eq!(
        mira.tools()
            .get_suggested_tools("u1", "maps")
            .expect("suggestions failed"),
        vec!["weather".to_string()]
    );
}

#[test]
fn formatted_context_combines_all_sections() {
    let (mira, _clock, _temp_dir) = create_engine();
    mira.remember("u1", "prefers oat milk", CreateMemoryOptions::new(MemoryType::Semantic, 0.8))
        .expect("remember failed");

    let turn = mira
        .process_user_message("u1", "order my usual coffee", 0.5)
        .expect("turn failed");

    assert_eq!(turn.activated_tools, vec!["shopping".to_string()]);
    assert_eq!(turn.messages.len(), 1);
    assert_eq!(turn.messages[0].content, "order my usual coffee");
    assert!(turn.context.starts_with("Recent conversation:\n- user: order my usual coffee"));
    assert!(turn.context.contains("Relevant memories:"));
    assert!(turn.context.contains("prefers oat milk"));
    assert!(turn.context.contains("- shopping: "));
    assert!(turn.context.contains("- memory: "));
    assert!(turn.context.contains("Working memory: 1 messages in current segment (topic: coffee)"));
}

#[test]
fn turn_context_carries_prior_turns() {
    let (mira, _clock, _temp_dir) = create_engine();
    mira.process_user_message("u1", "book a table for friday", 0.5)
        .expect("turn failed");
    mira.process_assistant_response("u1", "Booked for 7pm", &[])
        .expect("response failed");

    let turn = mira
        .process_user_message("u1", "make it 8pm instead", 0.5)
        .expect("turn failed");

    let contents: Vec<&str> = turn.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["book a table for friday", "Booked for 7pm", "make it 8pm instead"]
    );
    assert!(turn.context.contains("- assistant: Booked for 7pm\n- user: make it 8pm instead"));
}

#[test]
fn idle_conversation_is_consolidated_by_sleep_cycle() {
    let (mira, clock, _temp_dir) = create_engine();
    mira.process_user_message("u1", "my passport expires in March", 0.9)
        .expect("turn failed");
    mira.process_assistant_response("u1", "Noted, I'll keep that in mind", &[])
        .expect("response failed");

    clock.advance_days(0.25);
    let report = mira.events().force_sleep_cycle().expect("sleep failed");
    assert_eq!(report.collapsed, vec!["u1".to_string()]);

    let found = mira.recall("u1", "passport", 10).expect("recall failed");
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|m| m.memory_type == MemoryType::Episodic));
    assert!(found.iter().any(|m| m.has_tag("conversation_summary")));
}
