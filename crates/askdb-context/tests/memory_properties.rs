mod common;

use std::sync::Arc;

use askdb_context::{
    CompactionOutcome, Exchange, GeneratedAnswer, MemoryConfig, NewMessage,
};
use askdb_persist::{MessageRecord, MessageRole, PersistenceClient};
use common::{memory_manager, manager_with, FakeSummarizer};

fn exchange(i: usize) -> Exchange {
    Exchange {
        question: format!("question {}", i),
        answer: GeneratedAnswer {
            content_markdown: format!("answer {}", i),
            ..Default::default()
        },
    }
}

fn roomy_config() -> MemoryConfig {
    MemoryConfig {
        compaction_threshold: 1_000,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_history_alternates_in_order() {
    let store = Arc::new(askdb_persist::MemoryPersistenceClient::new());
    let manager = manager_with(store, Arc::new(FakeSummarizer::default()), roomy_config());
    let id = manager.create_conversation(None, None).await.unwrap();

    for i in 0..25 {
        manager.record_exchange(&id, exchange(i)).await.unwrap();
    }

    let history = manager.get_history(&id).await.unwrap();
    assert_eq!(history.len(), 50);
    for (i, message) in history.iter().enumerate() {
        let expected = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
        assert_eq!(message.role, expected);
    }
    for pair in history.windows(2) {
        assert!(pair[0].created_at < pair[1].created_at);
    }
    assert_eq!(history[0].content_markdown, "question 0");
    assert_eq!(history[49].content_markdown, "answer 24");
}

#[tokio::test]
async fn test_eleventh_message_triggers_one_compaction() {
    let summarizer = Arc::new(FakeSummarizer::default());
    let (manager, store) = memory_manager(summarizer.clone());
    let id = manager.create_conversation(Some("Orders"), None).await.unwrap();

    for i in 0..10 {
        let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
        manager
            .add_message(&id, role, NewMessage::text(format!("m{}", i)))
            .await
            .unwrap();
        assert_eq!(
            manager.compact(&id).await,
            CompactionOutcome::NotNeeded { message_count: i + 1 }
        );
    }

    let eleventh = manager
        .add_message(&id, MessageRole::User, NewMessage::text("m10"))
        .await
        .unwrap();
    let outcome = manager.compact(&id).await;
    assert_eq!(
        outcome,
        CompactionOutcome::Compacted {
            summaries_created: 1,
            messages_removed: 10
        }
    );

    let history = manager.get_history(&id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, eleventh);
    assert_eq!(store.get_summaries(&id).await.unwrap().len(), 1);
    assert_eq!(summarizer.call_count(), 1);
    assert_eq!(summarizer.calls.lock().unwrap()[0][0], "USER: m0");
}

#[tokio::test]
async fn test_delete_unknown_is_noop() {
    let (manager, _store) = memory_manager(Arc::new(FakeSummarizer::default()));
    let kept = manager.create_conversation(None, None).await.unwrap();
    manager.record_exchange(&kept, exchange(0)).await.unwrap();

    manager.delete_conversation("conv_doesnotexist").await.unwrap();

    assert_eq!(manager.get_history(&kept).await.unwrap().len(), 2);
    assert_eq!(manager.list_conversations(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_removes_messages_and_summaries() {
    let (manager, store) = memory_manager(Arc::new(FakeSummarizer::default()));
    let id = manager.create_conversation(None, None).await.unwrap();
    for i in 0..6 {
        manager.record_exchange(&id, exchange(i)).await.unwrap();
    }
    assert_eq!(store.get_summaries(&id).await.unwrap().len(), 1);

    manager.delete_conversation(&id).await.unwrap();
    manager.delete_conversation(&id).await.unwrap();

    assert!(manager.get_history(&id).await.unwrap().is_empty());
    assert!(store.get_summaries(&id).await.unwrap().is_empty());
    assert!(!manager.conversation_exists(&id).await.unwrap());
    assert!(manager.build_context(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_context_window_is_bounded() {
    let store = Arc::new(askdb_persist::MemoryPersistenceClient::new());
    let manager = manager_with(store, Arc::new(FakeSummarizer::default()), roomy_config());
    let id = manager.create_conversation(None, None).await.unwrap();

    for m in [1usize, 3, 9, 40] {
        let id = manager.create_conversation(None, None).await.unwrap();
        for i in 0..m {
            let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
            manager
                .add_message(&id, role, NewMessage::text(format!("m{}", i)))
                .await
                .unwrap();
        }
        let window = manager.build_context(&id).await.unwrap();
        assert_eq!(window.recent_messages.len(), m.min(6));
        assert_eq!(
            window.recent_messages.last().unwrap().content_markdown,
            format!("m{}", m - 1)
        );
    }

    assert!(manager.build_context(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_context_includes_every_summary() {
    let (manager, _store) = memory_manager(Arc::new(FakeSummarizer::default()));
    let id = manager.create_conversation(None, None).await.unwrap();
    // 21 pairs: compactions at pairs 6, 11, 16 and 21
    for i in 0..21 {
        manager.record_exchange(&id, exchange(i)).await.unwrap();
    }

    let window = manager.build_context(&id).await.unwrap();
    assert_eq!(window.summaries.len(), 4);
    assert_eq!(window.recent_messages.len(), 2);
    for pair in window.summaries.windows(2) {
        assert!(pair[0].created_at < pair[1].created_at);
    }

    let rendered = window.render_history(&manager.config().history_render_options());
    assert_eq!(rendered.matches("SUMMARY: ").count(), 3);
    assert!(rendered.ends_with("USER: question 20\nASSISTANT: answer 20"));
}

#[tokio::test]
async fn test_failing_summarizer_leaves_history_untouched() {
    let summarizer = Arc::new(FakeSummarizer::failing());
    let (manager, store) = memory_manager(summarizer.clone());
    let id = manager.create_conversation(None, None).await.unwrap();

    for i in 0..5 {
        manager.record_exchange(&id, exchange(i)).await.unwrap();
    }
    let outcome = manager.record_exchange(&id, exchange(5)).await.unwrap();

    assert!(matches!(outcome.compaction, CompactionOutcome::Skipped { .. }));
    assert_eq!(store.count_messages(&id).await.unwrap(), 12);
    assert!(store.get_summaries(&id).await.unwrap().is_empty());
    assert_eq!(summarizer.call_count(), 1);
}

#[tokio::test]
async fn test_compaction_recovers_after_summarizer_returns() {
    let summarizer = Arc::new(FakeSummarizer::failing());
    let (manager, store) = memory_manager(summarizer.clone());
    let id = manager.create_conversation(None, None).await.unwrap();
    for i in 0..6 {
        manager.record_exchange(&id, exchange(i)).await.unwrap();
    }

    summarizer.fail.store(false, std::sync::atomic::Ordering::SeqCst);
    let outcome = manager.record_exchange(&id, exchange(6)).await.unwrap();

    // 14 messages: one pass brings it to 4
    assert_eq!(outcome.compaction.messages_removed(), 10);
    assert_eq!(store.count_messages(&id).await.unwrap(), 4);
    assert_eq!(store.get_summaries(&id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupt_chart_payload_reads_back_empty() {
    let (manager, store) = memory_manager(Arc::new(FakeSummarizer::default()));
    let id = manager.create_conversation(None, None).await.unwrap();

    let mut record = MessageRecord::new(
        "msg_corrupt00001".into(),
        id.clone(),
        MessageRole::Assistant,
        "Revenue grew 12%. {{chart:c1}}".into(),
        &[],
        None,
        chrono::Utc::now(),
    )
    .unwrap();
    record.charts_json = "[{\"id\": \"c1\", ".into();
    store.append_messages(vec![record]).await.unwrap();

    let history = manager.get_history(&id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].charts.is_empty());
    assert_eq!(history[0].content_markdown, "Revenue grew 12%. {{chart:c1}}");

    let window = manager.build_context(&id).await.unwrap();
    assert!(window.recent_messages[0].charts.is_empty());
}
