use std::sync::Arc;
use tbft_consensus::{Dispatcher, RecordingBus, TBFTMsg, SEND_CONSENSUS_MSG_TOPIC};
use tbft_state::ValidatorSet;

fn validators() -> Arc<ValidatorSet> {
    Arc::new(ValidatorSet::new(vec![
        ("A".into(), 1),
        ("B".into(), 1),
        ("C".into(), 1),
    ]))
}

/// Scenario 6 of spec §8: self = "B", validators = ["A", "B", "C"],
/// broadcast (`to = None`). Publications land on exactly {"A", "C"}.
#[tokio::test]
async fn broadcast_excludes_self_across_the_full_dispatch_path() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bus = Arc::new(RecordingBus::new());
    let dispatcher = Dispatcher::new("B".into(), validators(), bus.clone());

    dispatcher
        .send_consensus_msg(Some(TBFTMsg::Precommit(vec![9, 9, 9])), None)
        .await
        .unwrap();

    let published = bus.published();
    assert_eq!(published.len(), 2);
    assert!(published.iter().all(|(topic, _)| topic == SEND_CONSENSUS_MSG_TOPIC));

    let mut recipients: Vec<_> = published.into_iter().map(|(_, e)| e.to).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["A".to_string(), "C".to_string()]);
}
