#![no_main]
use fafreplay::{load_scfa_replay_from_slice, ReplayLoadingStage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let one_shot = load_scfa_replay_from_slice(data);

    // Decoding in small batches must agree with decoding all at once
    let mut stage = ReplayLoadingStage::scfa(data.to_vec());
    let staged = loop {
        match stage.process(3) {
            Ok(ReplayLoadingStage::Complete(x)) => break Ok(x.into_replay()),
            Ok(next) => stage = next,
            Err(e) => break Err(e),
        }
    };

    match (one_shot, staged) {
        (Ok(a), Ok(b)) => assert_eq!(a.body.user_input.len(), b.body.user_input.len()),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("mismatch: {:?} vs {:?}", a.is_ok(), b.is_ok()),
    }
});
