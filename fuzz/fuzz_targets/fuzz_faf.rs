#![no_main]
use fafreplay::{load_faf_replay_from_slice, ReplayLoadingStage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = load_faf_replay_from_slice(data);

    let mut stage = ReplayLoadingStage::new(data.to_vec());
    while !stage.is_terminal() {
        match stage.process(1000) {
            Ok(next) => stage = next,
            Err(_) => return,
        }
    }
});
