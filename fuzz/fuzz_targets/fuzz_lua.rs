#![no_main]
use fafreplay::{read_lua_data, ReplayReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = ReplayReader::new(data);
    if read_lua_data(&mut reader).is_ok() {
        assert!(reader.position() <= data.len());
    }
});
