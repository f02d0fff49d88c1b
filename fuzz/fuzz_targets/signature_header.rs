#![no_main]

use libfuzzer_sys::fuzz_target;
use ota_codesigning::{parse_dictionary, quote_string, SignatureHeaderInfo};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let _ = SignatureHeaderInfo::parse(raw);

    if let Ok(dictionary) = parse_dictionary(raw, true) {
        // Every returned value is a string and must survive re-serialization.
        for (key, value) in dictionary {
            let reparsed = parse_dictionary(&format!("{key}={}", quote_string(&value)), false)
                .expect("quoted value parses");
            assert_eq!(reparsed.get(&key), Some(&value));
        }
    }
});
