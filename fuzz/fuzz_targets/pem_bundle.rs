#![no_main]

use libfuzzer_sys::fuzz_target;
use ota_codesigning::{separate_certificate_chain, CertificateChain};

fuzz_target!(|data: &[u8]| {
    let Ok(bundle) = std::str::from_utf8(data) else {
        return;
    };

    let blocks = separate_certificate_chain(bundle);
    if let Ok(chain) = CertificateChain::build(&blocks) {
        let _ = chain.code_signing_certificate();
    }
});
