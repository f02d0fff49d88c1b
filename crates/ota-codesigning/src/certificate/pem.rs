//! Splitting PEM bundles into individual certificates.

/// Opening marker of a PEM certificate block.
pub const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";

/// Closing marker of a PEM certificate block.
pub const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// Iterator over the certificate blocks of a PEM bundle, in order.
///
/// Each item spans from a begin marker to the next end marker, markers
/// included. An unterminated trailing block ends the iteration. Cloning the
/// iterator restarts from the same position.
#[derive(Debug, Clone)]
pub struct PemCertificates<'a> {
    remaining: &'a str,
}

impl<'a> Iterator for PemCertificates<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.remaining.find(BEGIN_CERTIFICATE)?;
        let after_begin = start + BEGIN_CERTIFICATE.len();
        let Some(end_offset) = self.remaining[after_begin..].find(END_CERTIFICATE) else {
            tracing::warn!("ignoring unterminated certificate block at end of PEM bundle");
            self.remaining = "";
            return None;
        };
        let end = after_begin + end_offset + END_CERTIFICATE.len();
        let block = &self.remaining[start..end];
        self.remaining = &self.remaining[end..];
        Some(block)
    }
}

/// Iterate the certificate blocks of `bundle` without copying them.
pub fn pem_certificates(bundle: &str) -> PemCertificates<'_> {
    PemCertificates { remaining: bundle }
}

/// Split a PEM bundle into its certificate blocks, in order of appearance.
///
/// Text outside markers is skipped; a block with no end marker is dropped.
pub fn separate_certificate_chain(bundle: &str) -> Vec<String> {
    pem_certificates(bundle).map(str::to_string).collect()
}
