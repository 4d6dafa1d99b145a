//! What each stage reveals, derived from the request and the service result.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use shared::domain::{Algorithm, AlgorithmFamily};

use super::pipeline::Stage;

pub const INPUT_PREVIEW_CHARS: usize = 50;
pub const HEX_PREVIEW_CHARS: usize = 64;
/// The output stage types at most this much; the full result goes to the
/// result surface.
pub const OUTPUT_PREVIEW_CHARS: usize = 100;
/// Shown in place of the real public key, which never leaves the service.
pub const RSA_ILLUSTRATIVE_MODULUS: &str = "A1B2C3D4E5F6789012345678901234567890ABCD";

const IV_SOURCE_CHARS: usize = 16;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

pub fn hex_preview(hex: &str) -> String {
    preview(hex, HEX_PREVIEW_CHARS)
}

/// Hex of the produced text. Base64 output is decoded first; anything else
/// (plaintext, filenames) is rendered from its raw bytes.
pub fn produced_hex(produced: &str) -> String {
    match STANDARD.decode(produced.trim()) {
        Ok(bytes) if !bytes.is_empty() => to_hex(&bytes),
        _ => to_hex(produced.as_bytes()),
    }
}

/// Base64 of sixteen random base36 characters. Illustrative only.
pub fn illustrative_iv(rng: &mut impl Rng) -> String {
    let raw: Vec<u8> = (0..IV_SOURCE_CHARS)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())])
        .collect();
    STANDARD.encode(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmDetails {
    pub key_size: &'static str,
    pub block_size: &'static str,
    pub mode: &'static str,
}

pub fn details_for(algorithm: Algorithm) -> AlgorithmDetails {
    match algorithm {
        Algorithm::Aes => AlgorithmDetails {
            key_size: "128-bit (16 bytes)",
            block_size: "16 bytes",
            mode: "CBC",
        },
        Algorithm::Des => AlgorithmDetails {
            key_size: "64-bit (8 bytes)",
            block_size: "8 bytes",
            mode: "CBC",
        },
        Algorithm::Rsa => AlgorithmDetails {
            key_size: "2048-bit",
            block_size: "n/a",
            mode: "OAEP",
        },
    }
}

/// Text revealed when `stage` becomes active.
pub fn stage_content(
    stage: Stage,
    family: AlgorithmFamily,
    input: &str,
    produced: &str,
    rng: &mut impl Rng,
) -> String {
    match (stage, family) {
        (Stage::Input, _) => preview(input, INPUT_PREVIEW_CHARS),
        (Stage::Padding, _) => hex_preview(&to_hex(input.as_bytes())),
        (Stage::Key, AlgorithmFamily::Symmetric) => illustrative_iv(rng),
        (Stage::Key, AlgorithmFamily::Asymmetric) => RSA_ILLUSTRATIVE_MODULUS.to_string(),
        (Stage::Encrypt, _) => hex_preview(&produced_hex(produced)),
        (Stage::Output, _) => preview(produced, OUTPUT_PREVIEW_CHARS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn preview_truncates_on_characters_not_bytes() {
        assert_eq!(preview("hello", 50), "hello");
        let long = "é".repeat(51);
        let shown = preview(&long, 50);
        assert_eq!(shown.chars().count(), 53);
        assert!(shown.ends_with("..."));
        assert_eq!(preview(&"a".repeat(50), 50), "a".repeat(50));
    }

    #[test]
    fn hex_is_uppercase_and_preview_capped() {
        assert_eq!(to_hex(b"Hi"), "4869");
        assert_eq!(to_hex(&[0xab, 0x01]), "AB01");
        let hex = to_hex(&[0u8; 40]);
        assert_eq!(hex.len(), 80);
        let shown = hex_preview(&hex);
        assert_eq!(shown.len(), HEX_PREVIEW_CHARS + 3);
    }

    #[test]
    fn produced_hex_decodes_base64_and_falls_back_to_raw_text() {
        assert_eq!(produced_hex("SGVsbG8="), "48656C6C6F");
        assert_eq!(produced_hex("hello world!"), to_hex(b"hello world!"));
    }

    #[test]
    fn illustrative_iv_is_base64_of_sixteen_base36_chars() {
        let mut rng = StdRng::seed_from_u64(3);
        let iv = illustrative_iv(&mut rng);
        let raw = STANDARD.decode(&iv).expect("base64");
        assert_eq!(raw.len(), 16);
        assert!(raw.iter().all(|b| BASE36.contains(b)));
    }

    #[test]
    fn stage_content_per_family() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            stage_content(
                Stage::Key,
                AlgorithmFamily::Asymmetric,
                "hi",
                "SGk=",
                &mut rng
            ),
            RSA_ILLUSTRATIVE_MODULUS
        );
        assert_eq!(
            stage_content(
                Stage::Padding,
                AlgorithmFamily::Symmetric,
                "hi",
                "SGk=",
                &mut rng
            ),
            "6869"
        );
        assert_eq!(
            stage_content(
                Stage::Output,
                AlgorithmFamily::Symmetric,
                "hi",
                "SGk=",
                &mut rng
            ),
            "SGk="
        );
    }

    #[test]
    fn long_output_is_shortened_like_the_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let produced = "Q".repeat(13_356);
        let shown = stage_content(
            Stage::Output,
            AlgorithmFamily::Symmetric,
            "a",
            &produced,
            &mut rng,
        );
        assert_eq!(shown.chars().count(), OUTPUT_PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn padding_hex_covers_utf8_bytes() {
        let mut rng = StdRng::seed_from_u64(1);
        let shown = stage_content(Stage::Padding, AlgorithmFamily::Symmetric, "é", "", &mut rng);
        assert_eq!(shown, "C3A9");
    }
}
