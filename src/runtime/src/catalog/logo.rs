//! Embedded catalog logos.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const MODEL_LOGO: &[u8] = include_bytes!("../../assets/catalog-model.svg");
const VALIDATED_MODEL_LOGO: &[u8] = include_bytes!("../../assets/catalog-validated_model.svg");

/// Tag selecting the validated logo.
pub const VALIDATED_TAG: &str = "validated";

/// Logo data URI for a model with `tags`.
pub fn logo_for_tags<S: AsRef<str>>(tags: &[S]) -> String {
    let validated = tags
        .iter()
        .any(|tag| tag.as_ref().trim().eq_ignore_ascii_case(VALIDATED_TAG));

    if validated {
        svg_data_uri(VALIDATED_MODEL_LOGO)
    } else {
        svg_data_uri(MODEL_LOGO)
    }
}

pub fn svg_data_uri(svg: &[u8]) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_logo() {
        let logo = logo_for_tags(&[" Validated ", "featured"]);
        assert_eq!(logo, svg_data_uri(VALIDATED_MODEL_LOGO));
        assert!(logo.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_default_logo() {
        assert_eq!(logo_for_tags(&["featured"]), svg_data_uri(MODEL_LOGO));
        assert_eq!(logo_for_tags::<&str>(&[]), svg_data_uri(MODEL_LOGO));
        assert_ne!(svg_data_uri(MODEL_LOGO), svg_data_uri(VALIDATED_MODEL_LOGO));
    }
}
