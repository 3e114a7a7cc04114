//! Well-known license identifiers.

/// `(id, display name, canonical URL)`, ids lowercase.
const LICENSES: &[(&str, &str, &str)] = &[
    ("apache-2.0", "Apache 2.0", "https://www.apache.org/licenses/LICENSE-2.0"),
    ("mit", "MIT License", "https://opensource.org/licenses/MIT"),
    ("bsd-3-clause", "BSD 3-Clause License", "https://opensource.org/licenses/BSD-3-Clause"),
    ("bsd-2-clause", "BSD 2-Clause License", "https://opensource.org/licenses/BSD-2-Clause"),
    ("gpl-3.0", "GPL 3.0", "https://www.gnu.org/licenses/gpl-3.0.html"),
    ("gpl-2.0", "GPL 2.0", "https://www.gnu.org/licenses/old-licenses/gpl-2.0.html"),
    ("lgpl-3.0", "LGPL 3.0", "https://www.gnu.org/licenses/lgpl-3.0.html"),
    ("lgpl-2.1", "LGPL 2.1", "https://www.gnu.org/licenses/old-licenses/lgpl-2.1.html"),
    ("cc-by-4.0", "Creative Commons Attribution 4.0", "https://creativecommons.org/licenses/by/4.0/"),
    (
        "cc-by-sa-4.0",
        "Creative Commons Attribution-ShareAlike 4.0",
        "https://creativecommons.org/licenses/by-sa/4.0/",
    ),
    (
        "cc-by-nc-4.0",
        "Creative Commons Attribution-NonCommercial 4.0",
        "https://creativecommons.org/licenses/by-nc/4.0/",
    ),
    (
        "cc0-1.0",
        "Creative Commons Zero v1.0 Universal",
        "https://creativecommons.org/publicdomain/zero/1.0/",
    ),
    ("unlicense", "The Unlicense", "https://unlicense.org/"),
    (
        "llama2",
        "Llama 2 Community License",
        "https://github.com/facebookresearch/llama/blob/main/LICENSE",
    ),
    (
        "llama3",
        "Llama 3 Community License",
        "https://github.com/meta-llama/llama-models/blob/main/models/llama3/LICENSE",
    ),
    (
        "llama3.1",
        "Llama 3.1 Community License",
        "https://github.com/meta-llama/llama-models/blob/main/models/llama3_1/LICENSE",
    ),
    (
        "llama3.2",
        "Llama 3.2 Community License",
        "https://github.com/meta-llama/llama-models/blob/main/models/llama3_2/LICENSE",
    ),
    (
        "llama3.3",
        "Llama 3.3 Community License",
        "https://github.com/meta-llama/llama-models/blob/main/models/llama3_3/LICENSE",
    ),
    (
        "llama4",
        "Llama 4 Community License",
        "https://github.com/meta-llama/llama-models/blob/main/models/llama4/LICENSE",
    ),
    (
        "bigscience-openrail-m",
        "BigScience OpenRAIL-M",
        "https://huggingface.co/spaces/bigscience/license",
    ),
    ("openrail", "OpenRAIL", "https://www.licenses.ai/ai-licenses"),
    ("gemma", "Gemma", "https://ai.google.dev/gemma/terms"),
];

fn lookup(license_id: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    let id = license_id.trim().to_lowercase();
    LICENSES.iter().find(|(known, _, _)| *known == id)
}

/// Canonical URL for a known license id, case-insensitive.
pub fn license_url(license_id: &str) -> Option<&'static str> {
    lookup(license_id).map(|(_, _, url)| *url)
}

/// Display name for a license id, or the trimmed id when it is not known.
pub fn human_readable_license_name(license_id: &str) -> String {
    match lookup(license_id) {
        Some((_, name, _)) => (*name).to_string(),
        None => license_id.trim().to_string(),
    }
}
