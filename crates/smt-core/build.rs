const SETTINGS_PATH: &str = "src/default_settings.toml";

/// Keys `settings::parse_settings_toml` requires, by section.
const REQUIRED: &[(&str, &[&str])] = &[
    ("weights", &["lm", "translation", "length"]),
    ("search", &["n_most_likely", "max_segment_len", "length_bias"]),
    ("model", &["translation_floor", "unknown_word_log10_prob"]),
];

fn main() {
    println!("cargo:rerun-if-changed={SETTINGS_PATH}");
    check_settings(include_str!("src/default_settings.toml"));
}

fn check_settings(content: &str) {
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => panic!("{SETTINGS_PATH} contains invalid TOML: {e}"),
    };
    for (section, keys) in REQUIRED {
        let Some(toml::Value::Table(body)) = table.get(*section) else {
            panic!("{SETTINGS_PATH} is missing the [{section}] table");
        };
        for key in *keys {
            if !body.contains_key(*key) {
                panic!("{SETTINGS_PATH} is missing {section}.{key}");
            }
        }
    }
}
