use std::fs;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn settings_export() {
    print!("{}", smt_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        smt_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: weights.lm={}, weights.translation={}, weights.length={}, search.n_most_likely={}",
        s.weights.lm, s.weights.translation, s.weights.length, s.search.n_most_likely
    );
}

/// Install a custom settings file before anything reads the defaults.
pub fn load_settings(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(
        smt_core::settings::init_custom(content),
        "Error in {file}: {}"
    );
}
