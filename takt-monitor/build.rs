//! Build script for takt-monitor
//!
//! Checks that the embedded monitor.toml is valid TOML and has the
//! sections the loader expects.

use std::fs;
use std::path::Path;

const SECTIONS: [&str; 4] = ["lines", "timing", "interlock", "logging"];

fn main() {
    println!("cargo:rerun-if-changed=monitor.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let path = Path::new("monitor.toml");
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => panic!("\n  ERROR: failed to read monitor.toml: {e}\n"),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!("\n  ERROR: invalid TOML in monitor.toml:\n  {e}\n"),
    };

    for section in SECTIONS {
        match config.get(section) {
            Some(toml::Value::Table(_)) => {}
            Some(_) => panic!("\n  ERROR: monitor.toml: [{section}] must be a table\n"),
            None => println!("cargo:warning=monitor.toml has no [{section}] section, defaults apply"),
        }
    }
}
