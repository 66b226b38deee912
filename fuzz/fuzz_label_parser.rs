//! Fuzz target for build label parsing.
//!
//! Run with: cargo +nightly fuzz run fuzz_label_parser
//!
//! The first byte splits the input into a label and a package.

#![no_main]

use bzlnav_core::BuildLabel;
use libfuzzer_sys::fuzz_target;

fn check(label: &BuildLabel) {
    let text = label.as_str();
    assert_eq!(format!("{}:{}", label.package(), label.target()), text);
    assert!(!label.target().is_empty());
    assert!(!text.chars().any(char::is_whitespace));
    // Canonical text parses back to itself.
    let again = BuildLabel::parse(text).expect("canonical label reparses");
    assert_eq!(again.as_str(), text);
}

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (Ok(text), Ok(package)) = (
        std::str::from_utf8(&rest[..split]),
        std::str::from_utf8(&rest[split..]),
    ) else {
        return;
    };

    if let Ok(label) = BuildLabel::parse(text) {
        check(&label);
    }
    let package = BuildLabel::package_of(package);
    if let Ok(label) = BuildLabel::resolve_relative(text, &package) {
        check(&label);
    }
});
