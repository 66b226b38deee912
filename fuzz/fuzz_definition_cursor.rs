//! Fuzz target for the token scanner behind jump-to-definition.
//!
//! Run with: cargo +nightly fuzz run fuzz_definition_cursor
//!
//! The first two bytes pick the cursor; the rest is the buffer. The buffer
//! lives outside any workspace, so every lookup that gets past the scanner
//! ends in `NotInWorkspace`.

#![no_main]

use bzlnav_core::{
    BufferSnapshot, BuildFileFinder, Cursor, DefinitionError, DefinitionFinder,
    WorkspaceLocator,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return;
    };
    let Ok(text) = std::str::from_utf8(&data[2..]) else {
        return;
    };
    let cursor = Cursor::new(data[0] as usize % 8 + 1, data[1] as usize);
    let snapshot = BufferSnapshot::from_text("/bzlnav-fuzz/BUILD", text, cursor);
    let finder = BuildFileFinder::new(
        WorkspaceLocator::new(["bzlnav-fuzz-no-such-marker"]),
        vec!["BUILD".to_string()],
    );

    match runtime.block_on(finder.find_definition(&snapshot)) {
        Ok(None)
        | Err(DefinitionError::NotInWorkspace(_))
        | Err(DefinitionError::Syntax { .. })
        | Err(DefinitionError::CursorOutOfRange { .. }) => {}
        other => panic!("unexpected lookup result {other:?}"),
    }
});
