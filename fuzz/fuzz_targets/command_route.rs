#![no_main]

use kiro_bridge::{route_message, BridgeCommand, MessageRoute};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    match route_message(&text) {
        MessageRoute::Command(command) => {
            assert!(text.trim_start().starts_with('/'));
            if let BridgeCommand::Blocked { name } = command {
                assert_eq!(name, name.to_lowercase());
            }
        }
        MessageRoute::FreeForm => {}
    }
});
