#![no_main]

use kiro_bridge::InboundEvent;
use kiro_telegram::parse_update;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match parse_update(data) {
        Ok(event) => {
            assert!(!event.conversation_id().is_empty());
            match event {
                InboundEvent::Message(message) => assert!(!message.text.trim().is_empty()),
                InboundEvent::Selection(selection) => {
                    assert!(!selection.token.trim().is_empty())
                }
            }
        }
        Err(error) => assert_eq!(error.reason_code(), "malformed_event"),
    }
});
