#![allow(non_snake_case)]

use alloy::primitives::U256;
use proptest::prelude::*;
use raffyl::{
    format_token_amount,
    parse_token_amount,
};

#[test]
fn amounts__the_documented_vectors_hold() {
    // given / when / then
    assert_eq!(
        format_token_amount(U256::from(1_000_000_000_000_000_000u128), 18),
        "1"
    );
    assert_eq!(
        parse_token_amount("1", 18).unwrap(),
        U256::from(1_000_000_000_000_000_000u128)
    );
    assert_eq!(format_token_amount(U256::from(1_500_000u64), 6), "1.5");
}

proptest! {
    // Any minor-unit amount survives a format/parse round trip at the
    // precisions the known tokens use.
    #[test]
    fn amounts__format_then_parse_roundtrips(
        amount in any::<u128>(),
        decimals in prop_oneof![Just(0u8), Just(6u8), Just(18u8)],
    ) {
        let value = U256::from(amount);
        let text = format_token_amount(value, decimals);
        let parsed = parse_token_amount(&text, decimals).unwrap();
        prop_assert_eq!(parsed, value);
    }

    // Formatting never emits a trailing zero fraction or a dangling dot.
    #[test]
    fn amounts__formatting_is_canonical(
        amount in any::<u128>(),
        decimals in prop_oneof![Just(6u8), Just(18u8)],
    ) {
        let text = format_token_amount(U256::from(amount), decimals);
        prop_assert!(!text.ends_with('.'));
        if let Some((_, fraction)) = text.split_once('.') {
            prop_assert!(!fraction.is_empty());
            prop_assert!(!fraction.ends_with('0'));
        }
    }
}
