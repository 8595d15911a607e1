use alloy::{
    primitives::{
        Address,
        U256,
    },
    sol,
};
use anyhow::{
    Context,
    Result,
    bail,
};

pub mod boundary;
pub mod gateway;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

sol! {
    #[sol(rpc)]
    interface IEventFactory {
        event EventCreated(
            address indexed eventAddress,
            address indexed organizer,
            string name
        );

        function createEvent(
            string memory name,
            address tokenAddress,
            uint256 prizeAmount,
            uint256 winnerCount
        ) external returns (address eventAddress);

        function getAllEvents() external view returns (address[] memory events);

        function getEventsByOrganizer(
            address organizer
        ) external view returns (address[] memory events);
    }
}

sol! {
    #[sol(rpc)]
    interface IEvent {
        function name() external view returns (string memory);
        function organizer() external view returns (address);
        function prizeToken() external view returns (address);
        function prizeAmount() external view returns (uint256);
        function currentState() external view returns (uint8);
        function isFunded() external view returns (bool);
        function winnerCount() external view returns (uint256);
        function getContractBalance() external view returns (uint256);
        function getParticipants() external view returns (address[] memory);
        function getWinners() external view returns (address[] memory);
        function isRegistered(address account) external view returns (bool);
        function isWinner(address account) external view returns (bool);

        function getEventInfo()
            external
            view
            returns (
                string memory name,
                address organizer,
                address tokenAddress,
                uint256 prizeAmount,
                uint256 winnerCount,
                uint8 state,
                uint256 participantCount,
                bool isFunded
            );

        function register() external;
        function fundEvent(uint256 amount) external payable;
        function selectWinners() external;
        function disbursePrizes() external;
        function withdrawBalance() external;
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(
            address indexed owner,
            address indexed spender,
            uint256 value
        );

        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(
            address owner,
            address spender
        ) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(
            address from,
            address to,
            uint256 amount
        ) external returns (bool);
    }
}

/// Shortened `0x1234...abcd` rendition for status lines and tables.
pub fn format_address(address: Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn format_tx_hash(hash: alloy::primitives::B256) -> String {
    let full = format!("{hash:#x}");
    format!("{}...{}", &full[..10], &full[full.len() - 8..])
}

/// Renders a minor-unit amount as a decimal string, trimming trailing
/// fractional zeroes ("1", not "1.000000000000000000").
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let quotient = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return quotient.to_string();
    }

    let padded =
        format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');
    if trimmed.is_empty() {
        quotient.to_string()
    } else {
        format!("{quotient}.{trimmed}")
    }
}

/// Parses a decimal string into a minor-unit amount. Fractional digits past
/// the token's precision are truncated, never rounded up.
pub fn parse_token_amount(text: &str, decimals: u8) -> Result<U256> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        bail!("amount is empty");
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        bail!("amount '{text}' is not a decimal number");
    }

    let kept = &fraction[..fraction.len().min(decimals as usize)];
    let mut digits = String::from(if whole.is_empty() { "0" } else { whole });
    digits.push_str(kept);
    for _ in kept.len()..decimals as usize {
        digits.push('0');
    }

    U256::from_str_radix(&digits, 10)
        .with_context(|| format!("amount '{text}' does not fit into 256 bits"))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn wei(n: u128) -> U256 {
        U256::from(n)
    }

    #[test]
    fn format_token_amount__whole_amounts_have_no_fraction() {
        assert_eq!(format_token_amount(wei(1_000_000_000_000_000_000), 18), "1");
        assert_eq!(format_token_amount(wei(0), 18), "0");
        assert_eq!(format_token_amount(wei(25_000_000), 6), "25");
    }

    #[test]
    fn format_token_amount__trims_trailing_fractional_zeroes() {
        assert_eq!(format_token_amount(wei(1_500_000), 6), "1.5");
        assert_eq!(format_token_amount(wei(1_050_000), 6), "1.05");
        assert_eq!(format_token_amount(wei(1), 18), "0.000000000000000001");
    }

    #[test]
    fn parse_token_amount__scales_by_decimals() {
        // given / when / then
        assert_eq!(
            parse_token_amount("1", 18).unwrap(),
            wei(1_000_000_000_000_000_000)
        );
        assert_eq!(parse_token_amount("1.5", 6).unwrap(), wei(1_500_000));
        assert_eq!(parse_token_amount(".5", 6).unwrap(), wei(500_000));
        assert_eq!(parse_token_amount("0", 6).unwrap(), wei(0));
    }

    #[test]
    fn parse_token_amount__truncates_excess_fraction_digits() {
        assert_eq!(parse_token_amount("1.2345678", 6).unwrap(), wei(1_234_567));
    }

    #[test]
    fn parse_token_amount__rejects_garbage() {
        assert!(parse_token_amount("", 18).is_err());
        assert!(parse_token_amount(".", 18).is_err());
        assert!(parse_token_amount("1.2.3", 18).is_err());
        assert!(parse_token_amount("12a", 18).is_err());
        assert!(parse_token_amount("-4", 18).is_err());
    }

    #[test]
    fn format_address__keeps_prefix_and_suffix() {
        let address: Address =
            "0x82a88dECbAeE6953d5349513466D084fb4E35031".parse().unwrap();
        let short = format_address(address);
        assert!(short.starts_with("0x82a8"));
        assert!(short.ends_with("5031"));
        assert_eq!(short.len(), 6 + 3 + 4);
    }

    #[test]
    fn address_parsing__is_case_insensitive() {
        let checksummed: Address =
            "0x82a88dECbAeE6953d5349513466D084fb4E35031".parse().unwrap();
        let lowered: Address =
            "0x82a88decbaee6953d5349513466d084fb4e35031".parse().unwrap();
        assert_eq!(checksummed, lowered);
    }
}
