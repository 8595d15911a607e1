//! Pure derivation of the action set a caller may take on an event. The
//! contract is the real enforcer; these rules exist so the client never
//! submits a transaction it already knows will revert.

use crate::aggregator::EventSummary;
use alloy::primitives::{
    Address,
    U256,
};

/// Lifecycle of a single event, ordinal-compatible with the contract's
/// enumeration. The ordering is total: state only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventState {
    Open,
    WinnersSelected,
    Completed,
}

impl EventState {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(EventState::Open),
            1 => Some(EventState::WinnersSelected),
            2 => Some(EventState::Completed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventState::Open => "Open",
            EventState::WinnersSelected => "Winners Selected",
            EventState::Completed => "Completed",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub is_organizer: bool,
    pub can_register: bool,
    pub can_fund: bool,
    pub can_select_winners: bool,
    pub can_disburse: bool,
    pub can_withdraw: bool,
}

/// `caller` is `None` while no wallet is connected. Registration closes once
/// the caller registered, winners were chosen, or the caller organizes the
/// event; funding happens at most once; selection needs a large enough pool;
/// disbursement needs fixed winners and funds; withdrawal is terminal
/// cleanup gated on a residual balance.
pub fn permissions(event: &EventSummary, caller: Option<Address>) -> PermissionSet {
    let connected = caller.is_some();
    let is_organizer = caller.is_some_and(|account| account == event.organizer);

    PermissionSet {
        is_organizer,
        can_register: connected
            && !event.is_user_registered
            && event.state == EventState::Open
            && !is_organizer,
        can_fund: is_organizer && !event.is_funded,
        can_select_winners: is_organizer
            && event.state == EventState::Open
            && event.participant_count() >= event.winner_count,
        can_disburse: is_organizer
            && event.state == EventState::WinnersSelected
            && event.is_funded,
        can_withdraw: is_organizer
            && event.state == EventState::Completed
            && event.is_funded
            && event.contract_balance > U256::ZERO,
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn event() -> EventSummary {
        EventSummary {
            address: Address::from([0x10; 20]),
            name: "Launch Party".to_string(),
            organizer: Address::from([0x20; 20]),
            token_address: Address::ZERO,
            prize_amount: U256::from(1_000u64),
            winner_count: 2,
            state: EventState::Open,
            is_funded: false,
            participants: Vec::new(),
            winners: Vec::new(),
            contract_balance: U256::ZERO,
            is_user_registered: false,
            is_user_winner: false,
            token_symbol: "ETH".to_string(),
            token_decimals: 18,
        }
    }

    fn participants(n: u64) -> Vec<Address> {
        (0..n).map(|i| Address::from([i as u8 + 1; 20])).collect()
    }

    #[test]
    fn event_state__ordering_follows_the_lifecycle() {
        assert!(EventState::Open < EventState::WinnersSelected);
        assert!(EventState::WinnersSelected < EventState::Completed);
    }

    #[test]
    fn event_state__unknown_ordinals_are_rejected() {
        assert_eq!(EventState::from_raw(1), Some(EventState::WinnersSelected));
        assert_eq!(EventState::from_raw(3), None);
        assert_eq!(EventState::from_raw(255), None);
    }

    #[test]
    fn can_select_winners__exhaustive_over_all_eight_corners() {
        for organizer_calls in [false, true] {
            for open in [false, true] {
                for enough_participants in [false, true] {
                    // given
                    let mut e = event();
                    e.state = if open {
                        EventState::Open
                    } else {
                        EventState::WinnersSelected
                    };
                    e.participants =
                        participants(if enough_participants { 2 } else { 1 });
                    let caller = if organizer_calls {
                        Some(e.organizer)
                    } else {
                        Some(Address::from([0x99; 20]))
                    };

                    // when
                    let perms = permissions(&e, caller);

                    // then
                    assert_eq!(
                        perms.can_select_winners,
                        organizer_calls && open && enough_participants,
                        "corner organizer={organizer_calls} open={open} \
                         enough={enough_participants}"
                    );
                }
            }
        }
    }

    #[test]
    fn can_register__requires_open_state_and_a_connected_bystander() {
        let open = event();

        // a connected bystander may register
        assert!(permissions(&open, Some(Address::from([0x99; 20]))).can_register);
        // nobody registers while disconnected
        assert!(!permissions(&open, None).can_register);
        // the organizer never registers for their own raffle
        assert!(!permissions(&open, Some(open.organizer)).can_register);

        // registration is one-shot
        let mut registered = event();
        registered.is_user_registered = true;
        assert!(
            !permissions(&registered, Some(Address::from([0x99; 20]))).can_register
        );

        // and closes once winners are chosen
        let mut decided = event();
        decided.state = EventState::WinnersSelected;
        assert!(!permissions(&decided, Some(Address::from([0x99; 20]))).can_register);
    }

    #[test]
    fn can_fund__is_organizer_only_and_one_shot() {
        let e = event();
        assert!(permissions(&e, Some(e.organizer)).can_fund);
        assert!(!permissions(&e, Some(Address::from([0x99; 20]))).can_fund);

        let mut funded = event();
        funded.is_funded = true;
        assert!(!permissions(&funded, Some(funded.organizer)).can_fund);
    }

    #[test]
    fn can_disburse__needs_selected_winners_and_funding() {
        let mut e = event();
        e.state = EventState::WinnersSelected;
        e.is_funded = true;
        assert!(permissions(&e, Some(e.organizer)).can_disburse);

        e.is_funded = false;
        assert!(!permissions(&e, Some(e.organizer)).can_disburse);

        e.is_funded = true;
        e.state = EventState::Open;
        assert!(!permissions(&e, Some(e.organizer)).can_disburse);
    }

    #[test]
    fn can_withdraw__is_false_whenever_the_balance_is_zero() {
        for state in [
            EventState::Open,
            EventState::WinnersSelected,
            EventState::Completed,
        ] {
            for funded in [false, true] {
                let mut e = event();
                e.state = state;
                e.is_funded = funded;
                e.contract_balance = U256::ZERO;
                assert!(!permissions(&e, Some(e.organizer)).can_withdraw);
            }
        }

        let mut e = event();
        e.state = EventState::Completed;
        e.is_funded = true;
        e.contract_balance = U256::from(1u64);
        assert!(permissions(&e, Some(e.organizer)).can_withdraw);
    }

    #[test]
    fn permissions__case_variant_addresses_identify_the_same_organizer() {
        // given: the same organizer address parsed from differently cased hex
        let mut e = event();
        e.organizer = "0x82a88dECbAeE6953d5349513466D084fb4E35031".parse().unwrap();
        let lowered: Address =
            "0x82a88decbaee6953d5349513466d084fb4e35031".parse().unwrap();

        // when / then
        assert!(permissions(&e, Some(lowered)).is_organizer);
    }
}
