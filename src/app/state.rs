use crate::{
    chain::{ConnectionStatus, SigningKey, TxHandle, UnsignedCall},
    protocol::{Element, ElementKey, VElem},
};
use alloy::primitives::{Address, Bytes};

/// Browser state. Owned and mutated only by the dispatcher thread.
#[derive(Debug, Default)]
pub struct State {
    pub chain: ChainState,
    pub tab: TabState,
}

impl State {
    pub fn new(signing_key: Option<SigningKey>) -> Self {
        let account = NamedAddress {
            address: signing_key
                .as_ref()
                .map(SigningKey::address)
                .unwrap_or(Address::ZERO),
            ..NamedAddress::default()
        };
        Self {
            chain: ChainState {
                account,
                connection: ConnectionStatus::default(),
                signing_key,
            },
            tab: TabState::default(),
        }
    }

    /// Owned, read-only copy for the terminal thread. Leaves the key behind.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            chain: ChainView {
                account: self.chain.account.clone(),
                connection: self.chain.connection.clone(),
                logged_in: self.chain.signing_key.is_some(),
            },
            tab: self.tab.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChainState {
    pub account: NamedAddress,
    pub connection: ConnectionStatus,
    pub signing_key: Option<SigningKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedAddress {
    pub address: Address,
    pub name: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Empty,
    Resolving,
    Resolved(Address),
    ResolutionFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabState {
    /// Raw text from the URL bar.
    pub entered_address: String,
    pub resolved_contract: Option<Address>,
    /// Navigation, render, decode or transaction failure. Hides the app.
    pub load_error_text: Option<String>,
    /// Submit failure, shown alongside the app.
    pub app_error_text: Option<String>,
    pub app_state: Bytes,
    pub elements: Vec<VElem>,
    pub inputs: Inputs,
    pub proposed_transaction: Option<UnsignedCall>,
    pub pending_transaction: Option<TxHandle>,
}

impl TabState {
    pub fn navigating(entered_address: &str) -> Self {
        Self {
            entered_address: entered_address.to_string(),
            ..Self::default()
        }
    }

    pub fn status(&self) -> TabStatus {
        match (self.resolved_contract, &self.load_error_text) {
            (Some(contract), _) => TabStatus::Resolved(contract),
            _ if self.entered_address.is_empty() => TabStatus::Empty,
            (None, None) => TabStatus::Resolving,
            (None, Some(_)) => TabStatus::ResolutionFailed,
        }
    }

    pub fn button_exists(&self, key: ElementKey) -> bool {
        self.elements.iter().any(|elem| {
            matches!(elem.parsed, Element::ButtonAction { key: k, .. } if k == key)
        })
    }
}

/// ABI-encoded input values, one slot per key from 0 to the highest key in
/// the current render. A slot is `None` until the user enters something.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    slots: Vec<Option<Bytes>>,
}

impl Inputs {
    pub fn for_elements(elements: &[VElem]) -> Self {
        let slots = match elements.iter().map(VElem::key).max() {
            Some(max) => vec![None; usize::from(max) + 1],
            None => Vec::new(),
        };
        Self { slots }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub fn contains(&self, key: ElementKey) -> bool {
        usize::from(key) < self.slots.len()
    }

    pub fn get(&self, key: ElementKey) -> Option<&Bytes> {
        self.slots.get(usize::from(key)).and_then(Option::as_ref)
    }

    /// Returns `false` and leaves the map alone when `key` is unknown.
    pub fn set(&mut self, key: ElementKey, value: Bytes) -> bool {
        match self.slots.get_mut(usize::from(key)) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Slots in key order with unset values as empty bytes.
    pub fn ordered_bytes(&self) -> Vec<Bytes> {
        self.slots
            .iter()
            .map(|slot| slot.clone().unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainView {
    pub account: NamedAddress,
    pub connection: ConnectionStatus,
    pub logged_in: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub chain: ChainView,
    pub tab: TabState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_render, fixtures};
    use proptest::prelude::*;

    fn elements() -> Vec<VElem> {
        decode_render(&[
            fixtures::text(0, "title"),
            fixtures::amount(3, "Amount", 6),
            fixtures::button(1, "Go"),
        ])
        .unwrap()
    }

    #[test]
    fn inputs_cover_every_key_up_to_max() {
        let inputs = Inputs::for_elements(&elements());
        assert_eq!(inputs.len(), 4);
        assert!(inputs.contains(2));
        assert!(!inputs.contains(4));
        assert_eq!(inputs.get(3), None);
        assert_eq!(inputs.ordered_bytes(), vec![Bytes::new(); 4]);
        assert_eq!(Inputs::for_elements(&[]).len(), 0);
    }

    #[test]
    fn unset_differs_from_zero() {
        let mut inputs = Inputs::for_elements(&elements());
        assert!(inputs.set(3, Bytes::from(vec![0u8; 32])));
        assert_eq!(inputs.get(3), Some(&Bytes::from(vec![0u8; 32])));
        assert_eq!(inputs.get(2), None);
        assert!(!inputs.set(9, Bytes::new()));
        assert_eq!(inputs.len(), 4);
    }

    #[test]
    fn status_follows_resolution() {
        let mut tab = TabState::default();
        assert_eq!(tab.status(), TabStatus::Empty);
        tab = TabState::navigating("app.eth");
        assert_eq!(tab.status(), TabStatus::Resolving);
        tab.load_error_text = Some("nope".into());
        assert_eq!(tab.status(), TabStatus::ResolutionFailed);
        tab.resolved_contract = Some(Address::repeat_byte(1));
        assert_eq!(tab.status(), TabStatus::Resolved(Address::repeat_byte(1)));
    }

    #[test]
    fn snapshot_carries_login_flag_only() {
        let state = State::new(None);
        let snapshot = state.snapshot();
        assert!(!snapshot.chain.logged_in);
        assert_eq!(snapshot.chain.account.address, Address::ZERO);
    }

    proptest! {
        #[test]
        fn set_input_keeps_one_slot_per_key(
            max_key in 0u8..32,
            writes in prop::collection::vec((0u8..32, prop::collection::vec(any::<u8>(), 0..40)), 0..50),
        ) {
            let raw = vec![fixtures::button(u64::from(max_key), "b")];
            let elements = decode_render(&raw).unwrap();
            let mut inputs = Inputs::for_elements(&elements);
            let expected_len = usize::from(max_key) + 1;

            for (key, value) in writes {
                let known = inputs.contains(key);
                prop_assert_eq!(inputs.set(key, Bytes::from(value.clone())), known);
                prop_assert_eq!(inputs.len(), expected_len);
                if known {
                    prop_assert_eq!(inputs.get(key), Some(&Bytes::from(value)));
                }
            }
            prop_assert_eq!(inputs.ordered_bytes().len(), expected_len);
        }
    }
}
