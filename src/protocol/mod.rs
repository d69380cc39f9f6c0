pub mod amount;

use alloy::{
    primitives::{Bytes, U256, keccak256},
    sol,
    sol_types::SolValue,
};
use std::fmt;
use thiserror::Error;

/// Client-side element key. Keys index the input slots sent back to `act`.
pub type ElementKey = u8;

sol! {
    struct TextProps {
        uint256 key;
        string text;
    }

    struct AmountProps {
        uint256 key;
        string label;
        uint64 decimals;
    }

    struct DropOption {
        uint256 val;
        string text;
    }

    struct DropdownProps {
        uint256 key;
        string label;
        DropOption[] options;
    }

    struct ButtonProps {
        uint256 key;
        string text;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Text,
    Amount,
    Dropdown,
    Button,
    /// Declared by the protocol but not rendered by this client.
    Textbox,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::Text,
        ElementType::Amount,
        ElementType::Dropdown,
        ElementType::Button,
        ElementType::Textbox,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::Amount => "amount",
            ElementType::Dropdown => "dropdown",
            ElementType::Button => "button",
            ElementType::Textbox => "textbox",
        }
    }

    pub fn type_hash(self) -> u64 {
        type_hash(self.tag())
    }

    pub fn from_type_hash(hash: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_hash() == hash)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Low 8 bytes (big-endian) of `keccak256(tag)`.
pub fn type_hash(tag: &str) -> u64 {
    let hash = keccak256(tag.as_bytes());
    let mut low = [0u8; 8];
    low.copy_from_slice(&hash[24..]);
    u64::from_be_bytes(low)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub type_hash: u64,
    pub data: Bytes,
}

impl RawElement {
    pub fn new(kind: ElementType, data: impl Into<Bytes>) -> Self {
        Self {
            type_hash: kind.type_hash(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub value: U256,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Text {
        key: ElementKey,
        text: String,
    },
    AmountInput {
        key: ElementKey,
        label: String,
        decimals: u64,
    },
    DropdownInput {
        key: ElementKey,
        label: String,
        options: Vec<DropdownOption>,
    },
    ButtonAction {
        key: ElementKey,
        text: String,
    },
}

impl Element {
    pub fn key(&self) -> ElementKey {
        match self {
            Element::Text { key, .. }
            | Element::AmountInput { key, .. }
            | Element::DropdownInput { key, .. }
            | Element::ButtonAction { key, .. } => *key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElem {
    pub type_hash: u64,
    pub raw_data: Bytes,
    pub parsed: Element,
}

impl VElem {
    pub fn key(&self) -> ElementKey {
        self.parsed.key()
    }

    /// Same wire shape as `other`, so an existing widget can be kept.
    pub fn renders_same(&self, other: &VElem) -> bool {
        self.type_hash == other.type_hash && self.raw_data == other.raw_data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported element type {type_hash:#018x} at index {index}")]
    UnknownType { index: usize, type_hash: u64 },
    #[error("malformed {kind} element at index {index}: {reason}")]
    Malformed {
        index: usize,
        kind: ElementType,
        reason: String,
    },
    #[error("{kind} element at index {index} has key {key}, expected 0..=255")]
    KeyOutOfRange {
        index: usize,
        kind: ElementType,
        key: U256,
    },
}

/// Decodes a full render. Any bad element fails the whole render; textbox
/// elements are skipped.
pub fn decode_render(raw: &[RawElement]) -> Result<Vec<VElem>, DecodeError> {
    let mut elements = Vec::with_capacity(raw.len());
    for (index, element) in raw.iter().enumerate() {
        let kind = ElementType::from_type_hash(element.type_hash).ok_or(
            DecodeError::UnknownType {
                index,
                type_hash: element.type_hash,
            },
        )?;
        if let Some(parsed) = decode_element(index, kind, &element.data)? {
            elements.push(VElem {
                type_hash: element.type_hash,
                raw_data: element.data.clone(),
                parsed,
            });
        }
    }
    Ok(elements)
}

fn decode_element(
    index: usize,
    kind: ElementType,
    data: &[u8],
) -> Result<Option<Element>, DecodeError> {
    let malformed = |err: alloy::sol_types::Error| DecodeError::Malformed {
        index,
        kind,
        reason: err.to_string(),
    };
    let key = |raw: U256| {
        ElementKey::try_from(raw).map_err(|_| DecodeError::KeyOutOfRange {
            index,
            kind,
            key: raw,
        })
    };

    let element = match kind {
        ElementType::Text => {
            let props = TextProps::abi_decode(data).map_err(malformed)?;
            Element::Text {
                key: key(props.key)?,
                text: props.text,
            }
        }
        ElementType::Amount => {
            let props = AmountProps::abi_decode(data).map_err(malformed)?;
            Element::AmountInput {
                key: key(props.key)?,
                label: props.label,
                decimals: props.decimals,
            }
        }
        ElementType::Dropdown => {
            let props = DropdownProps::abi_decode(data).map_err(malformed)?;
            Element::DropdownInput {
                key: key(props.key)?,
                label: props.label,
                options: props
                    .options
                    .into_iter()
                    .map(|option| DropdownOption {
                        value: option.val,
                        text: option.text,
                    })
                    .collect(),
            }
        }
        ElementType::Button => {
            let props = ButtonProps::abi_decode(data).map_err(malformed)?;
            Element::ButtonAction {
                key: key(props.key)?,
                text: props.text,
            }
        }
        ElementType::Textbox => return Ok(None),
    };
    Ok(Some(element))
}

/// Payload of an `act` call: the pressed button plus every input slot in
/// ascending key order. Unset slots are sent as empty bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub button_key: ElementKey,
    pub inputs: Vec<Bytes>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn type_hash_is_low_bytes_of_keccak() {
        let full = keccak256(b"button");
        let expected = u64::from_be_bytes(full[24..32].try_into().unwrap());
        assert_eq!(ElementType::Button.type_hash(), expected);
        assert_eq!(
            ElementType::from_type_hash(expected),
            Some(ElementType::Button)
        );
        assert_ne!(
            ElementType::Text.type_hash(),
            ElementType::Textbox.type_hash()
        );
    }

    #[test]
    fn decodes_every_variant_in_order() {
        let raw = vec![
            text(0, "Swap tokens"),
            amount(1, "Amount in", 18),
            dropdown(2, "Token", &[(1, "WETH"), (2, "DAI")]),
            button(3, "Swap"),
        ];

        let elements = decode_render(&raw).unwrap();

        assert_eq!(elements.len(), 4);
        assert_eq!(
            elements[0].parsed,
            Element::Text {
                key: 0,
                text: "Swap tokens".into()
            }
        );
        assert_eq!(
            elements[1].parsed,
            Element::AmountInput {
                key: 1,
                label: "Amount in".into(),
                decimals: 18
            }
        );
        match &elements[2].parsed {
            Element::DropdownInput { key, options, .. } => {
                assert_eq!(*key, 2);
                assert_eq!(options.len(), 2);
                assert_eq!(options[1].value, U256::from(2u64));
                assert_eq!(options[1].text, "DAI");
            }
            other => panic!("expected dropdown, got {other:?}"),
        }
        assert_eq!(elements[3].key(), 3);
        assert_eq!(elements[3].raw_data, raw[3].data);
    }

    #[test]
    fn textbox_is_skipped() {
        let raw = vec![
            text(0, "hello"),
            RawElement::new(ElementType::Textbox, vec![0u8; 64]),
            button(1, "Go"),
        ];
        let elements = decode_render(&raw).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].key(), 1);
    }

    #[test]
    fn unknown_type_fails_whole_render() {
        let raw = vec![
            text(0, "hello"),
            RawElement {
                type_hash: 0xdead_beef,
                data: Bytes::new(),
            },
        ];
        assert_eq!(
            decode_render(&raw),
            Err(DecodeError::UnknownType {
                index: 1,
                type_hash: 0xdead_beef
            })
        );
    }

    #[test]
    fn shape_mismatch_is_attributed_to_element() {
        let bad = RawElement::new(ElementType::Dropdown, vec![0u8; 40]);
        let raw = vec![text(0, "ok"), bad];

        match decode_render(&raw) {
            Err(DecodeError::Malformed { index, kind, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, ElementType::Dropdown);
            }
            other => panic!("expected malformed element, got {other:?}"),
        }
    }

    #[test]
    fn truncated_data_is_malformed() {
        let raw = vec![RawElement::new(ElementType::Text, vec![0xffu8; 16])];
        assert!(matches!(
            decode_render(&raw),
            Err(DecodeError::Malformed { index: 0, .. })
        ));
    }

    #[test]
    fn oversized_key_is_rejected() {
        let raw = vec![text(256, "too far")];
        assert!(matches!(
            decode_render(&raw),
            Err(DecodeError::KeyOutOfRange { index: 0, .. })
        ));
    }
}
