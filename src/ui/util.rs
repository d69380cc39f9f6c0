use crate::app::state::NamedAddress;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
};
use std::cmp::min;

pub fn short_hex(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() <= 10 {
        return trimmed.to_string();
    }
    let prefix_len = 6.min(trimmed.len());
    let suffix_len = 4.min(trimmed.len().saturating_sub(prefix_len));
    let prefix = &trimmed[..prefix_len];
    let suffix = &trimmed[trimmed.len() - suffix_len..];
    format!("{}...{}", prefix, suffix)
}

/// `vitalik.eth`, `0xd8da...6045`, or `⚠️ bad.eth`.
pub fn address_label(named: &NamedAddress) -> String {
    let label = match &named.name {
        Some(name) => name.clone(),
        None => short_hex(&format!("{:#x}", named.address)),
    };
    if named.error.is_some() {
        format!("⚠️ {label}")
    } else {
        label
    }
}

/// Pane title style.
pub fn title_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = min(width, area.width);
    let height = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[test]
    fn address_label_prefers_name() {
        let mut named = NamedAddress {
            address: Address::repeat_byte(0x11),
            ..NamedAddress::default()
        };
        assert_eq!(address_label(&named), "0x1111...1111");
        named.name = Some("vitalik.eth".into());
        assert_eq!(address_label(&named), "vitalik.eth");
        named.error = Some("stale".into());
        assert_eq!(address_label(&named), "⚠️ vitalik.eth");
    }

    #[test]
    fn short_hex_keeps_ends() {
        assert_eq!(
            short_hex("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            "0x5fbd...0aa3"
        );
        assert_eq!(short_hex(" 0xabc "), "0xabc");
    }

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 20, area), area);
    }
}
