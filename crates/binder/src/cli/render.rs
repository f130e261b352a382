//! Terminal rendering of [`CmdResult`] values.
//!
//! Everything here returns `String`s; printing happens in `commands.rs`.
//! Styling goes through `console`, which drops colors when stdout is not a
//! terminal, so tests compare plain text.

use binderapp::api::{BinderView, CmdMessage, CmdResult, MessageLevel};
use binderapp::model::{Binder, Card};
use binderapp::pages::{View, ViewMode};
use binderapp::slot::SlotIndex;
use console::style;
use std::collections::HashMap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CELL_WIDTH: usize = 16;

pub fn render(result: &CmdResult, mode: ViewMode) -> String {
    let mut out = String::new();
    if let Some(view) = &result.view {
        out.push_str(&render_view(view, mode));
    } else if !result.binders.is_empty()
        && result.affected_cards.is_empty()
        && result.removed_cards.is_empty()
    {
        out.push_str(&render_binders(&result.binders));
    }
    if let Some(layout) = result.layout {
        out.push_str(&format!("{}\n", layout));
    }
    if !result.affected_cards.is_empty() {
        out.push_str(&render_cards(&result.affected_cards));
    }
    out.push_str(&render_messages(&result.messages));
    out
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            let line = match message.level {
                MessageLevel::Success => style(&message.content).green().to_string(),
                MessageLevel::Warning => style(&message.content).yellow().to_string(),
                MessageLevel::Error => style(&message.content).red().to_string(),
                MessageLevel::Info => style(&message.content).dim().to_string(),
            };
            format!("{}\n", line)
        })
        .collect()
}

pub fn render_binders(binders: &[Binder]) -> String {
    let width = binders.iter().map(|b| b.name.width()).max().unwrap_or(0);
    binders
        .iter()
        .map(|binder| {
            let gray = if binder.gray_out_unpurchased { "  gray-out" } else { "" };
            format!(
                "{}  {}  {}{}\n",
                style(pad_to(&binder.name, width)).bold(),
                binder.layout,
                style(binder.id).dim(),
                gray
            )
        })
        .collect()
}

pub fn render_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| {
            let mark = if card.purchased { "✓" } else { " " };
            let set = if card.set_code.is_empty() {
                String::new()
            } else {
                format!(" [{} {}]", card.set_code, card.collector_number)
            };
            format!(
                "{:>4}  {} {}{}  {}\n",
                card.position_index.get(),
                mark,
                card.name,
                style(set).dim(),
                format_price(card.price_cents)
            )
        })
        .collect()
}

pub fn render_view(view: &BinderView, mode: ViewMode) -> String {
    let binder = &view.binder;
    let pages = &view.pages;
    let by_slot: HashMap<SlotIndex, &Card> =
        view.cards.iter().map(|card| (card.position_index, card)).collect();

    let total_cents: u64 = view.cards.iter().filter_map(|c| c.price_cents).map(u64::from).sum();
    let mut out = format!(
        "{}  {}  {} card(s), {} page(s), {}\n",
        style(&binder.name).bold(),
        binder.layout,
        view.cards.len(),
        pages.total_pages,
        format_price(Some(u32::try_from(total_cents).unwrap_or(u32::MAX)))
    );

    let width = binder.layout.width() as usize;
    for (n, spread) in pages.views(mode).iter().enumerate() {
        out.push_str(&format!("\n{}\n", style(view_title(n, spread)).underlined()));
        for page in [spread.left, spread.right].into_iter().flatten() {
            out.push_str(&format!("page {}\n", page + 1));
            let range = pages.slot_range(page);
            let slots: Vec<u64> = range.collect();
            for row in slots.chunks(width) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|raw| {
                        let slot = u32::try_from(*raw).map(SlotIndex::new).ok();
                        let card = slot.and_then(|s| by_slot.get(&s).copied());
                        render_cell(card, *raw, binder.gray_out_unpurchased)
                    })
                    .collect();
                out.push_str(&cells.join(" "));
                out.push('\n');
            }
        }
    }
    out
}

fn view_title(n: usize, spread: &View) -> String {
    match (spread.left, spread.right) {
        (Some(l), Some(r)) => format!("view {}: pages {}-{}", n, l + 1, r + 1),
        (Some(p), None) | (None, Some(p)) => format!("view {}: page {}", n, p + 1),
        (None, None) => format!("view {}", n),
    }
}

fn render_cell(card: Option<&Card>, slot: u64, gray_out: bool) -> String {
    let label = match card {
        Some(card) => format!("{:>3} {}", slot, card.name),
        None => format!("{:>3} .", slot),
    };
    let text = pad_to(&truncate(&label, CELL_WIDTH), CELL_WIDTH);
    match card {
        Some(card) if gray_out && !card.purchased => style(text).dim().to_string(),
        Some(_) => text,
        None => style(text).dim().to_string(),
    }
}

/// Cuts `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn pad_to(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

pub fn format_price(cents: Option<u32>) -> String {
    match cents {
        Some(cents) => format!("${}.{:02}", cents / 100, cents % 100),
        None => "-".to_string(),
    }
}
