//! Line rendering for one-shot output.

use crossterm::style::{Color, Stylize};
use serde::Serialize;

use crate::core::model::{CollectionRef, DetailEntry, ItemRef};
use crate::core::reference::ItemReference;

/// Foreground colours handed out to sources after the first.
const PALETTE: &[Color] = &[
    Color::Rgb { r: 0x00, g: 0xFF, b: 0xFF },
    Color::Rgb { r: 0xFF, g: 0xB2, b: 0x66 },
    Color::Rgb { r: 0x66, g: 0xFF, b: 0x66 },
    Color::Rgb { r: 0xFF, g: 0x66, b: 0xB2 },
    Color::Rgb { r: 0xFF, g: 0xFF, b: 0x66 },
    Color::Rgb { r: 0x99, g: 0xCC, b: 0xFF },
    Color::Rgb { r: 0xCC, g: 0x99, b: 0xFF },
    Color::Rgb { r: 0xFF, g: 0x66, b: 0x66 },
    Color::Rgb { r: 0x00, g: 0xFF, b: 0x99 },
    Color::Rgb { r: 0xFF, g: 0xD7, b: 0x00 },
    Color::Rgb { r: 0x66, g: 0xB2, b: 0xFF },
    Color::Rgb { r: 0xB2, g: 0xFF, b: 0x66 },
];

/// Colour for the source at `index`. The first source prints plain.
pub fn source_color(index: usize, no_color: bool) -> Option<Color> {
    if no_color || index == 0 {
        return None;
    }
    Some(PALETTE[(index - 1) % PALETTE.len()])
}

#[derive(Serialize)]
struct ItemRecord<'a> {
    collection_id: &'a str,
    #[serde(flatten)]
    item: &'a ItemRef,
}

pub fn collection_line(collection: &CollectionRef, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string(collection)
    } else {
        Ok(collection.id.clone())
    }
}

pub fn item_line(collection_id: &str, item: &ItemRef, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string(&ItemRecord {
            collection_id,
            item,
        })
    } else {
        Ok(ItemReference::new(collection_id, &item.id).to_string())
    }
}

pub fn entry_line(
    entry: &DetailEntry,
    json: bool,
    color: Option<Color>,
) -> Result<String, serde_json::Error> {
    let text = if json {
        serde_json::to_string(entry)?
    } else {
        entry.message.trim_end_matches('\n').to_string()
    };
    Ok(match color {
        Some(color) => text.with(color).to_string(),
        None => text,
    })
}
