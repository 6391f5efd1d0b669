use ab_glyph::Font;
use ab_glyph::PxScale;
use image::Rgba;
use image::RgbaImage;
use imageproc::drawing::draw_text_mut;
use imageproc::drawing::text_size;

use crate::ygopro::constants::Type;
use crate::ygopro::data::Defense;
use crate::ygopro::data::NormalizedCard;

const LINE_SPACING: f32 = 1.2;

/// `【魔法师族/效果】` for monsters, `【速攻魔法卡】` for spells and traps.
pub fn type_line(card: &NormalizedCard) -> String {
    match card.primary_type {
        Some(primary @ Type::Spell) | Some(primary @ Type::Trap) => match card.secondary_type {
            None | Some(Type::Normal) => format!("【{}卡】", primary.label()),
            Some(secondary) => format!("【{}{}卡】", secondary.label(), primary.label())
        },
        _ => {
            let mut parts: Vec<String> = card.race.iter().map(|race| format!("{}族", race.label())).collect();
            parts.extend([card.secondary_type, card.tertiary_type, card.quaternary_type]
                .iter()
                .flatten()
                .map(|_type| _type.label().to_string()));
            format!("【{}】", parts.join("/"))
        }
    }
}

/// Printed value of ATK / DEF, `?` for negative ones.
fn stat(value: i32) -> String {
    if value < 0 { "?".to_string() } else { value.to_string() }
}

/// `ATK/2500` and `DEF/2100` or `LINK-3`. Nothing for spells and traps.
pub fn stats(card: &NormalizedCard) -> Option<(String, String)> {
    if card.primary_type != Some(Type::Monster) {
        return None;
    }
    let right = match &card.defense {
        Defense::Value(defense) => format!("DEF/{}", stat(*defense)),
        Defense::LinkArrows(arrows) => format!("LINK-{}", arrows.iter().filter(|set| **set).count())
    };
    Some((format!("ATK/{}", stat(card.attack)), right))
}

/// Break `text` into lines no wider than `width`.
pub fn wrap<F: Font>(font: &F, scale: PxScale, text: &str, width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.trim_end().split('\n').map(|line| line.trim_end_matches('\r')) {
        let mut line = String::new();
        for c in paragraph.chars() {
            line.push(c);
            if line.chars().count() > 1 && text_size(scale, font, &line).0 > width {
                line.pop();
                lines.push(std::mem::take(&mut line));
                line.push(c);
            }
        }
        lines.push(line);
    }
    lines
}

/// One line starting at `(x, y)`, shrunk to fit `max_width`.
pub fn draw_line<F: Font>(canvas: &mut RgbaImage, font: &F, text: &str, (x, y): (u32, u32), size: f32, max_width: u32, color: Rgba<u8>) {
    let (width, _) = text_size(PxScale::from(size), font, text);
    let size = if width > max_width { size * max_width as f32 / width as f32 } else { size };
    draw_text_mut(canvas, color, x as i32, y as i32, PxScale::from(size), font, text);
}

/// Wrapped text inside `(x, y, width, height)`. Lines past the bottom are dropped.
pub fn draw_paragraph<F: Font>(canvas: &mut RgbaImage, font: &F, text: &str, (x, y, width, height): (u32, u32, u32, u32), size: f32, color: Rgba<u8>) {
    let scale = PxScale::from(size);
    let line_height = (size * LINE_SPACING) as u32;
    for (index, line) in wrap(font, scale, text, width).iter().enumerate() {
        let top = index as u32 * line_height;
        if top + line_height > height { break; }
        draw_text_mut(canvas, color, x as i32, (y + top) as i32, scale, font, line);
    }
}

#[cfg(test)]
pub mod test {
    use ab_glyph::FontRef;

    use super::*;
    use crate::ygopro::data::decode;
    use crate::ygopro::data::RawCardRow;

    /// DejaVu Sans, Latin and digits only.
    pub const FONT: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/fixtures/DejaVuSans.ttf"));

    fn card(raw: RawCardRow) -> NormalizedCard {
        decode(&raw).unwrap()
    }

    #[test]
    fn test_type_line() {
        let monster = card(RawCardRow { type_mask: 0x1 | 0x20 | 0x1000, race_mask: 0x2, ..Default::default() });
        assert_eq!(type_line(&monster), "【魔法师族/效果/调整】");
        let spell = card(RawCardRow { type_mask: 0x2, ..Default::default() });
        assert_eq!(type_line(&spell), "【魔法卡】");
        let quickplay = card(RawCardRow { type_mask: 0x2 | 0x10000, ..Default::default() });
        assert_eq!(type_line(&quickplay), "【速攻魔法卡】");
        let counter = card(RawCardRow { type_mask: 0x4 | 0x100000, ..Default::default() });
        assert_eq!(type_line(&counter), "【反击陷阱卡】");
    }

    #[test]
    fn test_stats() {
        let monster = card(RawCardRow { type_mask: 0x21, attack: 2500, defense: -2, ..Default::default() });
        assert_eq!(stats(&monster), Some(("ATK/2500".to_string(), "DEF/?".to_string())));
        let link = card(RawCardRow { type_mask: 0x1 | 0x20 | 0x4000000, attack: 1800, defense: 0x80 | 0x20 | 0x2, ..Default::default() });
        assert_eq!(stats(&link), Some(("ATK/1800".to_string(), "LINK-3".to_string())));
        assert_eq!(stats(&card(RawCardRow { type_mask: 0x2, ..Default::default() })), None);
    }

    #[test]
    fn test_wrap() {
        let font = FontRef::try_from_slice(FONT).unwrap();
        let scale = PxScale::from(24.0);
        let lines = wrap(&font, scale, "aaaa aaaa aaaa aaaa\r\nsecond\r\n", 100);
        assert!(lines.len() > 2);
        assert_eq!(lines.last().map(String::as_str), Some("second"));
        for line in lines.iter() {
            assert!(text_size(scale, &font, line).0 <= 100);
        }
        assert_eq!(lines.concat(), "aaaa aaaa aaaa aaaasecond");
    }
}
