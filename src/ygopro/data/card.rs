use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::ygopro::constants::*;

/// Low nibble of `datas.level`. Higher bits carry pendulum scales.
pub const LEVEL_MASK: u32 = 0x0F;

/// Separates pendulum effect from monster effect in `texts.desc`.
pub const MONSTER_EFFECT_DELIMITER: &str = "【怪兽效果】\r\n";
const PENDULUM_HEADER_END: &str = "\r\n";

/// `←<scale> 【...】`
static PENDULUM_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^←([0-9]+) 【[^】]*】").expect("valid regex"));

/// One card as stored in `cards.cdb`.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct RawCardRow {
    pub id: u32,
    pub name: String,
    pub type_mask: u32,
    pub attack: i32,
    /// Link arrows for link monsters.
    pub defense: i32,
    pub level: u32,
    pub description: String,
    pub race_mask: u32,
    pub attribute_mask: u32,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Defense {
    Value(i32),
    LinkArrows([bool; 8])
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Pendulum {
    pub description: String,
    pub scale: u32
}

/// A card ready for the renderer.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct NormalizedCard {
    pub id: u32,
    pub name: String,
    pub primary_type: Option<Type>,
    pub secondary_type: Option<Type>,
    pub tertiary_type: Option<Type>,
    pub quaternary_type: Option<Type>,
    pub attack: i32,
    pub defense: Defense,
    pub level: u32,
    pub race: Option<Race>,
    pub attribute: Option<Attribute>,
    pub pendulum: Option<Pendulum>,
    pub description: String,
}

impl NormalizedCard {
    pub fn has_qualifier(&self, _type: Type) -> bool {
        self.tertiary_type == Some(_type) || self.quaternary_type == Some(_type)
    }

    /// Arrows in compass order, [`None`] unless it is a link monster.
    pub fn link_arrows(&self) -> Option<&[bool; 8]> {
        match &self.defense {
            Defense::LinkArrows(arrows) => Some(arrows),
            Defense::Value(_) => None
        }
    }

    /// Rebuild a row that decodes back to this card.
    #[cfg(test)]
    pub fn to_raw(&self) -> RawCardRow {
        let type_mask = [self.primary_type, self.secondary_type, self.tertiary_type, self.quaternary_type]
            .iter()
            .flatten()
            .fold(0u32, |mask, _type| mask | u32::from(*_type));
        let defense = match &self.defense {
            Defense::Value(value) => *value,
            Defense::LinkArrows(arrows) => LINK_MARKER_ORDER.iter()
                .zip(arrows.iter())
                .filter(|(_, set)| **set)
                .fold(LinkMarkers::empty(), |markers, (marker, _)| markers | *marker)
                .bits() as i32
        };
        let description = match &self.pendulum {
            Some(pendulum) => format!("←{} 【灵摆】{}{}{}{}",
                pendulum.scale, PENDULUM_HEADER_END,
                pendulum.description, MONSTER_EFFECT_DELIMITER, self.description),
            None => self.description.clone()
        };
        RawCardRow {
            id: self.id,
            name: self.name.clone(),
            type_mask,
            attack: self.attack,
            defense,
            level: self.level,
            description,
            race_mask: self.race.map(u32::from).unwrap_or(0),
            attribute_mask: self.attribute.map(u32::from).unwrap_or(0),
        }
    }
}

/// Decode the packed columns of a card row.
///
/// Fails only if a pendulum card lacks its scale header or the monster effect
/// delimiter.
pub fn decode(row: &RawCardRow) -> Result<NormalizedCard, Error> {
    let primary_type = first_match(&PRIMARY_TYPES, row.type_mask);
    let mut secondary_type = first_match(&SECONDARY_TYPES, row.type_mask);
    if secondary_type.is_none() && matches!(primary_type, Some(Type::Spell) | Some(Type::Trap)) {
        secondary_type = Some(Type::Normal);
    }
    let (tertiary_type, quaternary_type) = decode_qualifiers(row.type_mask, secondary_type);

    let defense = if secondary_type == Some(Type::Link) {
        Defense::LinkArrows(decode_link_arrows(row.defense))
    } else {
        Defense::Value(row.defense)
    };

    let is_pendulum = tertiary_type == Some(Type::Pendulum) || quaternary_type == Some(Type::Pendulum);
    let (pendulum, description) = if is_pendulum {
        let (pendulum, description) = split_pendulum(row.id, &row.description)?;
        (Some(pendulum), description)
    } else {
        (None, row.description.clone())
    };

    Ok(NormalizedCard {
        id: row.id,
        name: row.name.clone(),
        primary_type,
        secondary_type,
        tertiary_type,
        quaternary_type,
        attack: row.attack,
        defense,
        level: row.level & LEVEL_MASK,
        race: RACES.iter().find(|(race, _)| is_set(u32::from(*race), row.race_mask)).map(|(race, _)| *race),
        attribute: ATTRIBUTES.iter().copied().find(|attribute| is_set(u32::from(*attribute), row.attribute_mask)),
        pendulum,
        description,
    })
}

fn is_set(bit: u32, mask: u32) -> bool {
    mask & bit == bit
}

fn first_match(types: &[Type], mask: u32) -> Option<Type> {
    types.iter().copied().find(|_type| _type.is_set(mask))
}

fn decode_qualifiers(mask: u32, secondary_type: Option<Type>) -> (Option<Type>, Option<Type>) {
    let mut qualifiers = QUALIFIER_TYPES.iter()
        .copied()
        // A normal monster is already reported as secondary type.
        .filter(|_type| Some(*_type) != secondary_type)
        .filter(|_type| _type.is_set(mask));
    (qualifiers.next(), qualifiers.next())
}

fn decode_link_arrows(defense: i32) -> [bool; 8] {
    let markers = LinkMarkers::from_bits_truncate(defense as u32);
    let mut arrows = [false; 8];
    for (arrow, marker) in arrows.iter_mut().zip(LINK_MARKER_ORDER.iter()) {
        *arrow = markers.contains(*marker);
    }
    arrows
}

// ==================================================
// Pendulum description layout:
// ←4 【灵摆】\r\n
// <pendulum effect>\r\n
// 【怪兽效果】\r\n
// <monster effect>
// ==================================================
fn split_pendulum(id: u32, description: &str) -> Result<(Pendulum, String), Error> {
    let (head, monster_effect) = description.split_once(MONSTER_EFFECT_DELIMITER)
        .ok_or(Error::MalformedDescription { id, reason: "monster effect delimiter not found" })?;
    let (header, pendulum_effect) = head.split_once(PENDULUM_HEADER_END).unwrap_or((head, ""));
    let scale = parse_pendulum_scale(header)
        .ok_or(Error::MalformedDescription { id, reason: "pendulum scale not found" })?;
    Ok((Pendulum { description: pendulum_effect.to_string(), scale }, monster_effect.to_string()))
}

fn parse_pendulum_scale(header: &str) -> Option<u32> {
    PENDULUM_HEADER.captures(header)?.get(1)?.as_str().parse().ok()
}
