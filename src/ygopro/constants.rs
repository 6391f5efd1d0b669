#![allow(non_upper_case_globals)]
use bitflags::bitflags;
use num_enum::IntoPrimitive;

#[derive(Copy, Clone, Eq, PartialEq, IntoPrimitive, Debug, Hash)]
#[repr(u32)]
pub enum Type {
    Monster = 0x1,
    Spell = 0x2,
    Trap = 0x4,
    Normal = 0x10,
    Effect = 0x20,
    Fusion = 0x40,
    Ritual = 0x80,
    Spirit = 0x200,
    Union = 0x400,
    Dual = 0x800,
    Tuner = 0x1000,
    Synchro = 0x2000,
    Token = 0x4000,
    Quickplay = 0x10000,
    Continuous = 0x20000,
    Equip = 0x40000,
    Field = 0x80000,
    Counter = 0x100000,
    Flip = 0x200000,
    Toon = 0x400000,
    Xyz = 0x800000,
    Pendulum = 0x1000000,
    Link = 0x4000000,
}

impl Type {
    /// Short code the card molds are named after.
    pub fn code(self) -> &'static str {
        match self {
            Type::Monster    => "monster",
            Type::Spell      => "spell",
            Type::Trap       => "trap",
            Type::Normal     => "tc",
            Type::Effect     => "xg",
            Type::Fusion     => "rh",
            Type::Ritual     => "ys",
            Type::Spirit     => "lh",
            Type::Union      => "tm",
            Type::Dual       => "ec",
            Type::Tuner      => "tz",
            Type::Synchro    => "tt",
            Type::Token      => "tk",
            Type::Quickplay  => "sg",
            Type::Continuous => "yx",
            Type::Equip      => "zb",
            Type::Field      => "cd",
            Type::Counter    => "fj",
            Type::Flip       => "fz",
            Type::Toon       => "kt",
            Type::Xyz        => "cl",
            Type::Pendulum   => "lb",
            Type::Link       => "lj",
        }
    }

    /// Name printed in the type line.
    pub fn label(self) -> &'static str {
        match self {
            Type::Monster    => "怪兽",
            Type::Spell      => "魔法",
            Type::Trap       => "陷阱",
            Type::Normal     => "通常",
            Type::Effect     => "效果",
            Type::Fusion     => "融合",
            Type::Ritual     => "仪式",
            Type::Spirit     => "灵魂",
            Type::Union      => "同盟",
            Type::Dual       => "二重",
            Type::Tuner      => "调整",
            Type::Synchro    => "同调",
            Type::Token      => "衍生物",
            Type::Quickplay  => "速攻",
            Type::Continuous => "永续",
            Type::Equip      => "装备",
            Type::Field      => "场地",
            Type::Counter    => "反击",
            Type::Flip       => "反转",
            Type::Toon       => "卡通",
            Type::Xyz        => "超量",
            Type::Pendulum   => "灵摆",
            Type::Link       => "连接",
        }
    }

    pub fn is_set(self, mask: u32) -> bool {
        let bit: u32 = self.into();
        mask & bit == bit
    }
}

/// Card kind. Exclusive, checked in this order.
pub const PRIMARY_TYPES: [Type; 3] = [Type::Monster, Type::Spell, Type::Trap];

/// Summon method for monsters, sub type for spells and traps.
pub const SECONDARY_TYPES: [Type; 13] = [
    Type::Fusion, Type::Ritual, Type::Synchro, Type::Token, Type::Xyz, Type::Link, Type::Normal, Type::Effect,
    Type::Quickplay, Type::Continuous, Type::Equip, Type::Field, Type::Counter,
];

/// Extra monster abilities. Overlaps [`SECONDARY_TYPES`] on [`Type::Normal`].
pub const QUALIFIER_TYPES: [Type; 8] = [
    Type::Normal, Type::Pendulum, Type::Spirit, Type::Union, Type::Dual, Type::Tuner, Type::Flip, Type::Toon,
];

#[derive(Copy, Clone, Eq, PartialEq, IntoPrimitive, Debug, Hash)]
#[repr(u32)]
pub enum Race {
    Warrior = 0x1,
    Spellcaster = 0x2,
    Fairy = 0x4,
    Fiend = 0x8,
    Zombie = 0x10,
    Machine = 0x20,
    Aqua = 0x40,
    Pyro = 0x80,
    Rock = 0x100,
    Windbeast = 0x200,
    Plant = 0x400,
    Insect = 0x800,
    Thunder = 0x1000,
    Dragon = 0x2000,
    Beast = 0x4000,
    Beastwarrior = 0x8000,
    Dinosaur = 0x10000,
    Fish = 0x20000,
    Seaserpent = 0x40000,
    Reptile = 0x80000,
    Psycho = 0x100000,
    Divine = 0x200000,
    Creatorgod = 0x400000,
    Wyrm = 0x800000,
    Cyberse = 0x1000000,
}

/// Races in match order with the label printed on the card.
///
/// Only one race bit is set on real data. If a row carries more, the first
/// entry here wins.
pub const RACES: [(Race, &str); 25] = [
    (Race::Warrior, "战士"),
    (Race::Spellcaster, "魔法师"),
    (Race::Fairy, "天使"),
    (Race::Fiend, "恶魔"),
    (Race::Zombie, "不死"),
    (Race::Machine, "机械"),
    (Race::Aqua, "水"),
    (Race::Pyro, "炎"),
    (Race::Rock, "岩石"),
    (Race::Windbeast, "鸟兽"),
    (Race::Plant, "植物"),
    (Race::Insect, "昆虫"),
    (Race::Thunder, "雷"),
    (Race::Dragon, "龙"),
    (Race::Beast, "兽"),
    (Race::Beastwarrior, "兽战士"),
    (Race::Dinosaur, "恐龙"),
    (Race::Fish, "鱼"),
    (Race::Seaserpent, "海龙"),
    (Race::Reptile, "爬虫"),
    (Race::Wyrm, "幻龙"),
    (Race::Psycho, "念动力"),
    (Race::Cyberse, "电子界"),
    (Race::Divine, "幻神兽"),
    (Race::Creatorgod, "创世神"),
];

impl Race {
    pub fn label(self) -> &'static str {
        RACES.iter().find(|(race, _)| *race == self).map(|(_, label)| *label).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, IntoPrimitive, Debug, Hash)]
#[repr(u32)]
pub enum Attribute {
    Earth = 0x1,
    Water = 0x2,
    Fire = 0x4,
    Wind = 0x8,
    Light = 0x10,
    Dark = 0x20,
    Divine = 0x40,
}

pub const ATTRIBUTES: [Attribute; 7] = [
    Attribute::Earth, Attribute::Water, Attribute::Fire, Attribute::Wind, Attribute::Light, Attribute::Dark, Attribute::Divine,
];

impl Attribute {
    pub fn code(self) -> &'static str {
        match self {
            Attribute::Earth  => "earth",
            Attribute::Water  => "water",
            Attribute::Fire   => "fire",
            Attribute::Wind   => "wind",
            Attribute::Light  => "light",
            Attribute::Dark   => "dark",
            Attribute::Divine => "devine",
        }
    }
}

bitflags! {
    /// Arrows of a link monster, stored in its defense column.
    pub struct LinkMarkers: u32 {
        const BottomLeft = 0x001;
        const Bottom = 0x002;
        const BottomRight = 0x004;
        const Left = 0x008;
        const Right = 0x020;
        const TopLeft = 0x040;
        const Top = 0x080;
        const TopRight = 0x100;
    }
}

/// Compass order: NW, N, NE, W, E, SW, S, SE.
pub const LINK_MARKER_ORDER: [LinkMarkers; 8] = [
    LinkMarkers::TopLeft, LinkMarkers::Top, LinkMarkers::TopRight,
    LinkMarkers::Left, LinkMarkers::Right,
    LinkMarkers::BottomLeft, LinkMarkers::Bottom, LinkMarkers::BottomRight,
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_attribute_codes() {
        let codes: Vec<&str> = ATTRIBUTES.iter().map(|attribute| attribute.code()).collect();
        assert_eq!(codes, vec!["earth", "water", "fire", "wind", "light", "dark", "devine"]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Race::Cyberse.label(), "电子界");
        assert_eq!(Type::Link.label(), "连接");
        assert_eq!(Type::Quickplay.code(), "sg");
    }
}
