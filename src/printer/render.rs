// ============================================================
// render
// ------------------------------------------------------------
//! Draw a card from mold assets.
//!
//! Mold directory layout:
//! - `card/<code>.png`: frame, `<code>` is the summon method of a
//!   monster (`tc`, `xg`, `rh`, ...) or `spell` / `trap`.
//!   `card/<code>-lb.png` is preferred for pendulum monsters.
//! - `attribute/<attribute>.png`, `attribute/spell.png`, `attribute/trap.png`
//! - `star.png`, `rank.png`: level and rank icons.
//! - `link/<0-7>.png`: full card overlay of one link arrow, compass order.
//! - `pic.jpg`: artwork placeholder.
//! - `font.ttf`: card text.
// ============================================================

use std::path::Path;
use std::path::PathBuf;

use ab_glyph::FontVec;
use async_trait::async_trait;
use image::imageops;
use image::imageops::FilterType;
use image::DynamicImage;
use image::RgbImage;
use image::Rgba;
use image::RgbaImage;
use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::error::map_image_error;
use crate::error::map_io_error;
use crate::ygopro::constants::Type;
use crate::ygopro::data::NormalizedCard;

use super::text;

pub const CARD_WIDTH: u32 = 813;
pub const CARD_HEIGHT: u32 = 1185;

/// (x, y, width, height)
type Area = (u32, u32, u32, u32);
const ARTWORK_AREA: Area = (100, 219, 614, 614);
const PENDULUM_ARTWORK_AREA: Area = (55, 212, 703, 524);
const ATTRIBUTE_AREA: Area = (680, 57, 76, 76);
const STAR_SIZE: u32 = 56;
const STAR_TOP: u32 = 145;
const STAR_RIGHT: u32 = 738;
const STAR_LEFT: u32 = 76;
const STAR_STEP: u32 = 60;

const NAME_POSITION: (u32, u32) = (65, 62);
const NAME_SIZE: f32 = 64.0;
const NAME_WIDTH: u32 = 600;
const SCALE_LEFT: (u32, u32) = (72, 790);
const SCALE_RIGHT: (u32, u32) = (716, 790);
const SCALE_SIZE: f32 = 48.0;
const SCALE_WIDTH: u32 = 60;
const PENDULUM_TEXT_AREA: Area = (130, 745, 553, 120);
const TYPE_LINE_POSITION: (u32, u32) = (65, 893);
const TYPE_LINE_SIZE: f32 = 28.0;
const DESCRIPTION_AREA: Area = (65, 935, 683, 160);
const DESCRIPTION_SIZE: f32 = 24.0;
const ATTACK_POSITION: (u32, u32) = (420, 1105);
const DEFENSE_POSITION: (u32, u32) = (600, 1105);
const STATS_SIZE: f32 = 34.0;
const STATS_WIDTH: u32 = 170;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub const PLACEHOLDER: &str = "pic.jpg";
pub const FONT: &str = "font.ttf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    Remote(String),
    Local(PathBuf)
}

impl Artwork {
    pub fn remote(image_base: &str, id: u32) -> Artwork {
        Artwork::Remote(format!("{}/{}.jpg", image_base.trim_end_matches('/'), id))
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Draw `card` with `artwork`.
    ///
    /// Fails with [`Error::AssetUnavailable`] when the artwork can't be fetched.
    /// The caller may retry with a local one.
    async fn render(&self, card: &NormalizedCard, artwork: &Artwork) -> Result<RgbImage, Error>;
}

pub struct MoldRenderer {
    mold_path: PathBuf,
    client: reqwest::Client,
    font: OnceCell<FontVec>
}

impl MoldRenderer {
    pub fn new<P: AsRef<Path>>(mold_path: P) -> Self {
        Self { mold_path: mold_path.as_ref().to_path_buf(), client: reqwest::Client::new(), font: OnceCell::new() }
    }

    /// Loaded on first use, shared by every render.
    fn font(&self) -> Result<&FontVec, Error> {
        self.font.get_or_try_init(|| {
            let path = self.mold_path.join(FONT);
            let data = std::fs::read(&path).map_err(map_io_error(&path))?;
            FontVec::try_from_vec(data).map_err(|_| Error::InvalidFont(path))
        })
    }

    fn load_mold<P: AsRef<Path>>(&self, name: P) -> Result<DynamicImage, Error> {
        let path = self.mold_path.join(name);
        image::open(&path).map_err(map_image_error(&path))
    }

    async fn load_artwork(&self, artwork: &Artwork) -> Result<DynamicImage, Error> {
        match artwork {
            Artwork::Local(path) => image::open(path).map_err(map_image_error(path)),
            Artwork::Remote(url) => {
                let unavailable = |reason: String| Error::AssetUnavailable { url: url.clone(), reason };
                let response = self.client.get(url).send().await.map_err(|err| unavailable(err.to_string()))?;
                if response.status() != reqwest::StatusCode::OK {
                    return Err(unavailable(format!("status {}", response.status())));
                }
                let bytes = response.bytes().await.map_err(|err| unavailable(err.to_string()))?;
                image::load_from_memory(&bytes).map_err(|err| unavailable(err.to_string()))
            }
        }
    }

    fn frame_name(&self, card: &NormalizedCard) -> PathBuf {
        let code = match card.primary_type {
            Some(Type::Spell) | Some(Type::Trap) => card.primary_type.map(Type::code).unwrap_or_default(),
            _ => card.secondary_type.unwrap_or(Type::Normal).code()
        };
        let pendulum = PathBuf::from("card").join(format!("{}-lb.png", code));
        if card.has_qualifier(Type::Pendulum) && self.mold_path.join(&pendulum).exists() {
            return pendulum;
        }
        PathBuf::from("card").join(format!("{}.png", code))
    }

    fn attribute_name(card: &NormalizedCard) -> Option<String> {
        match card.primary_type {
            Some(Type::Spell) => Some("spell".to_string()),
            Some(Type::Trap) => Some("trap".to_string()),
            _ => card.attribute.map(|attribute| attribute.code().to_string())
        }
    }

    fn draw_level(&self, canvas: &mut RgbaImage, card: &NormalizedCard) -> Result<(), Error> {
        if card.primary_type != Some(Type::Monster) || card.secondary_type == Some(Type::Link) || card.level == 0 {
            return Ok(());
        }
        let is_xyz = card.secondary_type == Some(Type::Xyz);
        let icon = self.load_mold(if is_xyz { "rank.png" } else { "star.png" })?
            .resize_exact(STAR_SIZE, STAR_SIZE, FilterType::Triangle)
            .to_rgba8();
        for index in 0..card.level {
            // Levels line up from the right, ranks from the left.
            let x = if is_xyz { STAR_LEFT + index * STAR_STEP } else { (STAR_RIGHT - STAR_SIZE).saturating_sub(index * STAR_STEP) };
            imageops::overlay(canvas, &icon, x as i64, STAR_TOP as i64);
        }
        Ok(())
    }

    fn draw_text(&self, canvas: &mut RgbaImage, card: &NormalizedCard) -> Result<(), Error> {
        let font = self.font()?;
        let name_color = match (card.primary_type, card.secondary_type) {
            (Some(Type::Spell), _) | (Some(Type::Trap), _) | (_, Some(Type::Xyz)) | (_, Some(Type::Link)) => WHITE,
            _ => BLACK
        };
        text::draw_line(canvas, font, &card.name, NAME_POSITION, NAME_SIZE, NAME_WIDTH, name_color);

        if let Some(pendulum) = &card.pendulum {
            let scale = pendulum.scale.to_string();
            text::draw_line(canvas, font, &scale, SCALE_LEFT, SCALE_SIZE, SCALE_WIDTH, BLACK);
            text::draw_line(canvas, font, &scale, SCALE_RIGHT, SCALE_SIZE, SCALE_WIDTH, BLACK);
            text::draw_paragraph(canvas, font, &pendulum.description, PENDULUM_TEXT_AREA, DESCRIPTION_SIZE, BLACK);
        }

        text::draw_line(canvas, font, &text::type_line(card), TYPE_LINE_POSITION, TYPE_LINE_SIZE, DESCRIPTION_AREA.2, BLACK);
        text::draw_paragraph(canvas, font, &card.description, DESCRIPTION_AREA, DESCRIPTION_SIZE, BLACK);

        if let Some((attack, defense)) = text::stats(card) {
            text::draw_line(canvas, font, &attack, ATTACK_POSITION, STATS_SIZE, STATS_WIDTH, BLACK);
            text::draw_line(canvas, font, &defense, DEFENSE_POSITION, STATS_SIZE, STATS_WIDTH, BLACK);
        }
        Ok(())
    }

    fn draw_link_arrows(&self, canvas: &mut RgbaImage, card: &NormalizedCard) -> Result<(), Error> {
        let arrows = match card.link_arrows() {
            Some(arrows) => arrows,
            None => return Ok(())
        };
        for (index, _) in arrows.iter().enumerate().filter(|(_, set)| **set) {
            let arrow = self.load_mold(PathBuf::from("link").join(format!("{}.png", index)))?
                .resize_exact(CARD_WIDTH, CARD_HEIGHT, FilterType::Triangle)
                .to_rgba8();
            imageops::overlay(canvas, &arrow, 0, 0);
        }
        Ok(())
    }
}

fn paste(canvas: &mut RgbaImage, image: &DynamicImage, (x, y, width, height): Area) {
    let image = image.resize_exact(width, height, FilterType::Triangle).to_rgba8();
    imageops::overlay(canvas, &image, x as i64, y as i64);
}

#[async_trait]
impl Renderer for MoldRenderer {
    async fn render(&self, card: &NormalizedCard, artwork: &Artwork) -> Result<RgbImage, Error> {
        let art = self.load_artwork(artwork).await?;
        let mut canvas = RgbaImage::new(CARD_WIDTH, CARD_HEIGHT);

        let area = if card.has_qualifier(Type::Pendulum) { PENDULUM_ARTWORK_AREA } else { ARTWORK_AREA };
        paste(&mut canvas, &art, area);

        let frame = self.load_mold(self.frame_name(card))?;
        paste(&mut canvas, &frame, (0, 0, CARD_WIDTH, CARD_HEIGHT));

        if let Some(attribute) = Self::attribute_name(card) {
            let icon = self.load_mold(PathBuf::from("attribute").join(format!("{}.png", attribute)))?;
            paste(&mut canvas, &icon, ATTRIBUTE_AREA);
        }
        self.draw_level(&mut canvas, card)?;
        self.draw_link_arrows(&mut canvas, card)?;
        self.draw_text(&mut canvas, card)?;

        Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}
