use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use futures_util::stream;
use futures_util::StreamExt;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::Error;
use crate::error::map_image_error;
use crate::error::map_io_error;
use crate::ygopro::constants::Attribute;
use crate::ygopro::constants::Race;
use crate::ygopro::data::decode;
use crate::ygopro::data::Deck;
use crate::ygopro::data::RawCardRow;

use super::compose::compose;
use super::compose::write_pdf;
use super::compose::PageGeometry;
use super::config::Configuration;
use super::database::CardDatabase;
use super::render::Artwork;
use super::render::MoldRenderer;
use super::render::Renderer;
use super::render::PLACEHOLDER;

/// Where things go for one deck.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    pub image_base: String,
    pub placeholder: Artwork,
    pub image_directory: PathBuf,
    pub document: PathBuf,
    pub geometry: PageGeometry,
    pub concurrency: usize,
    pub jpeg_quality: u8,
    pub dpi: u32,
    pub keep_images: bool
}

impl PrintOptions {
    pub fn new(configuration: &Configuration, deck_name: &str, locale: Option<&str>) -> PrintOptions {
        let document = match locale {
            Some(locale) => format!("{}.{}.pdf", deck_name, locale),
            None => format!("{}.pdf", deck_name)
        };
        PrintOptions {
            image_base: configuration.localize(locale).image_base,
            placeholder: Artwork::Local(configuration.mold_path.join(PLACEHOLDER)),
            image_directory: configuration.output_path.join(deck_name),
            document: configuration.output_path.join(document),
            geometry: configuration.geometry.clone(),
            concurrency: configuration.concurrency,
            jpeg_quality: configuration.jpeg_quality,
            dpi: configuration.dpi,
            keep_images: configuration.keep_images
        }
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    /// Ids with an image, deck order.
    pub created: Vec<String>,
    pub not_created: Vec<(String, Error)>,
    pub pages: usize,
    pub document: Option<PathBuf>
}

impl Summary {
    pub fn not_found(&self) -> usize {
        self.not_created.iter().filter(|(_, err)| matches!(err, Error::NotFound(_))).count()
    }

    pub fn malformed(&self) -> usize {
        self.not_created.iter().filter(|(_, err)| matches!(err, Error::MalformedDescription { .. })).count()
    }

    pub fn report(&self) {
        info!("{} cards created, {} not found, {} malformed, {} failed.", self.created.len(),
            self.not_found(), self.malformed(), self.not_created.len() - self.not_found() - self.malformed());
        for (id, err) in self.not_created.iter() {
            warn!("{} was not created: {}", id, err);
        }
        match &self.document {
            Some(document) => info!("{} was created with {} pages.", document.display(), self.pages),
            None => warn!("No card was created, document skipped.")
        }
    }
}

/// Load the deck, query its cards and print them.
pub async fn run(configuration: &Configuration, deck_name: &str, locale: Option<&str>) -> anyhow::Result<Summary> {
    let localized = configuration.localize(locale);
    let deck_file = configuration.deck_path.join(format!("{}.ydk", deck_name));
    info!("load {}", deck_file.display());
    let deck = Deck::from_file(&deck_file)?;
    if deck.is_empty() {
        warn!("{} has no card.", deck_file.display());
    }
    info!("{} cards in {}", deck.len(), deck_name);

    info!("query cards info from {}", localized.cdb.display());
    let database = CardDatabase::open(&localized.cdb).await?;
    let rows = database.lookup(&deck.cards).await?;

    let renderer = MoldRenderer::new(&configuration.mold_path);
    let options = PrintOptions::new(configuration, deck_name, locale);
    print_deck(&renderer, &deck.cards, rows, &options).await
}

/// Render every card and compose them into one document.
///
/// `rows` lines up with `ids`. Card failures end up in the summary, only
/// output failures are returned as error.
pub async fn print_deck<R: Renderer + ?Sized>(renderer: &R, ids: &[String], rows: Vec<Option<RawCardRow>>, options: &PrintOptions) -> anyhow::Result<Summary> {
    prepare_directory(&options.image_directory)?;

    let mut summary = Summary::default();
    let mut images = HashMap::new();
    for (id, result) in render_cards(renderer, ids, rows, options).await {
        match result {
            Ok((name, image)) => {
                save_jpeg(&image, &options.image_directory.join(format!("{}.jpg", id)), options.jpeg_quality)?;
                info!("{}({}.jpg) was created.", name, id);
                summary.created.push(id.clone());
                images.insert(id, image);
            },
            Err(err) => summary.not_created.push((id, err))
        }
    }

    if !summary.created.is_empty() {
        let pages = compose(deck_order(ids, &images), &options.geometry);
        info!("{} pages composed.", pages.len());
        summary.pages = pages.len();
        info!("start to generate {}...", options.document.display());
        let file = File::create(&options.document).map_err(map_io_error(&options.document))?;
        write_pdf(&pages, options.dpi, options.jpeg_quality, BufWriter::new(file)).map_err(map_io_error(&options.document))?;
        info!("{} was created.", options.document.display());
        summary.document = Some(options.document.clone());
    }

    if !options.keep_images {
        debug!("clean {}", options.image_directory.display());
        fs::remove_dir_all(&options.image_directory).map_err(map_io_error(&options.image_directory))?;
    }
    Ok(summary)
}

/// Render each distinct id once, keeping the order ids first appear in.
async fn render_cards<R: Renderer + ?Sized>(renderer: &R, ids: &[String], rows: Vec<Option<RawCardRow>>, options: &PrintOptions) -> Vec<(String, Result<(String, RgbImage), Error>)> {
    let mut seen = HashSet::new();
    let jobs: Vec<(String, Option<RawCardRow>)> = ids.iter().cloned()
        .zip(rows)
        .filter(|(id, _)| seen.insert(id.clone()))
        .collect();
    stream::iter(jobs)
        .map(|(id, row)| async move {
            let result = match row {
                Some(row) => print_card(renderer, &row, options).await,
                None => Err(Error::NotFound(id.clone()))
            };
            (id, result)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await
}

/// Card name and image.
async fn print_card<R: Renderer + ?Sized>(renderer: &R, row: &RawCardRow, options: &PrintOptions) -> Result<(String, RgbImage), Error> {
    let card = decode(row)?;
    debug!("{}: {:?}/{:?} {} {}", card.id, card.primary_type, card.secondary_type,
        card.race.map(Race::label).unwrap_or_default(), card.attribute.map(Attribute::code).unwrap_or_default());
    let image = match renderer.render(&card, &Artwork::remote(&options.image_base, card.id)).await {
        Err(Error::AssetUnavailable { url, reason }) => {
            warn!("Image for {} cannot be found ({}: {}), use local placeholder card image instead...", card.id, url, reason);
            renderer.render(&card, &options.placeholder).await?
        },
        result => result?
    };
    Ok((card.name, image))
}

/// One slot per deck entry, [`None`] for cards without an image.
fn deck_order<'a>(ids: &'a [String], images: &'a HashMap<String, RgbImage>) -> Vec<Option<&'a RgbImage>> {
    ids.iter().map(|id| images.get(id)).collect()
}

fn prepare_directory(directory: &Path) -> Result<(), Error> {
    if directory.exists() {
        debug!("clean {}", directory.display());
        fs::remove_dir_all(directory).map_err(map_io_error(directory))?;
    }
    fs::create_dir_all(directory).map_err(map_io_error(directory))
}

fn save_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), Error> {
    let file = File::create(path).map_err(map_io_error(path))?;
    JpegEncoder::new_with_quality(BufWriter::new(file), quality).encode_image(image).map_err(map_image_error(path))
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use image::Rgb;

    use super::*;
    use crate::printer::database::test::create_database;
    use crate::printer::database::test::dark_magician;
    use crate::printer::database::test::memory_database;
    use crate::printer::database::test::pot_of_greed;
    use crate::printer::render::test::mold;
    use crate::ygopro::data::NormalizedCard;

    /// Remote artwork is never there.
    #[derive(Default)]
    struct OfflineRenderer {
        calls: Mutex<Vec<Artwork>>
    }

    #[async_trait]
    impl Renderer for OfflineRenderer {
        async fn render(&self, card: &NormalizedCard, artwork: &Artwork) -> Result<RgbImage, Error> {
            self.calls.lock().unwrap().push(artwork.clone());
            match artwork {
                Artwork::Remote(url) => Err(Error::AssetUnavailable { url: url.clone(), reason: "offline".to_string() }),
                Artwork::Local(_) => Ok(RgbImage::from_pixel(10, 10, Rgb([(card.id % 256) as u8, 0, 0])))
            }
        }
    }

    fn options(output: &Path) -> PrintOptions {
        PrintOptions {
            image_base: "http://127.0.0.1:9".to_string(),
            placeholder: Artwork::Local(PathBuf::from("pic.jpg")),
            image_directory: output.join("deck"),
            document: output.join("deck.pdf"),
            geometry: PageGeometry::default(),
            concurrency: 2,
            jpeg_quality: 80,
            dpi: 300,
            keep_images: true
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_card() {
        let output = tempfile::tempdir().unwrap();
        let options = options(output.path());
        let database = memory_database(&[dark_magician(), pot_of_greed()]).await;
        let ids = ids(&["46986414", "12345", "55144522"]);
        let rows = database.lookup(&ids).await.unwrap();

        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids, rows, &options).await.unwrap();
        assert_eq!(summary.created, vec!["46986414", "55144522"]);
        assert_eq!(summary.not_created.len(), 1);
        assert!(matches!(&summary.not_created[0], (id, Error::NotFound(_)) if id == "12345"));
        assert_eq!((summary.not_found(), summary.malformed()), (1, 0));
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.document, Some(options.document.clone()));
        assert!(options.document.exists());
        assert!(options.image_directory.join("46986414.jpg").exists());
        assert!(options.image_directory.join("55144522.jpg").exists());
        assert!(!options.image_directory.join("12345.jpg").exists());
    }

    #[tokio::test]
    async fn test_placeholder_fallback() {
        let output = tempfile::tempdir().unwrap();
        let options = options(output.path());
        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids(&["46986414"]), vec![Some(dark_magician())], &options).await.unwrap();
        assert_eq!(summary.created, vec!["46986414"]);
        let calls = renderer.calls.lock().unwrap();
        assert_eq!(*calls, vec![
            Artwork::Remote("http://127.0.0.1:9/46986414.jpg".to_string()),
            options.placeholder.clone()
        ]);
    }

    #[tokio::test]
    async fn test_malformed_card() {
        let output = tempfile::tempdir().unwrap();
        let mut options = options(output.path());
        options.keep_images = false;
        let pendulum = RawCardRow { id: 14558127, type_mask: 0x1 | 0x20 | 0x1000000, description: "no delimiter".to_string(), ..Default::default() };
        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids(&["14558127", "55144522"]), vec![Some(pendulum), Some(pot_of_greed())], &options).await.unwrap();
        assert_eq!(summary.created, vec!["55144522"]);
        assert!(matches!(&summary.not_created[0].1, Error::MalformedDescription { id: 14558127, .. }));
        assert_eq!((summary.not_found(), summary.malformed()), (0, 1));
        // Only the spell went through the renderer, remote then placeholder.
        assert_eq!(renderer.calls.lock().unwrap().len(), 2);
        assert!(!options.image_directory.exists());
        assert!(options.document.exists());
    }

    #[tokio::test]
    async fn test_nothing_created() {
        let output = tempfile::tempdir().unwrap();
        let options = options(output.path());
        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids(&["1"]), vec![None], &options).await.unwrap();
        assert!(summary.created.is_empty());
        assert_eq!(summary.document, None);
        assert!(!options.document.exists());
    }

    #[tokio::test]
    async fn test_order_and_duplicates() {
        let output = tempfile::tempdir().unwrap();
        let mut options = options(output.path());
        options.concurrency = 8;
        let ids = ids(&["55144522", "46986414", "55144522", "404"]);
        let rows = vec![Some(pot_of_greed()), Some(dark_magician()), Some(pot_of_greed()), None];
        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids, rows, &options).await.unwrap();
        // Rendered once, placed twice.
        assert_eq!(summary.created, vec!["55144522", "46986414"]);
        assert_eq!(renderer.calls.lock().unwrap().len(), 4);

        let mut images = HashMap::new();
        images.insert("55144522".to_string(), RgbImage::from_pixel(1, 1, Rgb([1, 0, 0])));
        images.insert("46986414".to_string(), RgbImage::from_pixel(1, 1, Rgb([2, 0, 0])));
        let ordered: Vec<Option<u8>> = deck_order(&ids, &images).iter()
            .map(|image| image.map(|image| image.get_pixel(0, 0)[0]))
            .collect();
        assert_eq!(ordered, vec![Some(1), Some(2), Some(1), None]);
    }

    #[tokio::test]
    async fn test_missing_card_keeps_slot() {
        let output = tempfile::tempdir().unwrap();
        let options = options(output.path());
        // Ten entries, the missing one still takes a slot so the tenth card opens a second page.
        let mut ids = vec!["404".to_string()];
        let mut rows = vec![None];
        for _ in 0..9 {
            ids.push("55144522".to_string());
            rows.push(Some(pot_of_greed()));
        }
        let renderer = OfflineRenderer::default();
        let summary = print_deck(&renderer, &ids, rows, &options).await.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.not_found(), 1);
    }

    #[tokio::test]
    async fn test_run() {
        let root = tempfile::tempdir().unwrap();
        let mold = mold();
        fs::create_dir_all(root.path().join("deck")).unwrap();
        fs::write(root.path().join("deck").join("test.ydk"), "#main\r\n46986414\r\n12345\r\n55144522\r\n").unwrap();
        create_database(&root.path().join("cards.cdb"), &[dark_magician(), pot_of_greed()]).await;

        let configuration = Configuration {
            deck_path: root.path().join("deck"),
            mold_path: mold.path().to_path_buf(),
            output_path: root.path().join("output"),
            cdb: root.path().join("cards.cdb"),
            image_base: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let summary = run(&configuration, "test", Some("zh-CN")).await.unwrap();
        assert_eq!(summary.created, vec!["46986414", "55144522"]);
        assert_eq!(summary.not_created.len(), 1);
        assert_eq!(summary.document, Some(root.path().join("output").join("test.zh-CN.pdf")));
        assert!(root.path().join("output").join("test").join("46986414.jpg").exists());
    }

    #[tokio::test]
    async fn test_run_missing_deck() {
        let root = tempfile::tempdir().unwrap();
        let configuration = Configuration { deck_path: root.path().to_path_buf(), ..Default::default() };
        let err = run(&configuration, "nothing", None).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io { .. })));
    }
}
