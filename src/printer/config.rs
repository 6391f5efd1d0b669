use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use super::compose::PageGeometry;

pub const CONFIGURATION_NAME: &str = "ydk-printer";

pub fn configuration_path() -> String {
    std::env::var("YDK_PRINTER_CONFIG_PATH").unwrap_or(".".to_string())
}

/// Find `<name>.toml`, `<name>.yaml` or `<name>.json` in `directory`.
/// Fall back to the default value of `T` if there is none.
pub fn load_configuration<T: serde::de::DeserializeOwned>(directory: &str, name: &str) -> anyhow::Result<T> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(_) => {
            warn!("Configuration directory {} is not readable. Use default configuration.", directory);
            return Ok(serde_json::from_str("{}")?);
        }
    };
    for entry in entries.flatten() {
        let path_name = entry.path();
        let path = Path::new(&path_name);
        let file_name = path.file_stem().unwrap_or_default();
        let extension = path.extension().unwrap_or_default().to_str().unwrap_or_default();
        if file_name != name { continue; }
        if let Ok(mut file) = fs::File::open(&path_name) {
            match extension {
                "toml" => {
                    let mut data = String::new();
                    file.read_to_string(&mut data)?;
                    return Ok(toml::from_str::<T>(&data)?);
                }
                "yaml" | "yml" => return Ok(serde_yaml::from_reader::<_, T>(file)?),
                "json" => return Ok(serde_json::from_reader::<_, T>(file)?),
                _ => {}
            };
        }
    }
    warn!("Can't find proper configuration file for {}. Try to get a default value.", name);
    Ok(serde_json::from_str("{}")?)
}

/// Card database and artwork source for one language.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct LocaleConfiguration {
    pub cdb: Option<PathBuf>,
    pub image_base: Option<String>
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Configuration {
    /// Where `<deck>.ydk` files are.
    pub deck_path: PathBuf,
    /// Card frames, icons and the `pic.jpg` placeholder.
    pub mold_path: PathBuf,
    pub output_path: PathBuf,
    pub cdb: PathBuf,
    /// Remote artwork is fetched from `<image_base>/<id>.jpg`.
    pub image_base: String,
    /// Cards rendered at the same time.
    pub concurrency: usize,
    /// Keep `<output_path>/<deck>/<id>.jpg` after the document is written.
    pub keep_images: bool,
    pub jpeg_quality: u8,
    pub dpi: u32,
    pub geometry: PageGeometry,
    pub locales: HashMap<String, LocaleConfiguration>
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            deck_path   : PathBuf::from("./resources/deck"),
            mold_path   : PathBuf::from("./resources/mold"),
            output_path : PathBuf::from("./output"),
            cdb         : PathBuf::from("./resources/cards.cdb"),
            image_base  : "https://gitee.com/ymssx/pics/raw/master/500".to_string(),
            concurrency : 4,
            keep_images : true,
            jpeg_quality: 90,
            dpi         : 300,
            geometry    : PageGeometry::default(),
            locales     : HashMap::new()
        }
    }
}

/// Sources picked for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub cdb: PathBuf,
    pub image_base: String
}

impl Configuration {
    pub fn localize(&self, locale: Option<&str>) -> Localized {
        let overrides = match locale {
            Some(locale) => match self.locales.get(locale) {
                Some(overrides) => overrides.clone(),
                None => {
                    warn!("Locale {} is not configured, use default card database.", locale);
                    LocaleConfiguration::default()
                }
            },
            None => LocaleConfiguration::default()
        };
        Localized {
            cdb: overrides.cdb.unwrap_or_else(|| self.cdb.clone()),
            image_base: overrides.image_base.unwrap_or_else(|| self.image_base.clone())
        }
    }
}

pub static CONFIGURATION: OnceCell<Configuration> = OnceCell::new();

pub fn init(directory: Option<&str>) -> anyhow::Result<()> {
    let directory = directory.map(|directory| directory.to_string()).unwrap_or_else(configuration_path);
    info!("Loading configuration from {}...", directory);
    let configuration = load_configuration::<Configuration>(&directory, CONFIGURATION_NAME)?;
    if configuration.concurrency == 0 {
        return Err(anyhow!("concurrency must be at least 1"));
    }
    CONFIGURATION.set(configuration).map_err(|_| anyhow!("Configuration already set."))?;
    Ok(())
}

#[inline]
pub fn get_configuration() -> &'static Configuration {
    CONFIGURATION.get().expect("ydk-printer configuration not set")
}
