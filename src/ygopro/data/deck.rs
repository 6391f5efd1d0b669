use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::error::map_io_error;

/// Card codes of a `.ydk` file, in file order.
///
/// Section headers (`#main`, `#extra`, `!side`) and comments are dropped along
/// with every other line that is not a bare number. Repeated cards are kept.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Deck {
    pub cards: Vec<String>
}

impl Deck {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Deck, Error> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(map_io_error(path))?;
        Self::from_reader(&mut file).map_err(map_io_error(path))
    }

    pub fn from_reader<T: Read>(reader: &mut T) -> std::io::Result<Deck> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        // Decks saved on windows may start with a BOM.
        let (text, _, _) = encoding_rs::UTF_8.decode(&buf);
        Ok(Self::from_string(&text))
    }

    pub fn from_string(str: &str) -> Deck {
        let cards = str.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| is_card_code(line))
            .map(|line| line.to_string())
            .collect();
        Deck { cards }
    }

    pub fn len(&self) -> usize { self.cards.len() }
    pub fn is_empty(&self) -> bool { self.cards.is_empty() }
}

fn is_card_code(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|byte| byte.is_ascii_digit())
}
