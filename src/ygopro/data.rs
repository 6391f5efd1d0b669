mod deck;
mod card;

pub use deck::Deck;
pub use card::*;
