pub mod articles;
pub mod config;
pub mod datamuse;
pub mod decomposer;
pub mod error;
pub mod filter;
pub mod generator;
pub mod lexicon;
pub mod line;
pub mod poem;
pub mod relations;
pub mod render;
pub mod similarity;
pub mod validate;

// Re-export commonly used types
pub use config::PoetryConfig;
pub use datamuse::DatamuseClient;
pub use error::{PoetryError, Result};
pub use filter::{Dictionary, FrequencyTable, Spellchecker, WordFilter, WordFrequency};
pub use generator::{StochasticWordGenerator, WordStrategy};
pub use lexicon::StaticLexicon;
pub use line::compose_line;
pub use poem::{Poem, PoemAssembler};
pub use relations::{RelatedWordSource, Relation, WordAssociation};
pub use render::{PlainTextRenderer, PoemRenderer};
pub use similarity::{too_similar, too_similar_to_any};
