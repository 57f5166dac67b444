//! Retrieval-augmented prompting: corpora, chunking, and the prompt
//! rewriter that ties them to a backend.

pub mod augmenter;
pub mod corpus;
pub mod splitter;

pub use augmenter::RetrievalAugmenter;
pub use corpus::{Corpus, DocumentCollection, EncyclopediaCorpus};
pub use splitter::TextSplitter;
