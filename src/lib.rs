//! deckimport - Import pipeline for flashcard decks
//!
//! This crate turns an uploaded file into a list of cards. A JSON array of objects
//! is read as-is; an Excel workbook (XLSX) is decoded directly from its ZIP/XML parts
//! and the first worksheet is projected onto the header row. Uploads arriving as
//! `multipart/form-data` request bodies are decoded without an external MIME library.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deckimport::ImporterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create an importer with default settings
//!     let importer = ImporterBuilder::new().build()?;
//!
//!     // Read the uploaded workbook
//!     let bytes = std::fs::read("verbs.xlsx")?;
//!
//!     // Each data row becomes one card keyed by the header row
//!     let cards = importer.import_file("verbs.xlsx", &bytes)?;
//!     println!("{}", serde_json::to_string_pretty(&cards)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Importing a Form Upload
//!
//! ```rust,no_run
//! use deckimport::ImporterBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let importer = ImporterBuilder::new().build()?;
//! let body: Vec<u8> = vec![]; // Raw request body
//! let content_type = "multipart/form-data; boundary=----formBoundary";
//!
//! let deck = importer.import_upload(&body, content_type)?;
//! println!("{} ({} cards)", deck.name, deck.cards.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use deckimport::ImporterBuilder;
//!
//! # fn main() -> Result<(), deckimport::ImportError> {
//! let importer = ImporterBuilder::new()
//!     .with_column_label("Columna") // Synthesized headers become "Columna 1", ...
//!     .with_max_entry_size(16 * 1024 * 1024)
//!     .with_max_decompressed_size(64 * 1024 * 1024)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every failure is an [`ImportError`]. Use [`ImportError::code`] for a stable,
//! machine-readable [`ErrorCode`]; the `Display` text is meant for end users.

mod api;
mod builder;
mod cards;
mod dispatch;
mod error;
mod json;
mod multipart;
mod parser;
mod security;
mod types;
mod upload;

// 公開API
pub use api::FileFormat;
pub use builder::{Importer, ImporterBuilder};
pub use cards::Card;
pub use error::{ErrorCode, ImportError};
pub use multipart::{FileField, Form, MultipartField, TextField};
pub use types::RawRecord;
pub use upload::{DeckUpload, ImportedDeck};
