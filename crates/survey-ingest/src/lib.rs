pub mod csv_table;
pub mod error;
pub mod metadata;

pub use csv_table::{CsvTable, parse_csv_table, read_csv_table};
pub use error::{IngestError, Result};
pub use metadata::{
    MetadataOptions, RawAnswer, RawCollection, RawQuestion, build_collection,
    parse_metadata_document, read_metadata_file,
};
