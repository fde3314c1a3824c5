pub mod csv_records;
pub mod document;
pub mod error;
pub mod resolver;
pub mod terms;

pub use csv_records::{read_csv_records, read_csv_records_from};
pub use document::{
    DocumentFormat, load_document, parse_document, to_string_pretty, write_document, yaml_to_node,
};
pub use error::{IngestError, Result};
pub use resolver::{DirectorySchemaResolver, EXTENDS_KEY};
pub use terms::JsonTermRegistry;
