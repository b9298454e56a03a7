// Reports module - CSV/JSON writers and per-entity tax profiles

pub mod entities;
pub mod export;

pub use entities::{profile_entities, EntityProfile, TaxedOperation};

pub use export::{
    write_csv, write_drawback_summary_csv, write_json, write_links_csv, write_operations_csv,
    OutputPaths,
};
