//! SeaORM entities

pub mod prelude;

pub mod image_records;
