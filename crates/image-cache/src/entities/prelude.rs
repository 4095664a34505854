pub use super::image_records::Entity as ImageRecords;
