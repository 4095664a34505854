//! Record table implementations
//!
//! [`SeaOrmRecordTable`] is the durable table used in production;
//! [`MemoryRecordTable`] provides the same insert-only semantics in process.

pub mod image_record;
pub mod memory;
pub mod traits;

pub use image_record::SeaOrmRecordTable;
pub use memory::MemoryRecordTable;
pub use traits::RecordTable;
