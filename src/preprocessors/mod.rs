pub mod field_bag;

pub use field_bag::FieldBag;
