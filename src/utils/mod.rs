//! Utility functions shared across pipeline stages

pub mod data_loader;
pub mod frame;

pub use data_loader::DataLoader;
pub use frame::{
    column_as_f64, columns_to_array2, is_numeric_dtype, is_text_dtype, most_frequent,
    numeric_column_names, require_column, require_numeric,
};
