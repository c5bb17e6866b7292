//! Validation modules

pub mod file;

pub use file::{
    check_file, content_type_for_extension, validate_file, FileConstraints, FileDescriptor,
    FileMeta, ValidationError, ValidationResult,
};
