pub mod convert;
pub mod regenerate;
pub mod template;
