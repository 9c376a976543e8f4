pub mod inspect;
pub mod translate;
