pub mod answers;
pub mod element;
pub mod field;
pub mod session;
pub mod template;
