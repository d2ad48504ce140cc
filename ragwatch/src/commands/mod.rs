// ragwatch/src/commands/mod.rs

pub mod check;
pub mod domains;
pub mod eval;
pub mod summarize;
