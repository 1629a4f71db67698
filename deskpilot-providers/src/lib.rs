pub mod anthropic;
pub mod parse;
