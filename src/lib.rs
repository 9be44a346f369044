pub mod ast;
pub mod config;
pub mod error;
pub mod executor;
pub mod integration;
pub mod parser;
pub mod repl;
pub mod storage;
pub mod tokenizer;

pub use ast::*;
pub use config::*;
pub use error::*;
pub use executor::*;
pub use integration::*;
pub use parser::*;
pub use repl::*;
pub use storage::*;
pub use tokenizer::*;
