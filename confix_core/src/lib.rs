//! `confix_core` is the engine behind the [confix](https://github.com/confix-rs/confix) command line tool. It reads a JSON, YAML, XML or Java properties file, resolves the `${NAME|filter|filter(key=value)}` expressions found in its keys and values, and writes the document back with the results substituted.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Config file
//!   → Format handler (parses the document, hands out one entry per key / value / attribute)
//!   → Lexer (finds `${…}` spans, tokenizes each body)
//!   → Parser (source variable + filter calls with their parameters)
//!   → Engine (environment lookup → file dereference → filters, splices results back)
//!   → Format handler (writes edited entries back and serializes the document)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `confix.toml`: default log level and extra file extensions.
//! - [`formats`]: Handlers for JSON, YAML, XML and properties documents.
//! - [`tree`]: Reversible flattening of nested JSON / YAML trees into entries.
//!
//! ## Key Types
//!
//! - [`TemplateEngine`]: Renders strings containing template expressions.
//! - [`FilterRegistry`]: Name → filter table, seeded with the built-in filters and extended by plugins.
//! - [`ConfigEntry`]: One templatable key, value or attribute of a document.
//! - [`FileProcessor`]: Runs a single file through read → template → write.
//! - [`Scalar`]: Typed value flowing through filter chains.
//!
//! ## Template Syntax
//!
//! ```text
//! ${DB_PASSWORD}
//! ${DB_PASSWORD|bcrypt}
//! ${REPLICAS|to_int|multiply(m=2)}
//! jdbc:postgresql://${DB_HOST}:${DB_PORT}/app
//! ```
//!
//! Unset variables resolve to an empty string. A variable whose value starts
//! with `@` followed by an existing path is replaced by the contents of that
//! file. Unknown filters leave the value untouched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confix_core::FileProcessor;
//! use confix_core::TemplateEngine;
//!
//! let engine = TemplateEngine::default();
//! let processor = FileProcessor::new("config/app.yaml", None).unwrap();
//! let rendered = processor.render(&engine).unwrap();
//! print!("{}", String::from_utf8_lossy(&rendered));
//! ```

pub use config::*;
pub use engine::*;
pub use entry::*;
pub use error::*;
pub use filter::*;
pub use formats::ConfigFileHandler;
pub use formats::FileType;
pub use formats::handler_for;
pub use parser::*;
pub use processor::*;
pub use scalar::*;

pub mod config;
mod engine;
mod entry;
#[allow(unused_assignments)]
mod error;
mod filter;
pub mod formats;
pub(crate) mod lexer;
mod parser;
mod processor;
mod scalar;
pub(crate) mod tokens;
pub mod tree;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
