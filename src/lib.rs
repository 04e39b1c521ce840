//! Turin JVM backend (turinc)
//!
//! Lowers resolved Turin compilation units to Java class files.
//!
//! ## Architecture
//!
//! - **ast**: the tree handed to the backend (types, properties, programs)
//! - **resolver**: read-only symbol resolution the backend consults
//! - **codegen**: class-file structures, instruction sequences and emission
//! - **driver**: writing artifacts to a destination directory
//! - **common**: error and configuration types
//!
//! ## Compilation Flow
//!
//! ```text
//! TurinFile -> units (types, programs) -> ClassEmitter -> ClassFileDefinition -> .class files
//!                        |
//!                    Resolver (types, constraints, call targets)
//! ```

pub mod ast;
pub mod codegen;
pub mod common;
pub mod driver;
pub mod resolver;

pub use codegen::{ClassFileDefinition, Compilation};
pub use common::{Config, Error, Result};
pub use resolver::{InFileResolver, Resolver};

/// Compile every type and program of `file`, in declaration order
pub fn compile(file: &ast::TurinFile, resolver: &dyn Resolver, config: &Config) -> Result<Vec<ClassFileDefinition>> {
    Compilation::new(resolver, config.clone())?.compile(file)
}

/// Compile `file` and write its class files under `config.destination_dir`
pub fn compile_to_dir(
    file: &ast::TurinFile,
    resolver: &dyn Resolver,
    config: &Config,
) -> Result<Vec<std::path::PathBuf>> {
    let artifacts = compile(file, resolver, config)?;
    driver::write_artifacts(config, &artifacts)
}
