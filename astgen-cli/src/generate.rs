//! One generation run driven by a loaded configuration.

use astgen::{EmitMode, Generator, SchemaDecl, WriteResult};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Load the configured schema, generate, and emit into `output_dir`.
pub fn run(config: &Config, output_dir: &Path, mode: EmitMode) -> CliResult<Vec<WriteResult>> {
    let decl = SchemaDecl::from_path(&config.schema.path)?;
    info!(
        schema = %config.schema.path.display(),
        dialect = %config.output.dialect,
        "Generating"
    );

    let generator = Generator::new(config.generate_options());
    Ok(generator.run(&decl, output_dir, mode)?)
}

/// Fail when a check run found anything stale or missing.
pub fn ensure_up_to_date(results: &[WriteResult]) -> CliResult<()> {
    let count = results.iter().filter(|r| r.is_out_of_date()).count();
    if count == 0 {
        Ok(())
    } else {
        Err(CliError::OutOfDate { count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ensure_up_to_date() {
        let fresh = WriteResult::UpToDate {
            path: PathBuf::from("Expr.h"),
        };
        let stale = WriteResult::Stale {
            path: PathBuf::from("Stmt.h"),
        };

        assert!(ensure_up_to_date(&[fresh.clone()]).is_ok());
        let err = ensure_up_to_date(&[fresh, stale]).unwrap_err();
        assert!(matches!(err, CliError::OutOfDate { count: 1 }));
    }
}
