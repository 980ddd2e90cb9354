//! User-visible reporting (spec.md §7): for each validation or drift error,
//! print the field path, level, message and suggestion; end with a summary
//! line. Kept separate from [`crate::pipeline`] so the driver stays testable
//! without capturing stdout.

use crate::pipeline::{PipelineError, PipelineOutcome};
use labscaffold_definitions::ValidationError;

pub fn report_success(outcome: &PipelineOutcome) {
    for warning in &outcome.warnings {
        println!("warning: {}: {} (suggestion: {})", warning.field_path, warning.message, warning.suggestion);
    }

    if outcome.dry_run {
        println!("dry-run: {} file(s) would be written to {}", outcome.fileset.len(), outcome.output_dir.display());
        for entry in outcome.fileset.sorted_by_path() {
            println!("  {}", entry.relative_path.display());
        }
        return;
    }

    println!("generated {} file(s) in {}", outcome.fileset.len(), outcome.output_dir.display());
    if let Some(manifest) = &outcome.manifest {
        println!("manifest: {} component(s), generator {}", manifest.generated.components.len(), manifest.generated.generator_version);
    }
}

pub fn report_error(err: &PipelineError) {
    match err {
        PipelineError::Validation(errors) => {
            print_validation_errors(errors);
            eprintln!("validation failed with {} error(s)", errors.len());
        }
        PipelineError::Drift(paths) => {
            eprintln!("drift detected in {} regeneratable file(s):", paths.len());
            for path in paths {
                eprintln!("  {}", path.display());
            }
            eprintln!("re-run with --force to overwrite");
        }
        PipelineError::Io(message) => eprintln!("I/O failure: {message}"),
        PipelineError::Internal(message) => eprintln!("internal error: {message}"),
    }
}

fn print_validation_errors(errors: &[ValidationError]) {
    for error in errors {
        eprintln!(
            "[{}] {}: {} (suggestion: {})",
            error.level, error.field_path, error.message, error.suggestion
        );
    }
}
