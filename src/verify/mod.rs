//! The verification pipeline.
//!
//! One job walks the plugin's classes sequentially; for each class it runs
//! the structural verifiers, the override verifier per method, and the
//! instruction verifiers per retained instruction. Problems accumulate in
//! the job's [`VerificationContext`]; a failure analyzing one instruction
//! never aborts the class, and cancellation is honored between classes.

pub mod access;
pub mod context;
pub mod fields;
pub mod hierarchy;
pub mod instructions;
pub mod methods;
pub mod overrides;
pub mod structure;

pub use context::VerificationContext;

use tracing::debug;

use crate::classfile::ClassNode;
use crate::common::{CancellationToken, Error, Result};
use crate::problems::Location;

/// Verify every class in `classes_to_check`, in the given order.
///
/// The caller sorts the class set so two runs over the same inputs emit
/// identical problem sequences.
pub fn verify_classes(
    ctx: &mut VerificationContext<'_>,
    classes_to_check: &[String],
    cancel: &CancellationToken,
) -> Result<()> {
    for class_name in classes_to_check {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let location = Location::class(class_name.clone());
        let Some(node) = ctx.resolve_or_report(class_name, &location) else {
            continue;
        };
        debug!(class = %class_name, "verifying class");
        verify_class(ctx, &node);
    }
    Ok(())
}

fn verify_class(ctx: &mut VerificationContext<'_>, node: &ClassNode) {
    structure::verify_class_structure(ctx, node);
    for field in &node.fields {
        structure::verify_field_type(ctx, node, field);
    }
    for method in &node.methods {
        structure::verify_method_descriptor_types(ctx, node, method);
        overrides::verify_method_overrides(ctx, node, method);
        for instruction in &method.instructions {
            instructions::verify_instruction(ctx, node, method, instruction);
        }
    }
}
