//! Runner assembly from manifest QC declarations

use contracts::{DataContract, QcManifest, QcSuiteKind};
use tracing::debug;

use crate::error::{QcError, Result};
use crate::runner::Runner;
use crate::suites::{ContractSuite, HarpDeviceSuite, TableSuite};

/// Build a runner for the declared suites, in declaration order
///
/// Table declarations expand to one suite per stream of the target
/// collection.
///
/// # Errors
/// A target or commands path that does not resolve to a collection.
pub fn runner_for<'a>(contract: &'a DataContract, declarations: &[QcManifest]) -> Result<Runner<'a>> {
    let mut runner = Runner::new();
    for decl in declarations {
        match decl.suite {
            QcSuiteKind::HarpDevice => {
                let target = required_target(decl)?;
                let mut suite = HarpDeviceSuite::new(contract.collection(target)?)
                    .named(format!("harp_device:{target}"));
                if let Some(commands) = &decl.commands {
                    suite = suite.with_commands(contract.collection(commands)?);
                }
                if let Some(who_am_i) = decl.expected_who_am_i {
                    suite = suite.expect_who_am_i(who_am_i);
                }
                runner.push(suite);
            }
            QcSuiteKind::Table => {
                let target = required_target(decl)?;
                for stream in contract.collection(target)? {
                    let suite = TableSuite::new(stream)
                        .named(format!("table:{target}/{}", stream.name()))
                        .expect_columns(decl.expected_columns.iter().cloned());
                    runner.push(suite);
                }
            }
            QcSuiteKind::Contract => runner.push(ContractSuite::new(contract)),
        }
    }
    debug!(suites = runner.len(), "qc runner assembled");
    Ok(runner)
}

fn required_target(decl: &QcManifest) -> Result<&str> {
    decl.target
        .as_deref()
        .ok_or_else(|| QcError::check(format!("{:?} suite requires a target", decl.suite)))
}
