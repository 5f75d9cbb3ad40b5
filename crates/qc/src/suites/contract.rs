//! ContractSuite - load status of every stream in a contract

use contracts::{DataContract, LoadState};
use serde_json::json;

use crate::check::Check;
use crate::error::Result;
use crate::suite::{QcTest, Suite};

pub struct ContractSuite<'a> {
    name: String,
    contract: &'a DataContract,
}

impl<'a> ContractSuite<'a> {
    pub fn new(contract: &'a DataContract) -> Self {
        Self {
            name: format!("contract:{}", contract.name()),
            contract,
        }
    }

    fn test_has_streams(&self) -> Result<Vec<Check>> {
        let count = self.contract.walk_streams().len();
        let check = if count == 0 {
            Check::warn("Contract declares no streams")
        } else {
            Check::pass().with_value(count)
        };
        Ok(vec![check])
    }

    fn test_all_streams_loaded(&self) -> Result<Vec<Check>> {
        let not_loaded: Vec<_> = self
            .contract
            .walk_streams()
            .into_iter()
            .filter(|(_, s)| s.state() != LoadState::Loaded)
            .map(|(path, s)| {
                json!({
                    "stream": path,
                    "state": s.state(),
                    "error": s.last_error(),
                })
            })
            .collect();

        let check = if not_loaded.is_empty() {
            Check::pass().with_message("All streams loaded")
        } else {
            Check::fail(format!("{} stream(s) not loaded", not_loaded.len()))
                .with_context(json!({ "streams": not_loaded }))
        };
        Ok(vec![check])
    }
}

impl Suite for ContractSuite<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tests(&self) -> Vec<QcTest<Self>> {
        vec![
            QcTest::new(
                "has_streams",
                "Contract declares at least one stream",
                Self::test_has_streams,
            ),
            QcTest::new(
                "all_streams_loaded",
                "Every stream in the contract is loaded",
                Self::test_all_streams_loaded,
            ),
        ]
    }
}
