//! Enforcement of the host's threading contract.

use std::thread::{self, ThreadId};

use hostbridge_core::ConcurrencyViolation;

use crate::host::ThreadingContract;

#[derive(Debug, Clone)]
pub(crate) struct ThreadGuard {
    owner: ThreadId,
    contract: ThreadingContract,
}

impl ThreadGuard {
    /// Guard owned by the calling thread.
    pub fn new(contract: ThreadingContract) -> Self {
        Self {
            owner: thread::current().id(),
            contract,
        }
    }

    pub fn check(&self, operation: &str) -> Result<(), ConcurrencyViolation> {
        if self.contract == ThreadingContract::Reentrant {
            return Ok(());
        }
        let current = thread::current();
        if current.id() == self.owner {
            return Ok(());
        }
        Err(ConcurrencyViolation {
            operation: operation.to_string(),
            owner: format!("{:?}", self.owner),
            caller: match current.name() {
                Some(name) => format!("{:?} ({name})", current.id()),
                None => format!("{:?}", current.id()),
            },
        })
    }
}
