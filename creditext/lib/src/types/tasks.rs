use codec::{Decode, Encode};

use super::{CollectedCoins, Transfer};
use crate::ids::{CollectedCoinsId, TransferId};

/// Work item the off-chain authority picks up after a registration.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub enum TaskId {
    VerifyTransfer(TransferId),
    CollectCoins(CollectedCoinsId),
}

impl From<TransferId> for TaskId {
    fn from(id: TransferId) -> Self {
        TaskId::VerifyTransfer(id)
    }
}

impl From<CollectedCoinsId> for TaskId {
    fn from(id: CollectedCoinsId) -> Self {
        TaskId::CollectCoins(id)
    }
}

/// Result the authority persists when a task verifies successfully.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub enum TaskOutput {
    VerifyTransfer(TransferId, Transfer),
    CollectCoins(CollectedCoinsId, CollectedCoins),
}

impl TaskOutput {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskOutput::VerifyTransfer(id, _) => TaskId::VerifyTransfer(*id),
            TaskOutput::CollectCoins(id, _) => TaskId::CollectCoins(*id),
        }
    }
}

/// Why the authority rejected a task.
///
/// Variant order is the runtime's, the SCALE index is significant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum VerificationFailureCause {
    TaskNonexistent,
    TaskFailed,
    TaskPending,
    TaskUnconfirmed,
    TaskInFuture,
    IncorrectContract,
    MissingReceiver,
    MissingSender,
    AbiMismatch,
    IncorrectInputLength,
    EmptyInput,
    IncorrectInputType,
    IncorrectAmount,
    IncorrectNonce,
    IncorrectReceiver,
    IncorrectSender,
    InvalidAddress,
    UnsupportedMethod,
    TransactionNotFound,
}

impl VerificationFailureCause {
    /// Non-fatal causes are retried by the authority on a later block.
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            VerificationFailureCause::TaskPending | VerificationFailureCause::TaskUnconfirmed
        )
    }
}

impl std::fmt::Display for VerificationFailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(VerificationFailureCause::TaskNonexistent, 0)]
    #[case(VerificationFailureCause::IncorrectAmount, 12)]
    #[case(VerificationFailureCause::TransactionNotFound, 18)]
    fn cause_scale_index(#[case] cause: VerificationFailureCause, #[case] index: u8) {
        assert_eq!(cause.encode(), vec![index]);
        assert_eq!(VerificationFailureCause::decode(&mut &[index][..]).unwrap(), cause);
    }

    #[test]
    fn only_pending_and_unconfirmed_are_retried() {
        assert!(!VerificationFailureCause::TaskPending.is_fatal());
        assert!(!VerificationFailureCause::TaskUnconfirmed.is_fatal());
        assert!(VerificationFailureCause::IncorrectAmount.is_fatal());
        assert!(VerificationFailureCause::TaskFailed.is_fatal());
    }

    #[test]
    fn task_output_knows_its_task() {
        let id = CollectedCoinsId::default();
        let output = TaskOutput::CollectCoins(
            id,
            CollectedCoins {
                to: Default::default(),
                amount: 1,
                tx_id: vec![1, 2, 3],
                contract_type: crate::types::ContractType::GCRE,
            },
        );
        assert_eq!(output.task_id(), TaskId::from(id));
    }
}
