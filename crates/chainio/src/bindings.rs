use alloy::sol;
use avs_primitives::Task;

sol! {
    /// Task layout as stored by the service manager contract.
    #[derive(Debug, PartialEq, Eq)]
    struct ContractTask {
        uint16 provingSystemId;
        bytes proof;
        bytes pubInput;
        bytes verificationKey;
        uint32 taskCreatedBlock;
    }

    #[derive(Debug, PartialEq, Eq)]
    event NewTaskCreated(uint32 indexed taskIndex, ContractTask task);
}

impl From<NewTaskCreated> for Task {
    fn from(event: NewTaskCreated) -> Self {
        let NewTaskCreated { taskIndex, task } = event;
        Task {
            index: taskIndex,
            proving_system_id: task.provingSystemId,
            proof: task.proof,
            public_input: task.pubInput,
            verification_key: task.verificationKey,
            created_at_block: task.taskCreatedBlock,
        }
    }
}
