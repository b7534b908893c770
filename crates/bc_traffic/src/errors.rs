use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("vehicle tile ring slot out of range: ({i}, {j})")]
    OutOfRing { i: u32, j: u32 },
    #[error("no free GPU car slot left in the shared car data array")]
    NoFreeCarSlot,
    #[error(transparent)]
    Allocation(#[from] bc_gpu::AllocError),
}

pub type Result<T> = std::result::Result<T, TrafficError>;
