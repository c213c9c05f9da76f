//! Single-consumer background job queue.
//!
//! ## Design
//!
//! - Producers hold a cloneable [`JobQueue`]; `put` never blocks
//! - One worker task runs jobs strictly in submission order, one at a time
//! - A failed (or panicking) job is logged and dropped; the worker carries on
//! - No persistence and no retry: delivery is at most once per enqueue, and
//!   jobs still queued when the process exits are lost
//!
//! ## Components
//!
//! - `Job`: anything the worker can run, with a kind used for logging
//! - `JobHandler`: executes one job
//! - `JobQueue`: producer handle
//! - `WorkerHandle`: shutdown + statistics for the running worker

pub mod queue;
pub mod worker;

pub use queue::{Job, JobHandler, JobQueue, JobQueueError};
pub use worker::{WorkerHandle, WorkerStats};
