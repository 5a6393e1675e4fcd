use crate::domain::errors::DomainResult;

/// Schedules one asynchronous run of the apply job.
///
/// Fire-and-forget: returns as soon as the request is queued.
pub trait ApplyJobDispatcher: Send + Sync {
    fn dispatch(&self) -> DomainResult<()>;
}
