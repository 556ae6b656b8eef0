//! Per-run binding context.

use axon_hal::Request;

/// The bindings of one execution: the request with its argument locations
/// and memory pools.
///
/// Validating the request against its model is the caller's responsibility
/// (see `axon-validate`); the builder only carries it through the run so
/// every step executor can read the same bindings.
#[derive(Debug)]
pub struct ExecutionBuilder {
    request: Request,
}

impl ExecutionBuilder {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }
}
