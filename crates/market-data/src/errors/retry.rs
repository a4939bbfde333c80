/// Classification for retry policy.
///
/// Used by the upstream client to decide whether a failed attempt is worth
/// repeating.
///
/// # Behavior Summary
///
/// | Class | Retry same request? |
/// |-------|---------------------|
/// | `WithBackoff` | Yes, after a linearly growing delay |
/// | `Never` | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the failure is terminal or the data itself is bad.
    Never,

    /// Transient transport failure (timeout, connection, status, empty body).
    ///
    /// The attempt is repeated after `retry_delay * attempt` until the
    /// retry budget is spent.
    WithBackoff,
}
