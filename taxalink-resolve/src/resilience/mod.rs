pub mod retry;

pub use retry::{with_retry_async, RetryPolicy, RetryPolicyBuilder};
