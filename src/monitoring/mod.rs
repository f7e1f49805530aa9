/*!
 * Monitoring
 * Diagnostic logging for enforcer construction and denials
 */

pub mod tracer;

pub use tracer::{init_tracing, BuildSpan, SLOW_BUILD};
