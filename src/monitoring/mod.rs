/*!
 * Monitoring
 * Structured logging for the simulator
 */

mod tracer;

pub use tracer::{init_tracing, span_dispatch, span_task};
