//! Chat stream domain.
//!
//! The backend answers each user message with a stream of [`event::ChatEvent`]s.
//! [`interpreter::ExchangeInterpreter`] applies them, in arrival order, to the
//! open assistant message and to the [`status::StreamingStatus`] signal.

pub mod event;
pub mod interpreter;
pub mod status;
