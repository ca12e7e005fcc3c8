//! Wrappers that let a runner hand system resources (currently the wall clock) to
//! [`StateMachine`](super::StateMachine)s as ordinary input.

pub mod input;
