pub mod connection;
pub mod trail;
pub mod wrappers;

/// The [`StateMachine`] trait gives the tracker's pure logic a uniform calling convention: feed
/// it input, then drain whatever output the input produced.
///
/// # Functionality
/// Each machine accepts a closed set of inputs and emits a closed set of outputs, usually
/// expressed as enums (see [`ConnectionEvent`](connection::ConnectionEvent)). The machine's own
/// inherent methods hold the logic for each variant; the trait impl is only the dispatch table
/// mapping the grouped [`Input`](StateMachine::Input) onto those methods and the polling methods
/// back onto [`Output`](StateMachine::Output).
///
/// Output is pulled rather than returned so the caller decides when side effects (logging,
/// publishing a new view) happen. Several inputs may be processed before a single drain.
///
/// # Invariants
/// Implementors must be deterministic: the same sequence of inputs always yields the same state
/// and the same outputs. Concretely:
///
/// ## No Interior Mutability
/// All mutation goes through `&mut self`. No [`std::cell`] types, no locks, no reference counted
/// pointers (their counts are shared state too). `&'static` references to immutable data are
/// fine.
///
/// ## No IO
/// No [`std::io`], [`std::net`] or anything that reaches outside the process.
///
/// ### No System Time
/// Reading [`std::time::Instant::now`] or [`std::time::SystemTime`] inside a machine makes two
/// otherwise identical runs diverge. Time must arrive as part of the input, which is why
/// [`ConnectionEvent::Timeout`](connection::ConnectionEvent::Timeout) carries `now` instead of
/// the machine looking at a clock.
///
/// ### No System RNG
/// Same reasoning; randomness must be seeded through input.
///
/// ## No Concurrency, No Async
/// Machines never spawn tasks or threads and never `.await`. The surrounding runtime owns all
/// scheduling.
///
/// ## No Blocking
/// Processing an input must finish in bounded time so machines can be driven from inside async
/// tasks without stalling the executor.
///
/// # Side Effects
/// Logging through `tracing` is allowed as long as the machine's logic never depends on it.
///
/// # Injecting Time
/// The caller (here the [tracker runtime](crate::tracker)) reads the clock through a
/// [`SystemResource`](wrappers::input::system::SystemResource) and hands the value in with the
/// input. This keeps the machine replayable in tests with fixed timestamps.
///
/// # Example
/// ```ignore
/// let mut machine = ConnectionMachine::new();
///
/// machine.process_input(ConnectionEvent::Connect);
/// machine.process_input(ConnectionEvent::Open { now: 1_000 });
///
/// while let Some(ConnectionOutput::StatusChanged { from, to }) = machine.poll_output() {
///     println!("{from:?} -> {to:?}");
/// }
/// ```
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the first available output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;
}
