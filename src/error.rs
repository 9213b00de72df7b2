use thiserror::Error;

/// Errors raised by grid construction and coordinate queries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height was zero or negative
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    /// Coordinate outside `[0, width) x [0, height)`
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },
}

/// Errors raised by the priority queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `extract_min` or `peek` on an empty queue. Callers are expected to check `is_empty` first.
    #[error("priority queue is empty")]
    EmptyQueue,
}
