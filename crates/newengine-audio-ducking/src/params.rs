use crate::error::{DuckingError, DuckingResult};

/// Upper bound of the ramp duration accepted by the platform, in milliseconds.
pub const MAX_DUCKING_DURATION_MS: u32 = 3000;

/// Validated activation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckingParams {
    duration_ms: u32,
    ratio: f64,
}

impl DuckingParams {
    /// `duration_ms` must be in `[0, 3000]`; `ratio` must be strictly inside `(0.0, 1.0)`.
    pub fn new(duration_ms: u32, ratio: f64) -> DuckingResult<Self> {
        if duration_ms > MAX_DUCKING_DURATION_MS {
            return Err(DuckingError::OutOfRange {
                name: "duration",
                value: duration_ms.to_string(),
                message: "Valid range is 0 to 3000, inclusive",
            });
        }

        // Written as a positive test so NaN is rejected too.
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(DuckingError::OutOfRange {
                name: "ratio",
                value: ratio.to_string(),
                message: "Valid range is 0.0 to 1.0, exclusive",
            });
        }

        Ok(Self { duration_ms, ratio })
    }

    #[inline]
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}
