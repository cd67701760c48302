/// A time value, measured backwards from the present.
///
/// Ancestors are older than their descendants, so a parent
/// always has a larger time than its children.
#[repr(transparent)]
#[derive(Copy, Clone, Debug)]
pub struct Time(f64);

impl Time {
    /// Create a new Time.
    ///
    /// Returns `None` for negative or non-finite values.
    ///
    /// ```
    /// # use treeseq_core::Time;
    /// assert!(Time::new(0.0).is_some());
    /// assert!(Time::new(-1.0).is_none());
    /// assert!(Time::new(f64::NAN).is_none());
    /// ```
    pub fn new(time: f64) -> Option<Self> {
        if time.is_finite() && time >= 0.0 {
            Some(Self::from(time))
        } else {
            None
        }
    }

    /// Like [`Time::new`], but reports invalid input
    /// as [`crate::Error::TimeError`].
    pub fn try_new(time: f64) -> Result<Self, crate::Error> {
        Self::new(time).ok_or(crate::Error::TimeError(time))
    }

    /// `true` if the value is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// The underlying value.
    pub fn raw(self) -> f64 {
        self.0
    }
}

impl_f64_newtype_comparisons!(Time);

impl std::ops::Sub for Time {
    type Output = f64;
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new() {
        assert_eq!(Time::try_new(2.0), Ok(Time::from(2.0)));
        assert_eq!(Time::try_new(-2.0), Err(crate::Error::TimeError(-2.0)));
        assert!(Time::try_new(f64::NAN).is_err());
    }
}
